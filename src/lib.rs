pub mod codec;
pub mod config;
pub mod error;
mod pipeline;
pub mod pixelizer;
mod raster;
pub mod transport;

pub use config::{load_config, MosaicConfig};
pub use error::{MosaicError, Result};
pub use pipeline::MosaicPipeline;
pub use pixelizer::block_average::{pixelate, BlockAverager, BlockSpec, Rounding};
pub use pixelizer::grid::{GridOverlay, GRID_BLACK};
pub use pixelizer::tiles::{Tile, TileSet, TileSetGenerator, DEFAULT_TILE_SIZES};
pub use pixelizer::{
    cover_geometry, cover_resize, CoverGeometry, CoverResizer, CropMethod, Pixelizer,
    ResampleFilter,
};
pub use raster::{RasterBuffer, Rect};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mosaic_from_png_bytes() {
        let img = RasterBuffer::new(30, 20, [10, 20, 30, 255]).unwrap();
        let bytes = codec::encode_png(&img).unwrap();
        let source = codec::decode(&bytes).unwrap();
        let resizer = CoverResizer::new(20, 20).unwrap();
        let pipeline = MosaicPipeline::new(resizer, BlockSpec::square(5).unwrap()).with_grid(None);
        let out = pipeline.render(&source).unwrap();
        assert_eq!(out.dimensions(), (20, 20));
        assert!(out.pixels().all(|p| p == [10, 20, 30, 255]));
    }
}
