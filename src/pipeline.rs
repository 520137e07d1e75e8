use log::info;

use crate::config::MosaicConfig;
use crate::error::Result;
use crate::pixelizer::block_average::{BlockAverager, BlockSpec, Rounding};
use crate::pixelizer::grid::{GridOverlay, GRID_BLACK};
use crate::pixelizer::tiles::{TileSet, TileSetGenerator};
use crate::pixelizer::{CoverResizer, Pixelizer};
use crate::raster::RasterBuffer;

/// Cover-fit, block averaging and an optional grid, in that order.
#[derive(Debug, Clone, Copy)]
pub struct MosaicPipeline {
    resizer: CoverResizer,
    block: BlockSpec,
    rounding: Rounding,
    grid: Option<[u8; 4]>,
    parallel: bool,
}

impl MosaicPipeline {
    pub fn new(resizer: CoverResizer, block: BlockSpec) -> Self {
        Self {
            resizer,
            block,
            rounding: Rounding::default(),
            grid: Some(GRID_BLACK),
            parallel: true,
        }
    }

    pub fn from_config(config: &MosaicConfig) -> Result<Self> {
        config.validate()?;
        let resizer = CoverResizer::new(config.cover_width, config.cover_height)?
            .with_crop(config.crop)
            .with_filter(config.filter);
        Ok(Self {
            resizer,
            block: config.block_spec()?,
            rounding: config.rounding,
            grid: config.grid.then_some(config.grid_color),
            parallel: config.parallel,
        })
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_grid(mut self, grid: Option<[u8; 4]>) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// One mosaic at the pipeline's block size.
    pub fn render(&self, source: &RasterBuffer) -> Result<RasterBuffer> {
        let mut canvas = self.resizer.resize(source)?;
        BlockAverager::new(self.block)
            .with_rounding(self.rounding)
            .pixelize(&mut canvas)?;
        if let Some(color) = self.grid {
            GridOverlay::new(self.block).with_color(color).pixelize(&mut canvas)?;
        }
        info!(
            "rendered {}x{} mosaic with {} blocks",
            canvas.width(),
            canvas.height(),
            self.block.label()
        );
        Ok(canvas)
    }

    /// One mosaic per entry of `blocks`, all from the same cover-fit canvas.
    pub fn render_tiles(&self, source: &RasterBuffer, blocks: &[BlockSpec]) -> Result<TileSet> {
        let canvas = self.resizer.resize(source)?;
        let mut generator = TileSetGenerator::new()
            .with_rounding(self.rounding)
            .with_parallel(self.parallel);
        if let Some(color) = self.grid {
            generator = generator.with_grid(color);
        }
        generator.generate(&canvas, blocks)
    }
}
