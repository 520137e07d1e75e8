use std::collections::HashSet;

use log::{debug, info};
use rayon::prelude::*;

use super::block_average::{BlockAverager, BlockSpec, Rounding};
use super::grid::GridOverlay;
use super::Pixelizer;
use crate::error::{MosaicError, Result};
use crate::raster::RasterBuffer;

/// Block sizes generated by default, largest first.
pub const DEFAULT_TILE_SIZES: [u32; 5] = [128, 64, 32, 16, 8];

/// One mosaic variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub label: String,
    pub block: BlockSpec,
    pub buffer: RasterBuffer,
}

/// Mosaic variants of one source, in the order they were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSet {
    tiles: Vec<Tile>,
}

impl TileSet {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&RasterBuffer> {
        self.tiles.iter().find(|t| t.label == label).map(|t| &t.buffer)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tiles.iter().map(|t| t.label.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }
}

impl IntoIterator for TileSet {
    type Item = Tile;
    type IntoIter = std::vec::IntoIter<Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.into_iter()
    }
}

impl<'a> IntoIterator for &'a TileSet {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

/// Builds a family of mosaics from one cover-resized source.
///
/// Every tile starts from its own copy of the source, never from another
/// tile's output.
#[derive(Debug, Clone, Copy)]
pub struct TileSetGenerator {
    rounding: Rounding,
    grid: Option<[u8; 4]>,
    parallel: bool,
}

impl Default for TileSetGenerator {
    fn default() -> Self {
        Self {
            rounding: Rounding::default(),
            grid: None,
            parallel: true,
        }
    }
}

impl TileSetGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Draws a grid of `color` over every tile.
    pub fn with_grid(mut self, color: [u8; 4]) -> Self {
        self.grid = Some(color);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Square block specs for `sizes`, failing on the first zero.
    pub fn square_specs(sizes: &[u32]) -> Result<Vec<BlockSpec>> {
        sizes.iter().map(|&size| BlockSpec::square(size)).collect()
    }

    pub fn generate(&self, source: &RasterBuffer, blocks: &[BlockSpec]) -> Result<TileSet> {
        let mut seen = HashSet::new();
        for block in blocks {
            let label = block.label();
            if !seen.insert(label.clone()) {
                return Err(MosaicError::DuplicateTile(label));
            }
        }

        let tiles: Result<Vec<Tile>> = if self.parallel {
            blocks.par_iter().map(|block| self.render(source, *block)).collect()
        } else {
            blocks.iter().map(|block| self.render(source, *block)).collect()
        };
        let tiles = tiles?;

        info!(
            "generated {} tiles from {}x{} source",
            tiles.len(),
            source.width(),
            source.height()
        );
        Ok(TileSet { tiles })
    }

    fn render(&self, source: &RasterBuffer, block: BlockSpec) -> Result<Tile> {
        let mut buffer = source.clone();
        BlockAverager::new(block)
            .with_rounding(self.rounding)
            .pixelize(&mut buffer)?;
        if let Some(color) = self.grid {
            GridOverlay::new(block).with_color(color).pixelize(&mut buffer)?;
        }
        debug!("tile {} done", block.label());
        Ok(Tile {
            label: block.label(),
            block,
            buffer,
        })
    }
}
