use log::debug;

use super::block_average::BlockSpec;
use super::Pixelizer;
use crate::error::Result;
use crate::raster::RasterBuffer;

pub const GRID_BLACK: [u8; 4] = [0, 0, 0, 255];

/// Draws one-pixel lines along block boundaries and the image border.
#[derive(Debug, Clone, Copy)]
pub struct GridOverlay {
    block: BlockSpec,
    color: [u8; 4],
}

impl GridOverlay {
    pub fn new(block: BlockSpec) -> Self {
        Self {
            block,
            color: GRID_BLACK,
        }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn color(&self) -> [u8; 4] {
        self.color
    }

    /// Whether `(x, y)` lies on a line of the grid.
    fn is_line(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        x % self.block.width() == 0
            || y % self.block.height() == 0
            || x + 1 == width
            || y + 1 == height
    }
}

impl Pixelizer for GridOverlay {
    fn pixelize(&self, img: &mut RasterBuffer) -> Result<()> {
        let (width, height) = img.dimensions();
        debug!(
            "grid over {}x{} every {}x{}",
            width,
            height,
            self.block.width(),
            self.block.height()
        );
        for y in 0..height {
            for x in 0..width {
                if self.is_line(x, y, width, height) {
                    img.put_pixel(x, y, self.color);
                }
            }
        }
        Ok(())
    }
}
