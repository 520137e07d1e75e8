use log::debug;
use serde::{Deserialize, Serialize};

use super::Pixelizer;
use crate::error::{MosaicError, Result};
use crate::raster::RasterBuffer;

/// Nominal size of one averaging block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSpec {
    width: u32,
    height: u32,
}

impl BlockSpec {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MosaicError::InvalidBlockSpec { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn square(size: u32) -> Result<Self> {
        Self::new(size, size)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `"16"` for square blocks, `"16x8"` otherwise.
    pub fn label(&self) -> String {
        if self.width == self.height {
            self.width.to_string()
        } else {
            format!("{}x{}", self.width, self.height)
        }
    }
}

/// Tie-break applied when a channel mean falls exactly on `.5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    #[default]
    HalfUp,
    HalfEven,
}

impl Rounding {
    /// Rounds `sum / count` to an integer channel value in `[0, 255]`.
    pub fn mean(self, sum: u64, count: u64) -> u8 {
        debug_assert!(count > 0);
        let (quotient, remainder) = (sum / count, sum % count);
        let twice = remainder * 2;
        let rounded = match self {
            Rounding::HalfUp => quotient + u64::from(twice >= count),
            Rounding::HalfEven => {
                if twice > count || (twice == count && quotient % 2 == 1) {
                    quotient + 1
                } else {
                    quotient
                }
            }
        };
        rounded.min(u8::MAX as u64) as u8
    }
}

/// Replaces every block of pixels with the mean of its R, G and B channels.
///
/// Blocks start at the top-left corner; the last column and row of blocks
/// shrink to whatever is left of the image. Alpha is never touched.
#[derive(Debug, Clone, Copy)]
pub struct BlockAverager {
    block: BlockSpec,
    rounding: Rounding,
}

impl BlockAverager {
    pub fn new(block: BlockSpec) -> Self {
        Self {
            block,
            rounding: Rounding::default(),
        }
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn block(&self) -> BlockSpec {
        self.block
    }

    fn average_block(&self, img: &mut RasterBuffer, x0: u32, y0: u32, x1: u32, y1: u32) {
        let mut sums = [0u64; 3];
        for y in y0..y1 {
            for x in x0..x1 {
                let px = img.pixel(x, y);
                for (sum, channel) in sums.iter_mut().zip(px) {
                    *sum += u64::from(channel);
                }
            }
        }

        let count = u64::from(x1 - x0) * u64::from(y1 - y0);
        let mean = sums.map(|sum| self.rounding.mean(sum, count));

        for y in y0..y1 {
            for x in x0..x1 {
                img.pixel_mut(x, y)[..3].copy_from_slice(&mean);
            }
        }
    }
}

impl Pixelizer for BlockAverager {
    fn pixelize(&self, img: &mut RasterBuffer) -> Result<()> {
        let (width, height) = img.dimensions();
        let (bw, bh) = (self.block.width, self.block.height);
        debug!("averaging {}x{} image in {}x{} blocks", width, height, bw, bh);

        // Blocks are disjoint, so each one reads only pixels no other block writes.
        for y0 in (0..height).step_by(bh as usize) {
            let y1 = y0.saturating_add(bh).min(height);
            for x0 in (0..width).step_by(bw as usize) {
                let x1 = x0.saturating_add(bw).min(width);
                self.average_block(img, x0, y0, x1, y1);
            }
        }
        Ok(())
    }
}

/// Averages `img` in place with square blocks of `size` pixels.
pub fn pixelate(img: &mut RasterBuffer, size: u32) -> Result<()> {
    BlockAverager::new(BlockSpec::square(size)?).pixelize(img)
}
