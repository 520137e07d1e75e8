use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MosaicError, Result};
use crate::pixelizer::block_average::{BlockSpec, Rounding};
use crate::pixelizer::grid::GRID_BLACK;
use crate::pixelizer::tiles::{TileSetGenerator, DEFAULT_TILE_SIZES};
use crate::pixelizer::{CropMethod, ResampleFilter};

pub const ENV_MAX_INPUT_BYTES: &str = "MOSAIC_MAX_INPUT_BYTES";
pub const ENV_COVER_SIZE: &str = "MOSAIC_COVER_SIZE";
pub const ENV_BLOCK_SIZE: &str = "MOSAIC_BLOCK_SIZE";

pub const DEFAULT_MAX_INPUT_BYTES: usize = 5_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub cover_width: u32,
    pub cover_height: u32,
    /// Side of the square block used for a single mosaic.
    pub block_size: u32,
    /// Block sides for tile generation, largest first by convention.
    pub tile_sizes: Vec<u32>,
    pub grid: bool,
    pub grid_color: [u8; 4],
    pub rounding: Rounding,
    pub crop: CropMethod,
    pub filter: ResampleFilter,
    /// Compute tiles on the rayon pool.
    pub parallel: bool,
    /// Largest decoded upload accepted by the transport layer.
    pub max_input_bytes: usize,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            cover_width: 400,
            cover_height: 400,
            block_size: 10,
            tile_sizes: DEFAULT_TILE_SIZES.to_vec(),
            grid: true,
            grid_color: GRID_BLACK,
            rounding: Rounding::default(),
            crop: CropMethod::default(),
            filter: ResampleFilter::default(),
            parallel: true,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl MosaicConfig {
    /// Overrides fields from `MOSAIC_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = var(ENV_MAX_INPUT_BYTES) {
            self.max_input_bytes = raw.trim().parse().map_err(|_| {
                MosaicError::Config(format!("{ENV_MAX_INPUT_BYTES}={raw} is not a byte count"))
            })?;
        }
        if let Some(raw) = var(ENV_COVER_SIZE) {
            let (w, h) = parse_size(&raw)
                .map_err(|e| MosaicError::Config(format!("{ENV_COVER_SIZE}: {e}")))?;
            self.cover_width = w;
            self.cover_height = h;
        }
        if let Some(raw) = var(ENV_BLOCK_SIZE) {
            self.block_size = raw
                .trim()
                .parse()
                .map_err(|_| MosaicError::Config(format!("{ENV_BLOCK_SIZE}={raw} is not a size")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cover_width == 0 || self.cover_height == 0 {
            return Err(MosaicError::Config(format!(
                "cover size {}x{} must be positive",
                self.cover_width, self.cover_height
            )));
        }
        if self.block_size == 0 {
            return Err(MosaicError::Config("block_size must be positive".into()));
        }
        if self.tile_sizes.contains(&0) {
            return Err(MosaicError::Config("tile_sizes must be positive".into()));
        }
        Ok(())
    }

    pub fn block_spec(&self) -> Result<BlockSpec> {
        BlockSpec::square(self.block_size)
    }

    pub fn tile_specs(&self) -> Result<Vec<BlockSpec>> {
        TileSetGenerator::square_specs(&self.tile_sizes)
    }
}

/// Reads a JSON config file; missing fields keep their defaults.
pub fn load_config(path: &Path) -> Result<MosaicConfig> {
    let data = fs::read_to_string(path).map_err(|e| {
        MosaicError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;
    serde_json::from_str(&data).map_err(|e| {
        MosaicError::Config(format!("Failed to parse config {}: {e}", path.display()))
    })
}

/// Parses `"W,H"` into a pair of positive sizes.
pub fn parse_size(size_str: &str) -> std::result::Result<(u32, u32), &'static str> {
    let parts: Vec<&str> = size_str.trim().split(',').collect();
    if parts.len() != 2 {
        return Err("Provide size in the format w,h.");
    }

    let w = parts[0].trim().parse::<u32>().map_err(|_| "Invalid width.")?;
    let h = parts[1].trim().parse::<u32>().map_err(|_| "Invalid height.")?;

    match (w, h) {
        (0, _) => Err("Width is zero."),
        (_, 0) => Err("Height is zero."),
        _ => Ok((w, h)),
    }
}
