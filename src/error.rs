//! Error types for the mosaic pipeline

use thiserror::Error;

/// Result type alias for mosaic operations
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Errors raised by the core transforms and their collaborators
#[derive(Error, Debug)]
pub enum MosaicError {
    /// A width or height of zero somewhere in the pipeline
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A crop window that reaches past the edge of its source
    #[error("Crop window {w}x{h} at ({x}, {y}) exceeds {width}x{height} source")]
    WindowOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },

    /// A block with a zero side
    #[error("Invalid block size: {width}x{height}")]
    InvalidBlockSpec { width: u32, height: u32 },

    /// Two requested tiles would share the same label
    #[error("Duplicate tile label: {0}")]
    DuplicateTile(String),

    /// The input bytes are not in an accepted image format
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The input bytes claim a known format but cannot be decoded
    #[error("Corrupt image data: {0}")]
    CorruptData(String),

    /// The output buffer could not be encoded
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// The decoded payload exceeds the configured limit
    #[error("Input of {size} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    /// Malformed request envelope
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MosaicError {
    /// HTTP-style status a server boundary would report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            MosaicError::InputTooLarge { .. } => 413,
            MosaicError::InvalidDimensions { .. }
            | MosaicError::WindowOutOfBounds { .. }
            | MosaicError::InvalidBlockSpec { .. }
            | MosaicError::DuplicateTile(_)
            | MosaicError::UnsupportedFormat(_)
            | MosaicError::CorruptData(_)
            | MosaicError::InvalidRequest(_) => 400,
            MosaicError::EncodingFailure(_) | MosaicError::Config(_) => 500,
        }
    }
}
