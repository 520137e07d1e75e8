//! JSON envelopes carrying base64 image payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{MosaicError, Result};
use crate::pixelizer::tiles::TileSet;
use crate::raster::RasterBuffer;
use crate::{codec, config::MosaicConfig, pipeline::MosaicPipeline};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicRequest {
    /// Base64 image file, optionally prefixed with a `data:` URL header.
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MosaicResponse {
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileEntry {
    pub label: String,
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileSetResponse {
    pub tiles: Vec<TileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip)]
    pub status: u16,
}

impl From<&MosaicError> for ErrorResponse {
    fn from(err: &MosaicError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status_code(),
        }
    }
}

impl MosaicRequest {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MosaicError::InvalidRequest(e.to_string()))
    }

    /// Decodes the base64 payload, enforcing `limit` on the decoded size.
    pub fn file_bytes(&self, limit: usize) -> Result<Vec<u8>> {
        let payload = strip_data_url(self.file.trim());
        // Base64 carries 3 bytes per 4 characters.
        let estimate = payload.len() / 4 * 3;
        if estimate > limit.saturating_add(3) {
            return Err(MosaicError::InputTooLarge { size: estimate, limit });
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| MosaicError::InvalidRequest(format!("bad base64: {e}")))?;
        if bytes.len() > limit {
            return Err(MosaicError::InputTooLarge {
                size: bytes.len(),
                limit,
            });
        }
        Ok(bytes)
    }
}

fn strip_data_url(file: &str) -> &str {
    match file.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => file,
    }
}

pub fn encode_buffer(buffer: &RasterBuffer) -> Result<String> {
    Ok(STANDARD.encode(codec::encode_png(buffer)?))
}

impl TileSetResponse {
    pub fn from_tiles(tiles: &TileSet) -> Result<Self> {
        let tiles = tiles
            .iter()
            .map(|tile| {
                Ok(TileEntry {
                    label: tile.label.clone(),
                    result: encode_buffer(&tile.buffer)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tiles })
    }
}

/// Runs one request envelope through decode, the pipeline and encode.
pub fn handle_request(json: &str, config: &MosaicConfig) -> Result<MosaicResponse> {
    let request = MosaicRequest::parse(json)?;
    let bytes = request.file_bytes(config.max_input_bytes)?;
    info!("request with {} byte image", bytes.len());
    let source = codec::decode(&bytes)?;
    let pipeline = MosaicPipeline::from_config(config)?;
    let result = encode_buffer(&pipeline.render(&source)?)?;
    Ok(MosaicResponse { result })
}

/// Like [`handle_request`], producing every configured tile size.
pub fn handle_tiles_request(json: &str, config: &MosaicConfig) -> Result<TileSetResponse> {
    let request = MosaicRequest::parse(json)?;
    let bytes = request.file_bytes(config.max_input_bytes)?;
    info!("tile request with {} byte image", bytes.len());
    let source = codec::decode(&bytes)?;
    let pipeline = MosaicPipeline::from_config(config)?;
    let tiles = pipeline.render_tiles(&source, &config.tile_specs()?)?;
    TileSetResponse::from_tiles(&tiles)
}

/// Serializes either the response or the error envelope.
pub fn respond<T: Serialize>(outcome: &Result<T>) -> (u16, String) {
    let serialized = match outcome {
        Ok(body) => serde_json::to_string(body).map(|json| (200, json)),
        Err(err) => serde_json::to_string(&ErrorResponse::from(err))
            .map(|json| (err.status_code(), json)),
    };
    serialized.unwrap_or_else(|e| (500, fallback_message(&e)))
}

fn fallback_message(err: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "message": err.to_string() }).to_string()
}
