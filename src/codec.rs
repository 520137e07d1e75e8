//! Byte-level edges of the pipeline: container decoding and PNG encoding.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, ImageFormat};
use log::debug;

use crate::error::{MosaicError, Result};
use crate::raster::RasterBuffer;

/// Container formats accepted as input.
pub const ACCEPTED_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// Decodes JPEG, PNG or WEBP bytes into an RGBA buffer.
pub fn decode(bytes: &[u8]) -> Result<RasterBuffer> {
    if bytes.is_empty() {
        return Err(MosaicError::CorruptData("empty input".into()));
    }
    let format = image::guess_format(bytes)
        .map_err(|_| MosaicError::UnsupportedFormat("unrecognized image signature".into()))?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(MosaicError::UnsupportedFormat(format!("{format:?}")));
    }

    let img = image::load_from_memory_with_format(bytes, format).map_err(|e| match e {
        ImageError::Unsupported(e) => MosaicError::UnsupportedFormat(e.to_string()),
        other => MosaicError::CorruptData(other.to_string()),
    })?;
    debug!("decoded {:?} {}x{}", format, img.width(), img.height());
    RasterBuffer::try_from(img)
}

/// Encodes a buffer as an RGBA PNG.
pub fn encode_png(buffer: &RasterBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(buffer.as_raw(), buffer.width(), buffer.height(), ColorType::Rgba8)
        .map_err(|e| MosaicError::EncodingFailure(e.to_string()))?;
    debug!("encoded {}x{} png, {} bytes", buffer.width(), buffer.height(), bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RasterBuffer {
        let pixels = [[255, 0, 0, 255], [0, 255, 0, 128], [0, 0, 255, 0], [9, 9, 9, 255]];
        RasterBuffer::from_pixels(2, 2, &pixels).unwrap()
    }

    #[test]
    fn png_is_lossless() {
        let img = sample();
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode(&bytes).unwrap(), img);
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(MosaicError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn recognized_but_not_accepted() {
        // BMP signature
        assert!(matches!(decode(b"BM\0\0\0\0\0\0"), Err(MosaicError::UnsupportedFormat(_))));
    }

    #[test]
    fn truncated_png_is_corrupt() {
        let bytes = encode_png(&sample()).unwrap();
        assert!(matches!(decode(&bytes[..20]), Err(MosaicError::CorruptData(_))));
        assert!(matches!(decode(&[]), Err(MosaicError::CorruptData(_))));
    }
}
