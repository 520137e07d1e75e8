use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::{MosaicError, Result};

/// Row-major RGBA8 pixel matrix shared by every pipeline stage.
///
/// Width and height are always at least one; a buffer can only be built
/// through the checked constructors below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    image: RgbaImage,
}

impl RasterBuffer {
    /// A buffer of `width` x `height` pixels all set to `fill`.
    pub fn new(width: u32, height: u32, fill: [u8; 4]) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Rgba(fill)),
        })
    }

    /// Builds a buffer from one RGBA tuple per pixel, row-major.
    pub fn from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> Result<Self> {
        let raw: Vec<u8> = pixels.iter().flatten().copied().collect();
        Self::from_raw(width, height, raw)
    }

    /// Builds a buffer from interleaved RGBA bytes, row-major.
    pub fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        RgbaImage::from_raw(width, height, raw)
            .map(|image| Self { image })
            .ok_or(MosaicError::InvalidDimensions { width, height })
    }

    pub fn from_image(image: RgbaImage) -> Result<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds, like indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        self.image.put_pixel(x, y, Rgba(rgba));
    }

    /// Mutable access to the four channels of `(x, y)`.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8; 4] {
        &mut self.image.get_pixel_mut(x, y).0
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.image.pixels().map(|p| p.0)
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Copies the window `rect` out into a new buffer.
    pub fn crop(&self, rect: Rect) -> Result<Self> {
        rect.check_within(self.width(), self.height())?;
        let view = image::imageops::crop_imm(&self.image, rect.x, rect.y, rect.w, rect.h);
        Self::from_image(view.to_image())
    }
}

impl TryFrom<DynamicImage> for RasterBuffer {
    type Error = MosaicError;

    fn try_from(img: DynamicImage) -> Result<Self> {
        Self::from_image(img.to_rgba8())
    }
}

impl From<RasterBuffer> for DynamicImage {
    fn from(buffer: RasterBuffer) -> Self {
        DynamicImage::ImageRgba8(buffer.image)
    }
}

/// Crop window inside a larger buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    fn check_within(&self, width: u32, height: u32) -> Result<()> {
        check_dimensions(self.w, self.h)?;
        let fits_x = self.x.checked_add(self.w).is_some_and(|right| right <= width);
        let fits_y = self.y.checked_add(self.h).is_some_and(|bottom| bottom <= height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(MosaicError::WindowOutOfBounds {
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
                width,
                height,
            })
        }
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(MosaicError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_buffers() {
        assert!(matches!(
            RasterBuffer::new(0, 4, [0; 4]),
            Err(MosaicError::InvalidDimensions { width: 0, height: 4 })
        ));
        assert!(RasterBuffer::from_raw(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn pixels_are_row_major() {
        let buf = RasterBuffer::from_pixels(2, 1, &[[1, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
        assert_eq!(buf.pixel(1, 0), [5, 6, 7, 8]);
        assert_eq!(buf.as_raw(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn crop_outside_source_fails() {
        let buf = RasterBuffer::new(4, 4, [9; 4]).unwrap();
        assert!(buf.crop(Rect::new(2, 2, 2, 2)).is_ok());
        assert!(matches!(
            buf.crop(Rect::new(3, 0, 2, 2)),
            Err(MosaicError::WindowOutOfBounds { x: 3, y: 0, width: 4, height: 4, .. })
        ));
        assert!(matches!(
            buf.crop(Rect::new(0, 0, 0, 2)),
            Err(MosaicError::InvalidDimensions { .. })
        ));
    }
}
