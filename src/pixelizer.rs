use image::imageops::{self, FilterType};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raster::{check_dimensions, RasterBuffer, Rect};

/// Where the crop window sits along the overflowing dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropMethod {
    /// Centered, the offset truncated toward zero.
    #[default]
    CropEqual,
    CropRandom,
}

/// Resampling kernel used when scaling. Maps onto `image`'s `FilterType`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Scaled size of the source, the crop window inside it, and the source
/// pixels that window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverGeometry {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub window: Rect,
    pub source_window: Rect,
}

/// Computes the cover-fit geometry for a `src_w` x `src_h` source.
///
/// The source is scaled by `max(target_w / src_w, target_h / src_h)` so
/// that it covers the target, then the excess along the longer side is
/// cropped away.
pub fn cover_geometry(
    src_w: u32,
    src_h: u32,
    target_w: u32,
    target_h: u32,
    crop: CropMethod,
) -> Result<CoverGeometry> {
    check_dimensions(src_w, src_h)?;
    check_dimensions(target_w, target_h)?;

    let scale = f64::max(
        target_w as f64 / src_w as f64,
        target_h as f64 / src_h as f64,
    );
    // Rounding can land one pixel short of the target on the covering side.
    let scaled_width = scaled_side(src_w, scale).max(target_w);
    let scaled_height = scaled_side(src_h, scale).max(target_h);

    let (slack_x, slack_y) = (scaled_width - target_w, scaled_height - target_h);
    let (x, y) = match crop {
        CropMethod::CropEqual => (slack_x / 2, slack_y / 2),
        CropMethod::CropRandom => {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..=slack_x), rng.gen_range(0..=slack_y))
        }
    };

    let (src_x, span_w) = source_span(x, target_w, scaled_width, src_w);
    let (src_y, span_h) = source_span(y, target_h, scaled_height, src_h);

    Ok(CoverGeometry {
        scaled_width,
        scaled_height,
        window: Rect::new(x, y, target_w, target_h),
        source_window: Rect::new(src_x, src_y, span_w, span_h),
    })
}

fn scaled_side(side: u32, scale: f64) -> u32 {
    let scaled = (side as f64 * scale).round();
    if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Whole source pixels under `[offset, offset + len)` of a side scaled
/// from `side` to `scaled`, as `(start, len)`. Never empty.
fn source_span(offset: u32, len: u32, scaled: u32, side: u32) -> (u32, u32) {
    let ratio = scaled as f64 / side as f64;
    let start = ((offset as f64 / ratio).floor() as u32).min(side - 1);
    let end = ((u64::from(offset) + u64::from(len)) as f64 / ratio).ceil() as u32;
    let end = end.clamp(start + 1, side);
    (start, end - start)
}

/// Scales and crops a buffer so it exactly fills a fixed canvas.
#[derive(Debug, Clone, Copy)]
pub struct CoverResizer {
    width: u32,
    height: u32,
    crop: CropMethod,
    filter: ResampleFilter,
}

impl CoverResizer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            crop: CropMethod::default(),
            filter: ResampleFilter::default(),
        })
    }

    pub fn with_crop(mut self, crop: CropMethod) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn target(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Only the source pixels under the crop window are resampled, so
    /// memory stays proportional to the source plus the canvas.
    pub fn resize(&self, src: &RasterBuffer) -> Result<RasterBuffer> {
        let (src_w, src_h) = src.dimensions();
        let geometry = cover_geometry(src_w, src_h, self.width, self.height, self.crop)?;
        debug!(
            "cover {}x{} -> scaled {}x{}, window {:?} from {:?}",
            src_w,
            src_h,
            geometry.scaled_width,
            geometry.scaled_height,
            geometry.window,
            geometry.source_window
        );

        if (geometry.scaled_width, geometry.scaled_height) == (src_w, src_h) {
            return src.crop(geometry.window);
        }
        let covered = src.crop(geometry.source_window)?;
        let scaled = imageops::resize(
            covered.as_image(),
            self.width,
            self.height,
            self.filter.into(),
        );
        RasterBuffer::from_image(scaled)
    }
}

/// Cover-fits `src` onto a `width` x `height` canvas with a centered crop.
pub fn cover_resize(src: &RasterBuffer, width: u32, height: u32) -> Result<RasterBuffer> {
    CoverResizer::new(width, height)?.resize(src)
}

/// An in-place transform over a whole buffer.
pub trait Pixelizer {
    fn pixelize(&self, img: &mut RasterBuffer) -> Result<()>;
}

pub mod block_average;
pub mod grid;
pub mod tiles;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MosaicError;

    fn gradient(w: u32, h: u32) -> RasterBuffer {
        let pixels: Vec<[u8; 4]> = (0..h)
            .flat_map(|y| (0..w).map(move |x| [x as u8, y as u8, (x + y) as u8, 255]))
            .collect();
        RasterBuffer::from_pixels(w, h, &pixels).unwrap()
    }

    #[test]
    fn test_size() {
        let targets = [(1, 1), (50, 50), (400, 400), (13, 200), (200, 13)];
        for (src_w, src_h) in [(37, 91), (1, 1), (1, 500), (500, 1), (3, 997)] {
            let src = gradient(src_w, src_h);
            for (w, h) in targets {
                let out = cover_resize(&src, w, h).unwrap();
                assert_eq!(out.dimensions(), (w, h), "{src_w}x{src_h} -> {w}x{h}");
            }
        }
    }

    #[test]
    fn thin_strip_resamples_only_the_window() {
        let g = cover_geometry(3000, 1, 400, 400, CropMethod::CropEqual).unwrap();
        assert_eq!((g.scaled_width, g.scaled_height), (1_200_000, 400));
        assert_eq!(g.source_window, Rect::new(1499, 0, 2, 1));

        let start = std::time::Instant::now();
        for (w, h) in [(4000, 1), (1, 4000)] {
            let out = cover_resize(&gradient(w, h), 400, 400).unwrap();
            assert_eq!(out.dimensions(), (400, 400));
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn source_window_maps_the_crop_back() {
        let g = cover_geometry(100, 50, 50, 50, CropMethod::CropEqual).unwrap();
        assert_eq!(g.source_window, g.window);

        let g = cover_geometry(200, 100, 50, 50, CropMethod::CropEqual).unwrap();
        assert_eq!(g.source_window, Rect::new(50, 0, 100, 100));

        let g = cover_geometry(10, 40, 20, 20, CropMethod::CropEqual).unwrap();
        assert_eq!((g.scaled_width, g.scaled_height), (20, 80));
        assert_eq!(g.source_window, Rect::new(0, 15, 10, 10));
    }

    #[test]
    fn wide_source_is_center_cropped() {
        let src = gradient(100, 50);
        let out = cover_resize(&src, 50, 50).unwrap();
        assert_eq!(out.dimensions(), (50, 50));
        for y in 0..50 {
            for x in 0..50 {
                assert_eq!(out.pixel(x, y), src.pixel(x + 25, y));
            }
        }
    }

    #[test]
    fn geometry_scales_the_shorter_side() {
        let g = cover_geometry(200, 100, 50, 50, CropMethod::CropEqual).unwrap();
        assert_eq!((g.scaled_width, g.scaled_height), (100, 50));
        assert_eq!(g.window, Rect::new(25, 0, 50, 50));

        let g = cover_geometry(30, 90, 60, 60, CropMethod::CropEqual).unwrap();
        assert_eq!((g.scaled_width, g.scaled_height), (60, 180));
        assert_eq!(g.window, Rect::new(0, 60, 60, 60));
    }

    #[test]
    fn odd_slack_truncates_offset() {
        let g = cover_geometry(51, 50, 50, 50, CropMethod::CropEqual).unwrap();
        assert_eq!(g.window.x, 0);
        let g = cover_geometry(53, 50, 50, 50, CropMethod::CropEqual).unwrap();
        assert_eq!(g.window.x, 1);
    }

    #[test]
    fn random_crop_stays_inside() {
        for _ in 0..32 {
            let g = cover_geometry(120, 40, 40, 40, CropMethod::CropRandom).unwrap();
            assert!(g.window.x <= 80);
            assert_eq!(g.window.y, 0);
        }
        let src = gradient(120, 40);
        let resizer = CoverResizer::new(40, 40).unwrap().with_crop(CropMethod::CropRandom);
        assert_eq!(resizer.resize(&src).unwrap().dimensions(), (40, 40));
    }

    #[test]
    fn zero_target_is_rejected() {
        assert!(matches!(
            CoverResizer::new(0, 10),
            Err(MosaicError::InvalidDimensions { .. })
        ));
        assert!(cover_geometry(0, 5, 5, 5, CropMethod::CropEqual).is_err());
    }
}
