//! Bottom-right watermark detection and removal for rasterized pages.
//!
//! The watermark sits at a fixed offset from the bottom-right corner of the
//! page, so its region is derived from the canvas size and the render scale
//! alone. Detection compares the region's color variance with a strip of
//! background directly above it; removal extends that background downward
//! column by column.

use flux_common::error::{FluxError, FluxResult};
use flux_media_model::region::PixelRect;
use image::{Rgba, RgbaImage};

/// Region is considered watermarked when its variance exceeds the
/// background strip's by this factor.
pub const VARIANCE_RATIO: f64 = 1.5;

/// Number of background samples averaged per column.
const COLUMN_SAMPLES: u32 = 3;

/// Outcome of [`detect_watermark`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkDetection {
    pub detected: bool,
    /// Region variance over background variance, capped at 1.0.
    pub confidence: f64,
    pub region: PixelRect,
}

/// The watermark region for a `width × height` canvas rendered at `scale`,
/// clamped to the canvas.
pub fn watermark_region(width: u32, height: u32, scale: f64) -> PixelRect {
    let x = width.saturating_sub(scaled(130.0, scale));
    let y = height.saturating_sub(scaled(38.0, scale));
    PixelRect::new(x, y, scaled(128.0, scale), scaled(36.0, scale)).clamp_to(width, height)
}

/// Mean squared deviation of the R, G and B channels over `rect`.
///
/// Returns 0 for an empty rectangle.
pub fn color_variance(image: &RgbaImage, rect: PixelRect) -> f64 {
    let rect = rect.clamp_to(image.width(), image.height());
    let pixel_count = rect.area() as f64;
    if pixel_count == 0.0 {
        return 0.0;
    }

    let mut sums = [0.0f64; 3];
    for px in rect_pixels(image, rect) {
        for c in 0..3 {
            sums[c] += px[c] as f64;
        }
    }
    let means = sums.map(|s| s / pixel_count);

    let mut variance = 0.0;
    for px in rect_pixels(image, rect) {
        for c in 0..3 {
            variance += (px[c] as f64 - means[c]).powi(2);
        }
    }

    variance / (pixel_count * 3.0)
}

/// Decide whether the bottom-right region holds a watermark.
pub fn detect_watermark(image: &RgbaImage, scale: f64) -> FluxResult<WatermarkDetection> {
    validate_scale(scale)?;
    let region = watermark_region(image.width(), image.height(), scale);

    let strip_height = scaled(10.0, scale).min(region.y);
    let strip = PixelRect::new(region.x, region.y - strip_height, region.width, strip_height);

    let region_variance = color_variance(image, region);
    let background_variance = color_variance(image, strip);

    let detected = region_variance > background_variance * VARIANCE_RATIO;
    let confidence = (region_variance / background_variance.max(1.0)).min(1.0);

    tracing::debug!(
        region_variance,
        background_variance,
        detected,
        "Watermark detection"
    );

    Ok(WatermarkDetection {
        detected,
        confidence,
        region,
    })
}

/// Overwrite the watermark region with the background color found above
/// each column. Returns the region that was painted.
///
/// Only pixels above the region are read, so running this twice yields the
/// same raster. A region touching the top edge has no background to extend
/// and is left unchanged (an empty rectangle is returned).
pub fn remove_watermark(image: &mut RgbaImage, scale: f64) -> FluxResult<PixelRect> {
    validate_scale(scale)?;
    let region = watermark_region(image.width(), image.height(), scale);
    if region.is_empty() || region.y == 0 {
        return Ok(PixelRect::default());
    }

    let sample_offset = scaled(5.0, scale);
    let sample_step = scaled(2.0, scale);

    for x in region.x..region.right() {
        let mut sums = [0u32; 3];
        for s in 0..COLUMN_SAMPLES {
            let sample_y = region
                .y
                .saturating_sub(sample_offset)
                .saturating_sub(s * sample_step);
            let px = image.get_pixel(x, sample_y);
            for c in 0..3 {
                sums[c] += px[c] as u32;
            }
        }
        let fill = Rgba([
            average(sums[0]),
            average(sums[1]),
            average(sums[2]),
            u8::MAX,
        ]);

        for y in region.y..region.bottom() {
            image.put_pixel(x, y, fill);
        }
    }

    Ok(region)
}

/// Remove the watermark only when [`detect_watermark`] finds one.
pub fn erase_if_detected(image: &mut RgbaImage, scale: f64) -> FluxResult<WatermarkDetection> {
    let detection = detect_watermark(image, scale)?;
    if detection.detected {
        remove_watermark(image, scale)?;
    }
    Ok(detection)
}

/// Remove the watermark from every page, reporting `(done, total)` after
/// each one.
pub fn remove_watermark_from_all(
    pages: &mut [RgbaImage],
    scale: f64,
    on_progress: Option<&dyn Fn(usize, usize)>,
) -> FluxResult<()> {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        remove_watermark(page, scale)?;
        if let Some(cb) = on_progress {
            cb(i + 1, total);
        }
    }
    Ok(())
}

fn rect_pixels(image: &RgbaImage, rect: PixelRect) -> impl Iterator<Item = &Rgba<u8>> + '_ {
    (rect.y..rect.bottom())
        .flat_map(move |y| (rect.x..rect.right()).map(move |x| image.get_pixel(x, y)))
}

fn average(sum: u32) -> u8 {
    (sum as f64 / COLUMN_SAMPLES as f64).round() as u8
}

fn scaled(value: f64, scale: f64) -> u32 {
    (value * scale).ceil() as u32
}

fn validate_scale(scale: f64) -> FluxResult<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(FluxError::invalid_argument(format!(
            "render scale must be positive, got {scale}"
        )))
    }
}
