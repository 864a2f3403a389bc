//! Chroma-key background removal.
//!
//! Pure per-pixel color-distance thresholding: each pixel is judged only by
//! its Euclidean RGB distance to the target color, never by its neighbours.

use flux_common::error::{FluxError, FluxResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Largest possible RGB distance, between black and white.
pub const MAX_COLOR_DISTANCE: f64 = 441.672_955_930_063_7; // sqrt(3 * 255^2)

/// Width of the alpha ramp as a fraction of the threshold distance.
pub const EDGE_FRACTION: f64 = 0.1;

/// Parameters for [`remove_background`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOptions {
    /// Background color to key out.
    pub target_color: [u8; 3],
    /// Percentage of [`MAX_COLOR_DISTANCE`] treated as background, 0-100.
    pub tolerance: f64,
}

impl RemoveOptions {
    pub fn new(target_color: [u8; 3], tolerance: f64) -> FluxResult<Self> {
        let options = Self {
            target_color,
            tolerance,
        };
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> FluxResult<()> {
        if (0.0..=100.0).contains(&self.tolerance) {
            Ok(())
        } else {
            Err(FluxError::invalid_argument(format!(
                "tolerance must be within [0, 100], got {}",
                self.tolerance
            )))
        }
    }

    /// Distance below which pixels are keyed out.
    pub fn threshold(&self) -> f64 {
        self.tolerance / 100.0 * MAX_COLOR_DISTANCE
    }
}

/// Euclidean distance between two RGB colors.
pub fn color_distance(a: [u8; 3], b: [u8; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f64 - y as f64).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Alpha for a pixel at `distance` from the target, or `None` when the
/// pixel lies outside the threshold and keeps its own alpha.
pub fn keyed_alpha(distance: f64, threshold: f64) -> Option<u8> {
    if distance > threshold {
        return None;
    }
    let edge = threshold * EDGE_FRACTION;
    if edge <= 0.0 || distance < threshold - edge {
        return Some(0);
    }
    let edge_factor = (threshold - distance) / edge;
    Some(((1.0 - edge_factor) * 255.0).round() as u8)
}

/// Make pixels close to `options.target_color` transparent, in place.
///
/// Returns the number of pixels whose alpha was rewritten.
pub fn remove_background(image: &mut RgbaImage, options: &RemoveOptions) -> FluxResult<usize> {
    options.validate()?;
    let threshold = options.threshold();
    let mut keyed = 0usize;

    for px in image.pixels_mut() {
        let distance = color_distance([px[0], px[1], px[2]], options.target_color);
        if let Some(alpha) = keyed_alpha(distance, threshold) {
            px[3] = alpha;
            keyed += 1;
        }
    }

    tracing::debug!(
        keyed,
        total = image.width() as u64 * image.height() as u64,
        tolerance = options.tolerance,
        "Background removed"
    );
    Ok(keyed)
}

/// RGB at `(x, y)`, with coordinates clamped into the image.
///
/// Returns `None` for an empty image.
pub fn pick_color(image: &RgbaImage, x: i64, y: i64) -> Option<[u8; 3]> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    let cx = x.clamp(0, image.width() as i64 - 1) as u32;
    let cy = y.clamp(0, image.height() as i64 - 1) as u32;
    let px = image.get_pixel(cx, cy);
    Some([px[0], px[1], px[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    #[test]
    fn max_distance_constant() {
        let computed = color_distance([0, 0, 0], [255, 255, 255]);
        assert!((computed - MAX_COLOR_DISTANCE).abs() < 1e-9);
    }

    #[test]
    fn far_pixels_keep_alpha() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 200]));
        let options = RemoveOptions::new([0, 0, 255], 30.0).unwrap();
        assert_eq!(remove_background(&mut img, &options).unwrap(), 0);
        assert_eq!(img.get_pixel(0, 0)[3], 200);
    }

    #[test]
    fn edge_band_ramps_alpha() {
        let threshold = 100.0;
        assert_eq!(keyed_alpha(50.0, threshold), Some(0));
        assert_eq!(keyed_alpha(90.0, threshold), Some(0));
        assert_eq!(keyed_alpha(95.0, threshold), Some(128));
        assert_eq!(keyed_alpha(100.0, threshold), Some(255));
        assert_eq!(keyed_alpha(100.5, threshold), None);
    }

    #[test]
    fn zero_tolerance_keys_exact_matches_only() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([10, 20, 31, 255]));
        let options = RemoveOptions::new([10, 20, 30], 0.0).unwrap();
        assert_eq!(remove_background(&mut img, &options).unwrap(), 1);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(1, 0)[3], 255);
    }

    #[test]
    fn rejects_out_of_range_tolerance() {
        assert!(RemoveOptions::new([0, 0, 0], 101.0).is_err());
        let options = RemoveOptions {
            target_color: [0, 0, 0],
            tolerance: -5.0,
        };
        let mut img = RgbaImage::new(1, 1);
        assert!(remove_background(&mut img, &options).is_err());
    }

    #[test]
    fn pick_color_clamps_coordinates() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([1, 1, 1, 255]));
        img.put_pixel(2, 2, Rgba([9, 8, 7, 255]));
        assert_eq!(pick_color(&img, 50, 50), Some([9, 8, 7]));
        assert_eq!(pick_color(&img, -4, 0), Some([1, 1, 1]));
        assert_eq!(pick_color(&RgbaImage::new(0, 0), 0, 0), None);
    }

    proptest! {
        #[test]
        fn exact_target_becomes_transparent(
            r in any::<u8>(),
            g in any::<u8>(),
            b in any::<u8>(),
            tolerance in 0.01f64..=100.0,
        ) {
            let mut img = RgbaImage::from_pixel(1, 1, Rgba([r, g, b, 255]));
            let options = RemoveOptions::new([r, g, b], tolerance).unwrap();
            remove_background(&mut img, &options).unwrap();
            prop_assert_eq!(img.get_pixel(0, 0)[3], 0);
        }
    }
}
