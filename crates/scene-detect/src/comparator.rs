//! Frame comparator.

use flux_common::error::{FluxError, FluxResult};
use image::RgbaImage;

/// Mean absolute RGB difference between two rasters, as a percentage.
///
/// Sums `|ΔR| + |ΔG| + |ΔB|` over every pixel and divides by the largest
/// possible sum (`pixels × 255 × 3`). Alpha is ignored. The result lies in
/// `[0, 100]`, is symmetric, and is 0 for identical rasters.
pub fn frame_difference(a: &RgbaImage, b: &RgbaImage) -> FluxResult<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(FluxError::DimensionMismatch {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }

    let pixels = a.width() as u64 * a.height() as u64;
    if pixels == 0 {
        return Ok(0.0);
    }

    let total: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(p, q)| {
            p[0].abs_diff(q[0]) as u64 + p[1].abs_diff(q[1]) as u64 + p[2].abs_diff(q[2]) as u64
        })
        .sum();

    Ok(total as f64 / (pixels * 255 * 3) as f64 * 100.0)
}
