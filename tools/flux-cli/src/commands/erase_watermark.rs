//! Remove the corner watermark from rendered page images.

use std::path::PathBuf;

use flux_common::config::AppConfig;
use flux_common::error::FluxResult;
use flux_pixel_ops::encode::png_bytes;
use flux_pixel_ops::watermark::{detect_watermark, remove_watermark};
use image::RgbaImage;

use super::derived_png_path;

/// What happened to one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Erased,
    Clean,
    /// The region touches the top edge, so there was no background to copy.
    Untouched,
}

impl PageOutcome {
    fn label(self) -> &'static str {
        match self {
            PageOutcome::Erased => "erased",
            PageOutcome::Clean => "clean",
            PageOutcome::Untouched => "untouched: no background above region",
        }
    }
}

pub fn run(
    config: &AppConfig,
    images: Vec<PathBuf>,
    scale: Option<f64>,
    output_dir: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    let scale = scale.unwrap_or(config.watermark.scale);
    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let total = images.len();
    let mut erased = 0usize;

    for (i, path) in images.iter().enumerate() {
        let mut page = image::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?
            .to_rgba8();

        let (outcome, confidence) = erase_page(&mut page, scale, force)?;
        if outcome == PageOutcome::Erased {
            erased += 1;
        }

        let out = derived_png_path(path, output_dir.as_deref(), "clean");
        std::fs::write(&out, png_bytes(&page)?)?;

        println!(
            "[{}/{total}] {} -> {} ({}, confidence {confidence:.2})",
            i + 1,
            path.display(),
            out.display(),
            outcome.label()
        );
    }

    println!();
    println!("Watermark removed from {erased} of {total} page(s).");
    Ok(())
}

fn erase_page(page: &mut RgbaImage, scale: f64, force: bool) -> FluxResult<(PageOutcome, f64)> {
    let detection = detect_watermark(page, scale)?;
    if !(detection.detected || force) {
        return Ok((PageOutcome::Clean, detection.confidence));
    }
    let painted = remove_watermark(page, scale)?;
    let outcome = if painted.is_empty() {
        PageOutcome::Untouched
    } else {
        PageOutcome::Erased
    };
    Ok((outcome, detection.confidence))
}
