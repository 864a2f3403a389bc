//! Make a background color transparent.

use std::path::PathBuf;

use flux_common::config::AppConfig;
use flux_pixel_ops::chroma_key::{pick_color, remove_background, RemoveOptions};
use flux_pixel_ops::encode::png_bytes;

use super::derived_png_path;

pub fn run(
    config: &AppConfig,
    image: PathBuf,
    color: Option<String>,
    pick: Option<String>,
    tolerance: Option<f64>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut raster = image::open(&image)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", image.display()))?
        .to_rgba8();

    let target = match (color, pick) {
        (Some(color), _) => parse_rgb(&color)?,
        (None, Some(point)) => {
            let (x, y) = parse_point(&point)?;
            pick_color(&raster, x, y)
                .ok_or_else(|| anyhow::anyhow!("Cannot pick a color from an empty image"))?
        }
        (None, None) => anyhow::bail!("Specify the background with --color R,G,B or --pick X,Y"),
    };

    let options = RemoveOptions::new(target, tolerance.unwrap_or(config.background.tolerance))?;
    let keyed = remove_background(&mut raster, &options)?;

    let out = output.unwrap_or_else(|| derived_png_path(&image, None, "nobg"));
    std::fs::write(&out, png_bytes(&raster)?)?;

    let total = raster.width() as u64 * raster.height() as u64;
    println!(
        "Keyed out rgb({}, {}, {}) at tolerance {}: {keyed} of {total} pixels",
        target[0], target[1], target[2], options.tolerance
    );
    println!("Wrote {}", out.display());
    Ok(())
}

/// Parse `R,G,B` with each channel in 0-255.
fn parse_rgb(raw: &str) -> anyhow::Result<[u8; 3]> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let &[r, g, b] = parts.as_slice() else {
        anyhow::bail!("Color must be R,G,B, got '{raw}'");
    };
    let channel = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| anyhow::anyhow!("Color channel must be 0-255, got '{s}'"))
    };
    Ok([channel(r)?, channel(g)?, channel(b)?])
}

/// Parse `X,Y` pixel coordinates.
fn parse_point(raw: &str) -> anyhow::Result<(i64, i64)> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Point must be X,Y, got '{raw}'"))?;
    let x = x.trim().parse::<i64>()?;
    let y = y.trim().parse::<i64>()?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_triplets() {
        assert_eq!(parse_rgb("0, 255,12").unwrap(), [0, 255, 12]);
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("1,2,300").is_err());
    }

    #[test]
    fn parses_points() {
        assert_eq!(parse_point("10,-3").unwrap(), (10, -3));
        assert!(parse_point("10").is_err());
    }

    #[test]
    fn keys_out_picked_corner() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("logo.png");
        let mut img = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 200, 0, 255]));
        img.put_pixel(4, 4, image::Rgba([200, 0, 0, 255]));
        img.save(&input).unwrap();

        let output = dir.path().join("logo-cut.png");
        run(
            &AppConfig::default(),
            input,
            None,
            Some("0,0".to_string()),
            None,
            Some(output.clone()),
        )
        .unwrap();

        let result = image::open(&output).unwrap().to_rgba8();
        assert_eq!(result.get_pixel(0, 0)[3], 0);
        assert_eq!(result.get_pixel(4, 4)[3], 255);
    }
}
