//! Image encoding helpers.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flux_common::error::{FluxError, FluxResult};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Encode a raster as JPEG and wrap it in a `data:` URL.
///
/// JPEG carries no alpha, so the alpha channel is dropped. `quality` is
/// clamped to 1-100.
pub fn jpeg_data_url(image: &RgbaImage, quality: u8) -> FluxResult<String> {
    let bytes = jpeg_bytes(image, quality)?;
    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)))
}

/// Encode a raster as JPEG bytes.
pub fn jpeg_bytes(image: &RgbaImage, quality: u8) -> FluxResult<Vec<u8>> {
    ensure_drawable(image)?;
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|e| FluxError::encode(format!("JPEG encode failed: {e}")))?;
    Ok(bytes)
}

/// Encode a raster as PNG, preserving transparency.
pub fn png_bytes(image: &RgbaImage) -> FluxResult<Vec<u8>> {
    ensure_drawable(image)?;
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| FluxError::encode(format!("PNG encode failed: {e}")))?;
    Ok(cursor.into_inner())
}

fn ensure_drawable(image: &RgbaImage) -> FluxResult<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(FluxError::canvas_context(format!(
            "cannot encode a {}x{} raster",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}
