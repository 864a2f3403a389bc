//! Flux Pixel Ops
//!
//! Deterministic single-pass filters over in-memory RGBA rasters:
//!
//! ```text
//! page.png ── detect_watermark ── remove_watermark ──▶ clean page
//! photo.png ── pick_color ── remove_background ──▶ cut-out (PNG, alpha)
//! frame ── jpeg_data_url ──▶ "data:image/jpeg;base64,..."
//! ```
//!
//! Nothing here touches the filesystem; callers decode and write images.

pub mod chroma_key;
pub mod encode;
pub mod watermark;

pub use chroma_key::{pick_color, remove_background, RemoveOptions};
pub use encode::{jpeg_data_url, png_bytes};
pub use watermark::{detect_watermark, remove_watermark, WatermarkDetection};
