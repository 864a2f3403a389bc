use flux_common::error::FluxResult;
use image::RgbaImage;

/// Properties of a loaded video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    /// Length in seconds.
    pub duration_secs: f64,
    /// Natural frame width in pixels.
    pub width: u32,
    /// Natural frame height in pixels.
    pub height: u32,
}

impl VideoMetadata {
    /// Height that keeps the source aspect ratio at the given width.
    pub fn height_for_width(&self, width: u32) -> u32 {
        if self.width == 0 {
            return width.max(1);
        }
        let ratio = self.height as f64 / self.width as f64;
        ((width as f64 * ratio).round() as u32).max(1)
    }
}

/// Abstract interface over something that can decode video frames at
/// arbitrary timestamps.
///
/// A source is owned by exactly one detection run. Seeks mutate the decode
/// position, so callers serialize seek and frame reads.
#[async_trait::async_trait]
pub trait VideoSource: Send {
    /// Load container metadata. Failure means the media is unusable.
    async fn load_metadata(&mut self) -> FluxResult<VideoMetadata>;

    /// Move to `time_secs` and return once a frame at or after that time
    /// has been decoded.
    async fn seek(&mut self, time_secs: f64) -> FluxResult<()>;

    /// Position of the most recent completed seek.
    fn current_time(&self) -> f64;

    /// The decoded frame at the current position, at natural resolution.
    /// `None` before the first seek completes.
    fn current_frame(&self) -> Option<&RgbaImage>;

    /// Free the underlying resource. Must be safe to call more than once.
    fn release(&mut self);

    /// Backend name for logs.
    fn name(&self) -> &str;
}

pub mod ffmpeg;
pub mod synthetic;

pub use ffmpeg::FfmpegVideo;
pub use synthetic::SyntheticVideo;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_preserves_aspect() {
        let meta = VideoMetadata {
            duration_secs: 10.0,
            width: 1920,
            height: 1080,
        };
        assert_eq!(meta.height_for_width(320), 180);

        let portrait = VideoMetadata {
            duration_secs: 10.0,
            width: 1080,
            height: 1920,
        };
        assert_eq!(portrait.height_for_width(320), 569);
    }
}
