//! Preview images for confirmed scene boundaries.

use flux_common::error::FluxResult;
use flux_pixel_ops::encode::jpeg_data_url;
use image::RgbaImage;

use crate::backend::{VideoMetadata, VideoSource};
use crate::sampler::FrameSampler;

pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 320;
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

/// A seek is skipped when the source is already this close to the target.
pub const SEEK_EPSILON_SECS: f64 = 0.01;

/// Renders a JPEG `data:` URL of the frame at a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailCapturer {
    width: u32,
    quality: u8,
}

impl Default for ThumbnailCapturer {
    fn default() -> Self {
        Self {
            width: DEFAULT_THUMBNAIL_WIDTH,
            quality: DEFAULT_THUMBNAIL_QUALITY,
        }
    }
}

impl ThumbnailCapturer {
    /// `width` is raised to at least 1 and `quality` clamped to 1-100.
    pub fn new(width: u32, quality: u8) -> Self {
        Self {
            width: width.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Output size for a video, keeping its aspect ratio.
    pub fn thumbnail_size(&self, metadata: &VideoMetadata) -> (u32, u32) {
        (self.width, metadata.height_for_width(self.width))
    }

    /// Capture the frame at `time_secs`.
    pub async fn capture<S: VideoSource>(
        &self,
        sampler: &mut FrameSampler<S>,
        time_secs: f64,
    ) -> FluxResult<String> {
        if !sampler.has_frame() || (sampler.current_time() - time_secs).abs() > SEEK_EPSILON_SECS
        {
            sampler.seek(time_secs).await?;
        }

        let (width, height) = self.thumbnail_size(sampler.metadata());
        let mut surface = RgbaImage::new(width, height);
        sampler.draw_frame(&mut surface)?;
        jpeg_data_url(&surface, self.quality)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::backend::SyntheticVideo;

    #[test]
    fn size_follows_aspect_ratio() {
        let capturer = ThumbnailCapturer::default();
        let meta = VideoMetadata {
            duration_secs: 1.0,
            width: 640,
            height: 360,
        };
        assert_eq!(capturer.thumbnail_size(&meta), (320, 180));
    }

    #[test]
    fn new_clamps_inputs() {
        let capturer = ThumbnailCapturer::new(0, 0);
        assert_eq!(capturer.width(), 1);
        assert_eq!(capturer.quality(), 1);
    }

    #[tokio::test]
    async fn skips_seek_when_already_positioned() {
        let video = SyntheticVideo::still(64, 48, 3.0, [50, 60, 70]);
        let seeks = video.seek_counter();
        let mut sampler = FrameSampler::open(video).await.unwrap();

        let url = ThumbnailCapturer::default()
            .capture(&mut sampler, 1.5)
            .await
            .unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(seeks.load(Ordering::SeqCst), 1);

        ThumbnailCapturer::default()
            .capture(&mut sampler, 1.505)
            .await
            .unwrap();
        assert_eq!(seeks.load(Ordering::SeqCst), 1);

        ThumbnailCapturer::default()
            .capture(&mut sampler, 2.0)
            .await
            .unwrap();
        assert_eq!(seeks.load(Ordering::SeqCst), 2);
    }
}
