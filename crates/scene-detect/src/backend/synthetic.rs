//! In-memory video whose frames are computed from the timestamp.
//!
//! Used for tests and demos: no decoder, no files. Failures can be injected
//! at metadata load or at a given seek position, and the release state is
//! observable after the source has been moved into a detection run.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use flux_common::error::{FluxError, FluxResult};
use image::{Rgba, RgbaImage};

use super::{VideoMetadata, VideoSource};

type PixelFn = Box<dyn Fn(f64, u32, u32) -> Rgba<u8> + Send + Sync>;

/// A video generated by a `(time, x, y) -> pixel` function.
pub struct SyntheticVideo {
    metadata: VideoMetadata,
    pixel: PixelFn,
    current_time: f64,
    frame: Option<RgbaImage>,
    loaded: bool,
    metadata_error: Option<String>,
    seek_error_at: Option<f64>,
    released: Arc<AtomicBool>,
    seeks: Arc<AtomicUsize>,
}

impl SyntheticVideo {
    /// Build a video from a per-pixel function of time.
    pub fn from_fn<F>(width: u32, height: u32, duration_secs: f64, pixel: F) -> Self
    where
        F: Fn(f64, u32, u32) -> Rgba<u8> + Send + Sync + 'static,
    {
        Self {
            metadata: VideoMetadata {
                duration_secs,
                width,
                height,
            },
            pixel: Box::new(pixel),
            current_time: 0.0,
            frame: None,
            loaded: false,
            metadata_error: None,
            seek_error_at: None,
            released: Arc::new(AtomicBool::new(false)),
            seeks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A video made of solid-color segments. Each `(start_secs, rgb)` entry
    /// holds until the next one starts.
    pub fn solid_segments(
        width: u32,
        height: u32,
        duration_secs: f64,
        segments: &[(f64, [u8; 3])],
    ) -> Self {
        let mut segments = segments.to_vec();
        segments.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::from_fn(width, height, duration_secs, move |t, _, _| {
            let [r, g, b] = segments
                .iter()
                .rev()
                .find(|(start, _)| *start <= t)
                .or(segments.first())
                .map(|(_, rgb)| *rgb)
                .unwrap_or([0, 0, 0]);
            Rgba([r, g, b, 255])
        })
    }

    /// A single unchanging color for the whole duration.
    pub fn still(width: u32, height: u32, duration_secs: f64, rgb: [u8; 3]) -> Self {
        Self::solid_segments(width, height, duration_secs, &[(0.0, rgb)])
    }

    /// Make [`VideoSource::load_metadata`] fail with `message`.
    pub fn with_metadata_error(mut self, message: impl Into<String>) -> Self {
        self.metadata_error = Some(message.into());
        self
    }

    /// Make every seek at or beyond `time_secs` fail.
    pub fn with_seek_error_at(mut self, time_secs: f64) -> Self {
        self.seek_error_at = Some(time_secs);
        self
    }

    /// Shared flag set once the source has been released.
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    /// Shared count of completed seeks.
    pub fn seek_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.seeks)
    }

    fn render(&self, time_secs: f64) -> RgbaImage {
        let VideoMetadata { width, height, .. } = self.metadata;
        RgbaImage::from_fn(width, height, |x, y| (self.pixel)(time_secs, x, y))
    }
}

#[async_trait::async_trait]
impl VideoSource for SyntheticVideo {
    async fn load_metadata(&mut self) -> FluxResult<VideoMetadata> {
        tokio::task::yield_now().await;
        if let Some(message) = &self.metadata_error {
            return Err(FluxError::media_load(message.clone()));
        }
        self.loaded = true;
        Ok(self.metadata)
    }

    async fn seek(&mut self, time_secs: f64) -> FluxResult<()> {
        if !self.loaded {
            return Err(FluxError::seek(time_secs, "metadata not loaded"));
        }
        if self.released.load(Ordering::SeqCst) {
            return Err(FluxError::seek(time_secs, "source already released"));
        }

        tokio::task::yield_now().await;

        if self.seek_error_at.is_some_and(|at| time_secs >= at) {
            return Err(FluxError::seek(time_secs, "injected decode failure"));
        }

        self.frame = Some(self.render(time_secs));
        self.current_time = time_secs;
        self.seeks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn current_frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    fn release(&mut self) {
        self.frame = None;
        self.released.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
