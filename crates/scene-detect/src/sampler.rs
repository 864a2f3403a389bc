//! Frame sampler: owns a [`VideoSource`] and rasterizes its frames into
//! caller-provided surfaces.

use flux_common::error::{FluxError, FluxResult};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::backend::{VideoMetadata, VideoSource};

/// Width of the raster used for frame comparison.
pub const COMPARISON_WIDTH: u32 = 160;
/// Height of the raster used for frame comparison.
pub const COMPARISON_HEIGHT: u32 = 120;

/// A blank raster at comparison resolution.
pub fn comparison_raster() -> RgbaImage {
    RgbaImage::new(COMPARISON_WIDTH, COMPARISON_HEIGHT)
}

/// Exclusive owner of a video source for the length of one run.
///
/// The source is released by [`FrameSampler::release`], or on drop if the
/// sampler goes away first (error paths, cancelled futures).
pub struct FrameSampler<S: VideoSource> {
    source: S,
    metadata: VideoMetadata,
    released: bool,
}

impl<S: VideoSource> FrameSampler<S> {
    /// Acquire `source` and load its metadata.
    ///
    /// On failure the source is released before the error is returned.
    pub async fn open(mut source: S) -> FluxResult<Self> {
        let metadata = match source.load_metadata().await {
            Ok(metadata) => metadata,
            Err(e @ FluxError::MediaLoad { .. }) => {
                source.release();
                return Err(e);
            }
            Err(other) => {
                source.release();
                return Err(FluxError::media_load(other.to_string()));
            }
        };

        if !(metadata.duration_secs.is_finite() && metadata.duration_secs >= 0.0) {
            source.release();
            return Err(FluxError::media_load(format!(
                "invalid duration {}",
                metadata.duration_secs
            )));
        }
        if metadata.width == 0 || metadata.height == 0 {
            source.release();
            return Err(FluxError::media_load(format!(
                "invalid frame size {}x{}",
                metadata.width, metadata.height
            )));
        }

        tracing::debug!(
            backend = source.name(),
            duration = metadata.duration_secs,
            width = metadata.width,
            height = metadata.height,
            "Video source opened"
        );

        Ok(Self {
            source,
            metadata,
            released: false,
        })
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn duration_secs(&self) -> f64 {
        self.metadata.duration_secs
    }

    pub fn current_time(&self) -> f64 {
        self.source.current_time()
    }

    /// Whether a frame has been decoded since the source was opened.
    pub fn has_frame(&self) -> bool {
        self.source.current_frame().is_some()
    }

    /// Move the source to `time_secs`, which must lie within the video.
    pub async fn seek(&mut self, time_secs: f64) -> FluxResult<()> {
        if self.released {
            return Err(FluxError::seek(time_secs, "sampler already released"));
        }
        if !(0.0..=self.metadata.duration_secs).contains(&time_secs) {
            return Err(FluxError::invalid_argument(format!(
                "timestamp {time_secs} outside [0, {}]",
                self.metadata.duration_secs
            )));
        }
        self.source.seek(time_secs).await
    }

    /// Stretch the current frame onto `surface` at the surface's size.
    pub fn draw_frame(&self, surface: &mut RgbaImage) -> FluxResult<()> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(FluxError::canvas_context(format!(
                "cannot draw into a {width}x{height} surface"
            )));
        }

        let frame = self.source.current_frame().ok_or_else(|| {
            FluxError::seek(self.source.current_time(), "no frame has been decoded")
        })?;

        if frame.dimensions() == (width, height) {
            surface.clone_from(frame);
        } else {
            *surface = imageops::resize(frame, width, height, FilterType::Triangle);
        }
        Ok(())
    }

    /// Seek to `time_secs` and draw the frame found there.
    pub async fn sample(&mut self, time_secs: f64, surface: &mut RgbaImage) -> FluxResult<()> {
        self.seek(time_secs).await?;
        self.draw_frame(surface)
    }

    /// Release the source now.
    pub fn release(mut self) {
        self.release_source();
    }

    fn release_source(&mut self) {
        if !self.released {
            self.source.release();
            self.released = true;
            tracing::debug!(backend = self.source.name(), "Video source released");
        }
    }
}

impl<S: VideoSource> Drop for FrameSampler<S> {
    fn drop(&mut self) {
        self.release_source();
    }
}
