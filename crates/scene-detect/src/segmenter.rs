//! Scene segmenter: drives the sampler across a video and turns frame
//! differences into an ordered list of scene changes.

use std::path::Path;

use flux_common::error::{FluxError, FluxResult};
use flux_media_model::scene::{
    confidence_from_difference, DetectionOptions, SceneChange, SensitivityPreset,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::ffmpeg::ffmpeg_available;
use crate::backend::{FfmpegVideo, VideoSource};
use crate::comparator::frame_difference;
use crate::sampler::{comparison_raster, FrameSampler};
use crate::thumbnail::ThumbnailCapturer;

/// Minimum time between two reported scene changes.
pub const DEBOUNCE_SECS: f64 = 1.0;

/// Slack allowed when deciding whether the last sample still lies within
/// the video.
const TIME_EPSILON: f64 = 1e-9;

/// Progress callback for a detection run.
pub type ProgressCallback = Box<dyn Fn(DetectionProgress) + Send + Sync>;

/// Position of a running detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionProgress {
    /// Timestamp of the last processed sample.
    pub current_secs: f64,
    /// Video duration.
    pub total_secs: f64,
}

impl DetectionProgress {
    /// Progress in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_secs <= 0.0 {
            return 1.0;
        }
        (self.current_secs / self.total_secs).clamp(0.0, 1.0)
    }
}

/// Lifecycle of a [`SceneSegmenter`] run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorState {
    Uninitialized,
    MetadataLoaded { duration_secs: f64 },
    Sampling,
    Complete,
    Failed,
}

/// Threshold-and-debounce scene detector.
#[derive(Debug, Clone)]
pub struct SceneSegmenter {
    preset: SensitivityPreset,
    thumbnails: ThumbnailCapturer,
    debounce_secs: f64,
    state: DetectorState,
}

impl SceneSegmenter {
    pub fn new(preset: SensitivityPreset) -> Self {
        Self {
            preset,
            thumbnails: ThumbnailCapturer::default(),
            debounce_secs: DEBOUNCE_SECS,
            state: DetectorState::Uninitialized,
        }
    }

    pub fn with_options(options: &DetectionOptions) -> Self {
        Self::new(options.sensitivity.preset())
    }

    pub fn with_thumbnails(mut self, thumbnails: ThumbnailCapturer) -> Self {
        self.thumbnails = thumbnails;
        self
    }

    /// Override the debounce window. Must be finite and non-negative.
    pub fn with_debounce_secs(mut self, secs: f64) -> FluxResult<Self> {
        if !(secs.is_finite() && secs >= 0.0) {
            return Err(FluxError::invalid_argument(format!(
                "debounce window must be non-negative, got {secs}"
            )));
        }
        self.debounce_secs = secs;
        Ok(self)
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn preset(&self) -> SensitivityPreset {
        self.preset
    }

    /// Run detection over `source`, consuming it.
    ///
    /// The result is all-or-nothing: on any error the partial list is
    /// dropped, the state becomes [`DetectorState::Failed`], and the source
    /// has been released.
    pub async fn run<S: VideoSource>(
        &mut self,
        source: S,
        on_progress: Option<ProgressCallback>,
    ) -> FluxResult<Vec<SceneChange>> {
        self.transition(DetectorState::Uninitialized);
        tracing::info!(
            backend = source.name(),
            threshold = self.preset.threshold(),
            interval = self.preset.sample_interval_secs(),
            "Starting scene detection"
        );

        match self.detect(source, on_progress.as_ref()).await {
            Ok(scenes) => {
                self.transition(DetectorState::Complete);
                tracing::info!(scenes = scenes.len(), "Scene detection complete");
                Ok(scenes)
            }
            Err(e) => {
                self.transition(DetectorState::Failed);
                tracing::warn!(error = %e, "Scene detection failed");
                Err(e)
            }
        }
    }

    async fn detect<S: VideoSource>(
        &mut self,
        source: S,
        on_progress: Option<&ProgressCallback>,
    ) -> FluxResult<Vec<SceneChange>> {
        let mut sampler = FrameSampler::open(source).await?;
        let duration = sampler.duration_secs();
        self.transition(DetectorState::MetadataLoaded {
            duration_secs: duration,
        });

        let thumbnails = self.thumbnails;
        let threshold = self.preset.threshold();
        let interval = self.preset.sample_interval_secs();

        let opening = thumbnails.capture(&mut sampler, 0.0).await?;
        let mut scenes = vec![SceneChange::opening(opening)];

        if duration < interval {
            tracing::debug!(duration, interval, "Video shorter than one sample interval");
            sampler.release();
            report(on_progress, duration, duration);
            return Ok(scenes);
        }

        self.transition(DetectorState::Sampling);

        let mut previous = comparison_raster();
        let mut current = comparison_raster();
        sampler.sample(0.0, &mut previous).await?;

        let mut last_scene = 0.0;
        for k in 1u64.. {
            let t_k = k as f64 * interval;
            if t_k > duration + TIME_EPSILON {
                break;
            }
            let t = t_k.min(duration);

            sampler.sample(t, &mut current).await?;
            let difference = frame_difference(&previous, &current)?;

            if difference >= threshold && t - last_scene >= self.debounce_secs {
                let thumbnail_url = thumbnails.capture(&mut sampler, t).await?;
                let scene = SceneChange {
                    id: scenes.len().to_string(),
                    timestamp: t,
                    thumbnail_url,
                    confidence: confidence_from_difference(difference),
                };
                tracing::debug!(
                    id = %scene.id,
                    timestamp = t,
                    difference,
                    "Scene change"
                );
                scenes.push(scene);
                last_scene = t;
            }

            std::mem::swap(&mut previous, &mut current);
            report(on_progress, t, duration);
        }

        sampler.release();
        report(on_progress, duration, duration);
        Ok(scenes)
    }

    fn transition(&mut self, next: DetectorState) {
        tracing::debug!(from = ?self.state, to = ?next, "Detector state");
        self.state = next;
    }
}

fn report(on_progress: Option<&ProgressCallback>, current_secs: f64, total_secs: f64) {
    if let Some(cb) = on_progress {
        cb(DetectionProgress {
            current_secs,
            total_secs,
        });
    }
}

/// Detect scene changes in `source` with the preset for `options`.
pub async fn detect_scene_changes<S: VideoSource>(
    source: S,
    options: &DetectionOptions,
    on_progress: Option<ProgressCallback>,
) -> FluxResult<Vec<SceneChange>> {
    SceneSegmenter::with_options(options)
        .run(source, on_progress)
        .await
}

/// Detect scene changes in a video file, decoded with ffmpeg.
///
/// Fails with [`FluxError::Unsupported`] when `ffmpeg`/`ffprobe` are not
/// on `PATH`.
pub async fn detect_scene_changes_in_file(
    path: impl AsRef<Path>,
    options: &DetectionOptions,
    on_progress: Option<ProgressCallback>,
) -> FluxResult<Vec<SceneChange>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FluxError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !ffmpeg_available() {
        return Err(FluxError::unsupported(
            "decoding video files requires ffmpeg and ffprobe on PATH",
        ));
    }
    detect_scene_changes(FfmpegVideo::new(path), options, on_progress).await
}

/// Run detection on a tokio task, streaming progress over a channel.
///
/// The receiver closes once the run has finished.
pub fn spawn_scene_detection<S>(
    source: S,
    options: DetectionOptions,
) -> (
    JoinHandle<FluxResult<Vec<SceneChange>>>,
    mpsc::UnboundedReceiver<DetectionProgress>,
)
where
    S: VideoSource + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        let on_progress: ProgressCallback = Box::new(move |progress| {
            let _ = tx.send(progress);
        });
        detect_scene_changes(source, &options, Some(on_progress)).await
    });
    (handle, rx)
}
