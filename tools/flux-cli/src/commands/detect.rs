//! Detect scene changes in a video file.

use std::path::PathBuf;

use flux_common::config::AppConfig;
use flux_common::timecode::{format_timestamp, secs_to_ms};
use flux_media_model::scene::Sensitivity;
use flux_scene_detect::{
    DetectionProgress, FfmpegVideo, ProgressCallback, SceneSegmenter, ThumbnailCapturer,
};

pub async fn run(
    config: &AppConfig,
    video: PathBuf,
    sensitivity: Option<String>,
    thumbnail_width: Option<u32>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !video.exists() {
        anyhow::bail!("Video not found: {}", video.display());
    }

    let sensitivity: Sensitivity = sensitivity
        .as_deref()
        .unwrap_or(config.detection.sensitivity.as_str())
        .parse()?;
    let thumbnails = ThumbnailCapturer::new(
        thumbnail_width.unwrap_or(config.detection.thumbnail_width),
        config.detection.thumbnail_quality,
    );

    println!(
        "Detecting scenes in {} (sensitivity: {sensitivity})",
        video.display()
    );

    let on_progress: ProgressCallback = Box::new(|p: DetectionProgress| {
        tracing::debug!(
            current = p.current_secs,
            total = p.total_secs,
            "Detection progress: {:.0}%",
            p.fraction() * 100.0
        );
    });

    let scenes = SceneSegmenter::new(sensitivity.preset())
        .with_thumbnails(thumbnails)
        .run(FfmpegVideo::new(&video), Some(on_progress))
        .await
        .map_err(|e| {
            if e.is_media_error() {
                anyhow::anyhow!("Could not decode {}: {e}", video.display())
            } else {
                anyhow::anyhow!("Scene detection failed: {e}")
            }
        })?;

    println!();
    println!("Scenes: {}", scenes.len());
    for scene in &scenes {
        println!(
            "  #{:<3} {:>8}  ({} ms)  confidence {}%",
            scene.id,
            format_timestamp(scene.timestamp),
            secs_to_ms(scene.timestamp),
            scene.confidence
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&scenes)?;
        std::fs::write(&path, json)?;
        println!();
        println!("Wrote scene list to {}", path.display());
    }

    Ok(())
}
