use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flux_common::error::FluxError;
use flux_media_model::scene::{DetectionOptions, SceneChange, Sensitivity};
use flux_scene_detect::{
    detect_scene_changes, spawn_scene_detection, DetectionProgress, DetectorState,
    ProgressCallback, SceneSegmenter, SyntheticVideo, DEBOUNCE_SECS,
};
use image::Rgba;

const BLACK: [u8; 3] = [0, 0, 0];
const WHITE: [u8; 3] = [255, 255, 255];

fn options(sensitivity: Sensitivity) -> DetectionOptions {
    DetectionOptions::new(sensitivity)
}

fn gray(v: u8) -> [u8; 3] {
    [v, v, v]
}

/// Gray steps of 15.7%, 7.8%, 31.4% and 11.8% difference, three seconds apart.
fn stepped_video() -> SyntheticVideo {
    SyntheticVideo::solid_segments(
        64,
        48,
        15.0,
        &[
            (0.0, gray(100)),
            (3.0, gray(140)),
            (6.0, gray(120)),
            (9.0, gray(200)),
            (12.0, gray(170)),
        ],
    )
}

fn assert_well_formed(scenes: &[SceneChange]) {
    let first = scenes.first().expect("at least the opening scene");
    assert_eq!(first.timestamp, 0.0);
    assert_eq!(first.confidence, 100);

    for (i, scene) in scenes.iter().enumerate() {
        assert_eq!(scene.id, i.to_string());
        assert!(scene.confidence <= 100);
        assert!(scene.thumbnail_url.starts_with("data:image/jpeg;base64,"));
    }
    for pair in scenes.windows(2) {
        assert!(pair[1].timestamp > pair[0].timestamp);
        assert!(pair[1].timestamp - pair[0].timestamp >= DEBOUNCE_SECS);
    }
}

#[tokio::test]
async fn black_to_white_cut_is_found_at_medium() {
    let video = SyntheticVideo::solid_segments(160, 120, 4.0, &[(0.0, BLACK), (2.0, WHITE)]);
    let scenes = detect_scene_changes(video, &options(Sensitivity::Medium), None)
        .await
        .unwrap();

    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].timestamp, 0.0);
    assert!((scenes[1].timestamp - 2.0).abs() < 1e-9);
    assert_eq!(scenes[1].confidence, 100);
    assert_well_formed(&scenes);
}

#[tokio::test]
async fn cut_is_found_when_frames_need_resizing() {
    let video = SyntheticVideo::solid_segments(320, 240, 4.0, &[(0.0, BLACK), (2.0, WHITE)]);
    let scenes = detect_scene_changes(video, &options(Sensitivity::Medium), None)
        .await
        .unwrap();
    let timestamps: Vec<f64> = scenes.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0.0, 2.0]);
}

#[tokio::test]
async fn static_video_has_only_the_opening_scene() {
    for sensitivity in Sensitivity::ALL {
        let video = SyntheticVideo::still(64, 48, 10.0, [30, 90, 150]);
        let scenes = detect_scene_changes(video, &options(sensitivity), None)
            .await
            .unwrap();
        assert_eq!(scenes.len(), 1, "sensitivity {sensitivity}");
        assert_well_formed(&scenes);
    }
}

#[tokio::test]
async fn clip_shorter_than_interval_yields_one_scene() {
    let video = SyntheticVideo::solid_segments(64, 48, 0.4, &[(0.0, BLACK), (0.2, WHITE)]);
    let seeks = video.seek_counter();
    let released = video.release_flag();

    let scenes = detect_scene_changes(video, &options(Sensitivity::Low), None)
        .await
        .unwrap();

    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].confidence, 100);
    assert_eq!(seeks.load(Ordering::SeqCst), 1);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn higher_sensitivity_finds_more_scenes() {
    let mut counts = Vec::new();
    for sensitivity in [Sensitivity::High, Sensitivity::Medium, Sensitivity::Low] {
        let scenes = detect_scene_changes(stepped_video(), &options(sensitivity), None)
            .await
            .unwrap();
        assert_well_formed(&scenes);
        counts.push(scenes.len());
    }
    assert_eq!(counts, vec![4, 3, 2]);
}

#[tokio::test]
async fn flicker_is_debounced() {
    // Pseudo-random brightness every 0.1s: almost every sample crosses the
    // threshold, so only the debounce window limits the output.
    let video = SyntheticVideo::from_fn(32, 24, 12.0, |t, _, _| {
        let step = (t * 10.0).floor() as u64;
        let v = (step.wrapping_mul(2654435761) >> 7) as u8;
        Rgba([v, 255 - v, v / 2, 255])
    });

    let scenes = detect_scene_changes(video, &options(Sensitivity::High), None)
        .await
        .unwrap();
    assert!(scenes.len() > 1);
    assert!(scenes.len() <= 13);
    assert_well_formed(&scenes);
}

#[tokio::test]
async fn seek_failure_aborts_and_releases() {
    flux_common::logging::init_default_logging();

    let video = SyntheticVideo::solid_segments(64, 48, 6.0, &[(0.0, BLACK), (2.0, WHITE)])
        .with_seek_error_at(4.0);
    let released = video.release_flag();

    let mut segmenter = SceneSegmenter::with_options(&options(Sensitivity::Medium));
    let result = segmenter.run(video, None).await;

    assert!(matches!(result, Err(FluxError::Seek { .. })));
    assert_eq!(segmenter.state(), DetectorState::Failed);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn unreadable_media_is_a_load_error() {
    let video = SyntheticVideo::still(64, 48, 5.0, BLACK).with_metadata_error("moov atom not found");
    let released = video.release_flag();

    let err = detect_scene_changes(video, &options(Sensitivity::Medium), None)
        .await
        .unwrap_err();

    assert!(matches!(err, FluxError::MediaLoad { .. }));
    assert_eq!(err.to_string(), "Failed to load video: moov atom not found");
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_at_duration() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let on_progress: ProgressCallback = Box::new(move |p: DetectionProgress| {
        sink.lock().unwrap().push(p);
    });

    let video = SyntheticVideo::still(32, 24, 5.0, BLACK);
    detect_scene_changes(video, &options(Sensitivity::Low), Some(on_progress))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let positions: Vec<f64> = seen.iter().map(|p| p.current_secs).collect();
    assert_eq!(positions, vec![1.0, 2.0, 3.0, 4.0, 5.0, 5.0]);
    assert!(seen.iter().all(|p| p.total_secs == 5.0));
    let last = seen.last().unwrap();
    assert_eq!(last.current_secs, 5.0);
    assert_eq!(last.total_secs, 5.0);
    assert_eq!(last.fraction(), 1.0);
}

#[tokio::test]
async fn thumbnail_keeps_aspect_ratio() {
    let video = SyntheticVideo::still(640, 480, 1.0, [200, 10, 10]);
    let scenes = detect_scene_changes(video, &options(Sensitivity::Medium), None)
        .await
        .unwrap();

    let payload = scenes[0]
        .thumbnail_url
        .strip_prefix("data:image/jpeg;base64,")
        .unwrap();
    let thumbnail = image::load_from_memory(&STANDARD.decode(payload).unwrap()).unwrap();
    assert_eq!((thumbnail.width(), thumbnail.height()), (320, 240));
}

#[tokio::test]
async fn spawned_run_streams_progress() {
    let video = SyntheticVideo::solid_segments(64, 48, 4.0, &[(0.0, BLACK), (2.0, WHITE)]);
    let (handle, mut progress) = spawn_scene_detection(video, options(Sensitivity::Medium));

    let mut updates = Vec::new();
    while let Some(p) = progress.recv().await {
        updates.push(p);
    }
    let scenes = handle.await.unwrap().unwrap();

    assert_eq!(scenes.len(), 2);
    assert_eq!(updates.last().map(|p| p.current_secs), Some(4.0));
}
