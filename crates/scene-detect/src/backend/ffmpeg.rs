//! Video source backed by the `ffprobe` and `ffmpeg` binaries.
//!
//! Metadata comes from one `ffprobe` call. Every seek runs `ffmpeg` to
//! decode a single frame at the requested time as raw RGBA on stdout.

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use flux_common::error::{FluxError, FluxResult};
use image::RgbaImage;
use serde::Deserialize;
use tokio::process::Command;

use super::{VideoMetadata, VideoSource};

const FALLBACK_FPS: f64 = 30.0;

/// A video file decoded through ffmpeg subprocesses.
#[derive(Debug)]
pub struct FfmpegVideo {
    path: PathBuf,
    metadata: Option<VideoMetadata>,
    frame_interval_secs: f64,
    current_time: f64,
    frame: Option<RgbaImage>,
    released: bool,
}

impl FfmpegVideo {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            metadata: None,
            frame_interval_secs: 1.0 / FALLBACK_FPS,
            current_time: 0.0,
            frame: None,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ffmpeg yields nothing when asked for a frame exactly at the end of
    /// the stream, so seeks aim no later than one frame before it.
    fn decode_position(&self, time_secs: f64, duration_secs: f64) -> f64 {
        time_secs
            .min(duration_secs - self.frame_interval_secs)
            .max(0.0)
    }
}

#[async_trait::async_trait]
impl VideoSource for FfmpegVideo {
    async fn load_metadata(&mut self) -> FluxResult<VideoMetadata> {
        if !self.path.exists() {
            return Err(FluxError::media_load(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,avg_frame_rate:stream_side_data=rotation:stream_tags=rotate:format=duration",
                "-of",
                "json",
            ])
            .arg(&self.path)
            .output()
            .await
            .map_err(|e| FluxError::media_load(format!("failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FluxError::media_load(format!(
                "ffprobe rejected {}: {}",
                self.path.display(),
                stderr.trim()
            )));
        }

        let (metadata, fps) = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        self.frame_interval_secs = 1.0 / fps;
        self.metadata = Some(metadata);

        tracing::debug!(
            path = %self.path.display(),
            duration = metadata.duration_secs,
            width = metadata.width,
            height = metadata.height,
            fps,
            "Probed video"
        );
        Ok(metadata)
    }

    async fn seek(&mut self, time_secs: f64) -> FluxResult<()> {
        if self.released {
            return Err(FluxError::seek(time_secs, "source already released"));
        }
        let metadata = self
            .metadata
            .ok_or_else(|| FluxError::seek(time_secs, "metadata not loaded"))?;
        let position = self.decode_position(time_secs, metadata.duration_secs);

        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-ss"])
            .arg(format!("{position:.3}"))
            .arg("-i")
            .arg(&self.path)
            .args([
                "-an", "-sn", "-dn", "-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba",
            ])
            // Display size: autorotation has already been applied here.
            .arg("-s")
            .arg(format!("{}x{}", metadata.width, metadata.height))
            .arg("-")
            .output()
            .await
            .map_err(|e| FluxError::seek(time_secs, format!("failed to run ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FluxError::seek(time_secs, stderr.trim().to_string()));
        }

        let expected = metadata.width as usize * metadata.height as usize * 4;
        if output.stdout.len() != expected {
            return Err(FluxError::seek(
                time_secs,
                format!(
                    "decoder produced {} bytes, expected {expected}",
                    output.stdout.len()
                ),
            ));
        }

        let frame = RgbaImage::from_raw(metadata.width, metadata.height, output.stdout)
            .ok_or_else(|| FluxError::seek(time_secs, "frame buffer size mismatch"))?;
        self.frame = Some(frame);
        self.current_time = time_secs;
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
        self.released = true;
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

impl ProbeStream {
    /// Display rotation in degrees. The display matrix wins over the
    /// legacy `rotate` tag.
    fn rotation_degrees(&self) -> f64 {
        self.side_data_list
            .iter()
            .find_map(|d| d.rotation)
            .or_else(|| {
                self.tags
                    .rotate
                    .as_deref()
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0)
    }

    /// Whether frames are displayed on their side, so the display size is
    /// the coded size transposed.
    fn is_quarter_turn(&self) -> bool {
        (self.rotation_degrees().round() as i64).rem_euclid(180) == 90
    }
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -of json` output into metadata and a frame rate.
fn parse_probe_output(json: &str) -> FluxResult<(VideoMetadata, f64)> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| FluxError::media_load(format!("unreadable ffprobe output: {e}")))?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| FluxError::media_load("no video stream found"))?;

    // ffprobe reports the coded size; ffmpeg autorotates on decode, so the
    // frames we receive have the display size.
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 && stream.is_quarter_turn() => (h, w),
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(FluxError::media_load("video stream has no dimensions")),
    };

    let duration_secs = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| FluxError::media_load("video duration is unknown"))?;

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(FALLBACK_FPS);

    Ok((
        VideoMetadata {
            duration_secs,
            width,
            height,
        },
        fps,
    ))
}

/// Parse an ffprobe rational such as `30000/1001`.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num = num.trim().parse::<f64>().ok()?;
    let den = den.trim().parse::<f64>().ok()?;
    if num <= 0.0 || den <= 0.0 {
        return None;
    }
    Some(num / den)
}

/// Whether a binary is reachable on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    StdCommand::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Whether both `ffmpeg` and `ffprobe` are installed.
pub fn ffmpeg_available() -> bool {
    command_exists("ffmpeg") && command_exists("ffprobe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe_json() {
        let json = r#"{
            "programs": [],
            "streams": [{ "width": 1280, "height": 720, "avg_frame_rate": "30000/1001" }],
            "format": { "duration": "12.345000" }
        }"#;
        let (meta, fps) = parse_probe_output(json).unwrap();
        assert_eq!(meta.width, 1280);
        assert_eq!(meta.height, 720);
        assert!((meta.duration_secs - 12.345).abs() < 1e-9);
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn rotated_stream_reports_display_size() {
        let json = r#"{
            "streams": [{
                "width": 1920, "height": 1080, "avg_frame_rate": "30/1",
                "side_data_list": [{ "side_data_type": "Display Matrix", "rotation": -90 }]
            }],
            "format": { "duration": "4.0" }
        }"#;
        let (meta, _) = parse_probe_output(json).unwrap();
        assert_eq!((meta.width, meta.height), (1080, 1920));
        assert_eq!(meta.height_for_width(320), 569);
    }

    #[test]
    fn legacy_rotate_tag_is_honoured() {
        let json = r#"{
            "streams": [{ "width": 1280, "height": 720, "tags": { "rotate": "270" } }],
            "format": { "duration": "2.0" }
        }"#;
        let (meta, _) = parse_probe_output(json).unwrap();
        assert_eq!((meta.width, meta.height), (720, 1280));

        let upside_down = r#"{
            "streams": [{ "width": 1280, "height": 720,
                          "side_data_list": [{ "rotation": 180 }] }],
            "format": { "duration": "2.0" }
        }"#;
        let (meta, _) = parse_probe_output(upside_down).unwrap();
        assert_eq!((meta.width, meta.height), (1280, 720));
    }

    #[test]
    fn missing_stream_is_media_error() {
        let err = parse_probe_output(r#"{ "streams": [], "format": { "duration": "1.0" } }"#)
            .unwrap_err();
        assert!(matches!(err, FluxError::MediaLoad { .. }));
    }

    #[test]
    fn missing_duration_is_media_error() {
        let json = r#"{ "streams": [{ "width": 2, "height": 2 }], "format": {} }"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(FluxError::MediaLoad { .. })
        ));
    }

    #[test]
    fn unknown_frame_rate_falls_back() {
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("garbage"), None);

        let json = r#"{ "streams": [{ "width": 2, "height": 2, "avg_frame_rate": "0/0" }],
                        "format": { "duration": "3" } }"#;
        let (_, fps) = parse_probe_output(json).unwrap();
        assert_eq!(fps, FALLBACK_FPS);
    }

    #[test]
    fn decode_position_stays_inside_stream() {
        let video = FfmpegVideo::new("clip.mp4");
        assert!((video.decode_position(10.0, 10.0) - (10.0 - 1.0 / 30.0)).abs() < 1e-9);
        assert_eq!(video.decode_position(2.0, 10.0), 2.0);
        assert_eq!(video.decode_position(0.0, 0.01), 0.0);
    }

    #[tokio::test]
    async fn missing_file_fails_metadata() {
        let mut video = FfmpegVideo::new("/definitely/not/here.mp4");
        assert!(matches!(
            video.load_metadata().await,
            Err(FluxError::MediaLoad { .. })
        ));
    }
}
