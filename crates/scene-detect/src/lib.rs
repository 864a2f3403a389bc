//! Flux Scene Detect
//!
//! Finds the timestamps where a video's picture changes. The video is
//! sampled at a fixed interval; each sample is shrunk to a 160×120
//! comparison raster and compared with the previous sample.
//!
//! # Pipeline Architecture
//!
//! ```text
//! VideoSource ── seek(t) ──┐
//!                          ├── FrameSampler ── 160×120 raster
//!                          │                        │
//!                          │                        ├── frame_difference(prev, cur)
//!                          │                        │
//!                          │             threshold + 1s debounce
//!                          │                        │
//!                          └── ThumbnailCapturer ◀──┘ (scene boundaries only)
//!                                                   │
//!                                                   ▼
//!                                            Vec<SceneChange>
//! ```
//!
//! Runs are strictly sequential: every comparison depends on the raster of
//! the sample before it, and a source decodes one position at a time.

pub mod backend;
pub mod comparator;
pub mod sampler;
pub mod segmenter;
pub mod thumbnail;

pub use backend::{FfmpegVideo, SyntheticVideo, VideoMetadata, VideoSource};
pub use comparator::frame_difference;
pub use sampler::FrameSampler;
pub use segmenter::*;
pub use thumbnail::ThumbnailCapturer;
