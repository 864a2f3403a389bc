//! Flux Common Utilities
//!
//! Shared infrastructure for all Flux crates:
//! - Error types and result aliases
//! - Timecode formatting for scene timelines
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;
