//! Error types shared across Flux crates.

use std::path::PathBuf;

/// Top-level error type for Flux operations.
///
/// Every variant is terminal for the operation that raised it: nothing in
/// the workspace retries on error.
#[derive(Debug, thiserror::Error)]
pub enum FluxError {
    /// The video container could not be opened or its metadata read.
    #[error("Failed to load video: {message}")]
    MediaLoad { message: String },

    /// A pixel surface could not be allocated or drawn into.
    #[error("Failed to create canvas context: {message}")]
    CanvasContext { message: String },

    #[error("Seek to {time_secs:.3}s failed: {message}")]
    Seek { time_secs: f64, message: String },

    #[error("Raster dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Encoding error: {message}")]
    Encode { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using FluxError.
pub type FluxResult<T> = Result<T, FluxError>;

impl FluxError {
    pub fn media_load(msg: impl Into<String>) -> Self {
        Self::MediaLoad {
            message: msg.into(),
        }
    }

    pub fn canvas_context(msg: impl Into<String>) -> Self {
        Self::CanvasContext {
            message: msg.into(),
        }
    }

    pub fn seek(time_secs: f64, msg: impl Into<String>) -> Self {
        Self::Seek {
            time_secs,
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error means the media itself was unusable, as opposed
    /// to a failure in the host environment.
    pub fn is_media_error(&self) -> bool {
        matches!(self, Self::MediaLoad { .. } | Self::Seek { .. })
    }
}
