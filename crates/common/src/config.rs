//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FluxError, FluxResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scene detection defaults.
    pub detection: DetectionDefaults,

    /// Watermark eraser defaults.
    pub watermark: WatermarkDefaults,

    /// Background remover defaults.
    pub background: BackgroundDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default scene detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionDefaults {
    /// Sensitivity preset name: "low", "medium" or "high".
    pub sensitivity: String,

    /// Width of scene thumbnails in pixels.
    pub thumbnail_width: u32,

    /// JPEG quality of scene thumbnails (1-100).
    pub thumbnail_quality: u8,
}

/// Default watermark eraser parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkDefaults {
    /// Render scale the pages were rasterized at.
    pub scale: f64,
}

/// Default background remover parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundDefaults {
    /// Color distance tolerance in percent (0-100).
    pub tolerance: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flux_scene_detect=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detection: DetectionDefaults::default(),
            watermark: WatermarkDefaults::default(),
            background: BackgroundDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DetectionDefaults {
    fn default() -> Self {
        Self {
            sensitivity: "medium".to_string(),
            thumbnail_width: 320,
            thumbnail_quality: 80,
        }
    }
}

impl Default for WatermarkDefaults {
    fn default() -> Self {
        Self { scale: 2.0 }
    }
}

impl Default for BackgroundDefaults {
    fn default() -> Self {
        Self { tolerance: 30.0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> FluxResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| FluxError::config(format!("{}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> FluxResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> FluxResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("flux-utility").join("config.json")
}
