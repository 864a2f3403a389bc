//! Scene detection contracts.
//!
//! A detection run is parameterized by a [`Sensitivity`], which resolves to a
//! [`SensitivityPreset`] (difference threshold + sample interval), and
//! produces an ordered list of [`SceneChange`] records.

use std::fmt;
use std::str::FromStr;

use flux_common::error::{FluxError, FluxResult};
use serde::{Deserialize, Serialize};

/// Named detection sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// All sensitivities, least to most sensitive.
    pub const ALL: [Sensitivity; 3] = [Sensitivity::Low, Sensitivity::Medium, Sensitivity::High];

    /// The canonical preset for this sensitivity.
    pub fn preset(self) -> SensitivityPreset {
        match self {
            Sensitivity::High => SensitivityPreset::HIGH,
            Sensitivity::Medium => SensitivityPreset::MEDIUM,
            Sensitivity::Low => SensitivityPreset::LOW,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensitivity {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            other => Err(FluxError::invalid_argument(format!(
                "Unknown sensitivity: {other}. Use: low, medium, high"
            ))),
        }
    }
}

/// Difference threshold and sampling interval for one detection run.
///
/// `threshold` is a percentage in `[0, 100]`; `sample_interval_secs` is
/// strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPreset {
    threshold: f64,
    sample_interval_secs: f64,
}

impl SensitivityPreset {
    pub const HIGH: SensitivityPreset = SensitivityPreset {
        threshold: 8.0,
        sample_interval_secs: 0.3,
    };

    pub const MEDIUM: SensitivityPreset = SensitivityPreset {
        threshold: 15.0,
        sample_interval_secs: 0.5,
    };

    pub const LOW: SensitivityPreset = SensitivityPreset {
        threshold: 25.0,
        sample_interval_secs: 1.0,
    };

    /// Build a custom preset, validating both bounds.
    pub fn new(threshold: f64, sample_interval_secs: f64) -> FluxResult<Self> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(FluxError::invalid_argument(format!(
                "threshold must be within [0, 100], got {threshold}"
            )));
        }
        if !(sample_interval_secs.is_finite() && sample_interval_secs > 0.0) {
            return Err(FluxError::invalid_argument(format!(
                "sample interval must be positive, got {sample_interval_secs}"
            )));
        }
        Ok(Self {
            threshold,
            sample_interval_secs,
        })
    }

    /// Minimum percentage difference that marks a scene change.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Seconds between consecutive samples.
    pub fn sample_interval_secs(&self) -> f64 {
        self.sample_interval_secs
    }
}

impl From<Sensitivity> for SensitivityPreset {
    fn from(value: Sensitivity) -> Self {
        value.preset()
    }
}

/// Options accepted by a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectionOptions {
    pub sensitivity: Sensitivity,
}

impl DetectionOptions {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self { sensitivity }
    }
}

/// A detected scene boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneChange {
    /// Sequential index as a string, starting at "0".
    pub id: String,

    /// Seconds from the start of the video.
    pub timestamp: f64,

    /// Encoded preview image (`data:` URL).
    pub thumbnail_url: String,

    /// How strongly the frame differed from the previous sample, 0-100.
    pub confidence: u8,
}

impl SceneChange {
    /// The mandatory boundary at the start of every video.
    pub fn opening(thumbnail_url: String) -> Self {
        Self {
            id: "0".to_string(),
            timestamp: 0.0,
            thumbnail_url,
            confidence: 100,
        }
    }
}

/// Confidence for a raw percentage difference: rounded and capped at 100.
pub fn confidence_from_difference(difference: f64) -> u8 {
    difference.clamp(0.0, 100.0).round() as u8
}
