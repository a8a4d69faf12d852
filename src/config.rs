//! Analysis configuration.
//!
//! One TOML file describes a full run: where the calibration and I–V datasets
//! live and how each junction is fitted. Every field has a default, so an
//! empty file (or no file at all) reproduces the standard lab setup:
//!
//! ```toml
//! calibration = "data/calibrationData.txt"
//!
//! [germanium]
//! data = "data/GeI-VData.txt"
//! x_range = { lo = 150.0, hi = 400.0 }
//!
//! [silicon]
//! data = "data/SiI-VData.txt"
//! x_range = { lo = 350.0, hi = 750.0 }
//! bounds.slope = { min = 0.0 }
//! ```
//!
//! A junction section that is present replaces that junction's defaults as a
//! whole: `data` is required and unspecified fit settings fall back to the
//! generic [`FitConfig`] defaults (full range, no bounds).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bound, FitConfig, Junction, Parameter};
use crate::error::AppError;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {message}")]
    Io { path: PathBuf, message: String },
    #[error("Invalid config TOML: {0}")]
    Parse(String),
    #[error("Invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, err.to_string())
    }
}

/// Dataset and fit settings for one junction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionConfig {
    /// Four-column I–V data file (`V I σV σI`, see `io::ingest`).
    pub data: PathBuf,
    #[serde(flatten)]
    pub fit: FitConfig,
}

impl JunctionConfig {
    pub fn default_for(junction: Junction) -> Self {
        match junction {
            Junction::Germanium => Self {
                data: PathBuf::from("data/GeI-VData.txt"),
                fit: FitConfig::default().with_range(150.0, 400.0),
            },
            Junction::Silicon => Self {
                data: PathBuf::from("data/SiI-VData.txt"),
                fit: FitConfig::default()
                    .with_range(350.0, 750.0)
                    .with_bound(Parameter::Slope, Bound::at_least(0.0)),
            },
        }
    }
}

fn default_calibration() -> PathBuf {
    PathBuf::from("data/calibrationData.txt")
}

fn default_germanium() -> JunctionConfig {
    JunctionConfig::default_for(Junction::Germanium)
}

fn default_silicon() -> JunctionConfig {
    JunctionConfig::default_for(Junction::Silicon)
}

/// A full run's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Three-column calibration file (`x y σy`).
    #[serde(default = "default_calibration")]
    pub calibration: PathBuf,

    /// Junction temperature; when set, the ideality factor is reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_kelvin: Option<f64>,

    #[serde(default = "default_germanium")]
    pub germanium: JunctionConfig,

    #[serde(default = "default_silicon")]
    pub silicon: JunctionConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            calibration: default_calibration(),
            temperature_kelvin: None,
            germanium: default_germanium(),
            silicon: default_silicon(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from file and validate.
    pub fn load_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn junction(&self, junction: Junction) -> &JunctionConfig {
        match junction {
            Junction::Germanium => &self.germanium,
            Junction::Silicon => &self.silicon,
        }
    }

    pub fn junction_mut(&mut self, junction: Junction) -> &mut JunctionConfig {
        match junction {
            Junction::Germanium => &mut self.germanium,
            Junction::Silicon => &mut self.silicon,
        }
    }

    /// Collect every problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.calibration.as_os_str().is_empty() {
            errors.push("calibration path cannot be empty".to_string());
        }
        if let Some(t) = self.temperature_kelvin {
            if !(t.is_finite() && t > 0.0) {
                errors.push(format!("temperature_kelvin must be > 0, got {t}"));
            }
        }
        for junction in Junction::ALL {
            let cfg = self.junction(junction);
            let name = junction.display_name().to_lowercase();
            if cfg.data.as_os_str().is_empty() {
                errors.push(format!("{name}.data cannot be empty"));
            }
            if let Err(e) = cfg.fit.validate() {
                errors.push(format!("{name}: {e}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}
