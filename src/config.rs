//! TOML configuration: normal vital ranges, routing thresholds and logging.
//!
//! Every section is optional; missing keys fall back to the compiled-in
//! clinical defaults. A configuration is immutable once a scorer or
//! dispatcher has been built from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::triage::Vital;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "VITALROUTE_CONFIG";

/// Configuration file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "vitalroute.toml";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {vital} range: max ({max}) must be greater than min ({min})")]
    InvalidRange { vital: Vital, min: f64, max: f64 },

    #[error("threshold `{name}` is not a finite number")]
    NonFiniteThreshold { name: &'static str },

    #[error("clamp range is empty: clamp_min ({min}) must be below clamp_max ({max})")]
    EmptyClamp { min: f64, max: f64 },

    #[error(
        "thresholds out of order: expected clamp_min ({clamp_min}) <= edge ({edge}) \
         <= alarm ({alarm}) <= clamp_max ({clamp_max})"
    )]
    ThresholdOrder {
        clamp_min: f64,
        edge: f64,
        alarm: f64,
        clamp_max: f64,
    },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub ranges: NormalRanges,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TriageConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded triage configuration");
        Ok(config)
    }

    /// Resolve the configuration, in order:
    /// 1. `explicit` (an error here is returned, not skipped).
    /// 2. The file named by `VITALROUTE_CONFIG`.
    /// 3. `./vitalroute.toml`.
    /// 4. Compiled-in defaults.
    ///
    /// The result is validated before it is returned.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            match Self::load(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "VITALROUTE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    /// Check ranges and thresholds. Any scorer built from a config that
    /// passes here can never divide by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for vital in Vital::ALL {
            let range = self.ranges.get(vital);
            if !(range.min.is_finite() && range.max.is_finite() && range.max > range.min) {
                return Err(ConfigError::InvalidRange {
                    vital,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        self.thresholds.validate()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// Normal range of one vital, `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalRange {
    pub min: f64,
    pub max: f64,
}

impl VitalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Normal ranges for a general adult patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalRanges {
    /// Beats per minute.
    pub heart_rate: VitalRange,
    /// mmHg.
    pub blood_pressure: VitalRange,
    /// mg/dL.
    pub glucose_level: VitalRange,
}

impl Default for NormalRanges {
    fn default() -> Self {
        Self {
            heart_rate: VitalRange::new(60.0, 100.0),
            blood_pressure: VitalRange::new(90.0, 120.0),
            glucose_level: VitalRange::new(70.0, 140.0),
        }
    }
}

impl NormalRanges {
    pub fn get(&self, vital: Vital) -> &VitalRange {
        match vital {
            Vital::HeartRate => &self.heart_rate,
            Vital::BloodPressure => &self.blood_pressure,
            Vital::GlucoseLevel => &self.glucose_level,
        }
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Routing thresholds and the priority clamp range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Priorities at or above this go to the edge queue.
    pub edge: f64,
    /// Priorities strictly above this raise an alarm.
    pub alarm: f64,
    pub clamp_min: f64,
    pub clamp_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            edge: 1.0,
            alarm: 1.5,
            clamp_min: 0.0,
            clamp_max: 2.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("edge", self.edge),
            ("alarm", self.alarm),
            ("clamp_min", self.clamp_min),
            ("clamp_max", self.clamp_max),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold { name });
            }
        }

        if self.clamp_min >= self.clamp_max {
            return Err(ConfigError::EmptyClamp {
                min: self.clamp_min,
                max: self.clamp_max,
            });
        }

        if !(self.clamp_min <= self.edge && self.edge <= self.alarm && self.alarm <= self.clamp_max)
        {
            return Err(ConfigError::ThresholdOrder {
                clamp_min: self.clamp_min,
                edge: self.edge,
                alarm: self.alarm,
                clamp_max: self.clamp_max,
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
