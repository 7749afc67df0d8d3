//! Analysis configuration with TOML persistence

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Complete analysis configuration, one table per pipeline stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hill detection thresholds
    pub hills: HillFinderConfig,

    /// Power cleaning and interval detection thresholds
    pub intervals: IntervalFinderConfig,

    /// Ride classification thresholds
    pub classifier: ClassifierConfig,
}

/// Hill detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillFinderConfig {
    /// Max length in meters of a flat or reversed stretch still counted as part of a hill
    pub false_flat_distance: f64,

    /// Max gap in meters between two same-direction hills to combine them
    pub hill_gap: f64,

    /// Minimum absolute gradient for a fragment to count as a hill
    pub min_gradient: f64,

    /// Minimum length in meters of a reported hill
    pub min_hill_distance: f64,
}

/// Baseline the interval threshold is multiplied against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePower {
    /// Rider's functional threshold power
    Ftp,
    /// The ride's own average watts
    RideAverage,
}

/// Power cleaning and interval detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalFinderConfig {
    /// Number of samples averaged by the smoothing pass
    pub smoothing_group_size: usize,

    /// Block size for outlier suppression
    pub outlier_group_size: usize,

    /// Standard deviations from the block mean before a sample is an outlier
    pub outlier_threshold_coefficient: f64,

    /// Number of samples per search chunk
    pub search_chunk_size: usize,

    /// Samples moved per greedy boundary expansion step
    pub greedy_step: usize,

    /// Minimum chunk power as a multiple of the reference power
    pub interval_min_threshold: f64,

    /// Baseline for `interval_min_threshold`
    pub reference_power: ReferencePower,

    /// Minimum interval duration in seconds
    pub interval_min_time: f64,

    /// Max gap in seconds between intervals to combine them
    pub interval_max_gap: f64,
}

/// Ride classification parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum total interval time in seconds for an interval ride
    pub min_total_interval_time: f64,

    /// FTP fraction above which a ride's average power is race-like
    pub endurance_ftp_threshold_coefficient: f64,

    /// Minimum average interval time in seconds separating intervals from a race
    pub min_average_interval_time: f64,

    /// FTP fraction below which a ride counts as rest
    pub rest_ftp_threshold_coefficient: f64,

    /// Apply `rest_ftp_threshold_coefficient`; reserved and off by default
    #[serde(default)]
    pub rest_detection: bool,
}

impl Default for HillFinderConfig {
    fn default() -> Self {
        HillFinderConfig {
            false_flat_distance: 50.0,
            hill_gap: 200.0,
            min_gradient: 0.02,
            min_hill_distance: 200.0,
        }
    }
}

impl Default for IntervalFinderConfig {
    fn default() -> Self {
        Self::ftp_profile()
    }
}

impl IntervalFinderConfig {
    /// Intervals are efforts above 85% of FTP
    pub fn ftp_profile() -> Self {
        IntervalFinderConfig {
            smoothing_group_size: 10,
            outlier_group_size: 100,
            outlier_threshold_coefficient: 2.0,
            search_chunk_size: 50,
            greedy_step: 10,
            interval_min_threshold: 0.85,
            reference_power: ReferencePower::Ftp,
            interval_min_time: 30.0,
            interval_max_gap: 30.0,
        }
    }

    /// Intervals are efforts 35% above the ride's own average power
    pub fn ride_average_profile() -> Self {
        IntervalFinderConfig {
            interval_min_threshold: 1.35,
            reference_power: ReferencePower::RideAverage,
            ..Self::ftp_profile()
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            min_total_interval_time: 300.0,
            endurance_ftp_threshold_coefficient: 0.75,
            min_average_interval_time: 300.0,
            rest_ftp_threshold_coefficient: 0.5,
            rest_detection: false,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Unreadable {
            path: path.as_ref().to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: AnalysisConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Invalid configuration in {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rideclass")
            .join("config.toml")
    }

    /// Load configuration from the default location, falling back to defaults
    /// only when no file exists there
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Reject parameter values the pipeline cannot run with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let hills = &self.hills;
        check_non_negative("hills", "false_flat_distance", hills.false_flat_distance)?;
        check_non_negative("hills", "hill_gap", hills.hill_gap)?;
        check_non_negative("hills", "min_gradient", hills.min_gradient)?;
        check_non_negative("hills", "min_hill_distance", hills.min_hill_distance)?;

        let intervals = &self.intervals;
        check_positive_size("intervals", "smoothing_group_size", intervals.smoothing_group_size)?;
        check_positive_size("intervals", "outlier_group_size", intervals.outlier_group_size)?;
        check_positive_size("intervals", "search_chunk_size", intervals.search_chunk_size)?;
        check_positive_size("intervals", "greedy_step", intervals.greedy_step)?;
        check_non_negative(
            "intervals",
            "outlier_threshold_coefficient",
            intervals.outlier_threshold_coefficient,
        )?;
        check_non_negative("intervals", "interval_min_threshold", intervals.interval_min_threshold)?;
        check_non_negative("intervals", "interval_min_time", intervals.interval_min_time)?;
        check_non_negative("intervals", "interval_max_gap", intervals.interval_max_gap)?;

        let classifier = &self.classifier;
        check_non_negative("classifier", "min_total_interval_time", classifier.min_total_interval_time)?;
        check_non_negative(
            "classifier",
            "endurance_ftp_threshold_coefficient",
            classifier.endurance_ftp_threshold_coefficient,
        )?;
        check_non_negative(
            "classifier",
            "min_average_interval_time",
            classifier.min_average_interval_time,
        )?;
        check_non_negative(
            "classifier",
            "rest_ftp_threshold_coefficient",
            classifier.rest_ftp_threshold_coefficient,
        )?;

        Ok(())
    }
}

fn check_non_negative(section: &str, parameter: &str, value: f64) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(section, parameter, value.to_string()))
    }
}

fn check_positive_size(section: &str, parameter: &str, value: usize) -> std::result::Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(invalid(section, parameter, value.to_string()))
    }
}

fn invalid(section: &str, parameter: &str, value: String) -> ConfigError {
    ConfigError::InvalidParameter {
        section: section.to_string(),
        parameter: parameter.to_string(),
        value,
    }
}
