//! Workout classification from detected intervals

use tracing::debug;

use crate::config::ClassifierConfig;
use crate::models::{Ride, WorkoutType};

/// Rule-based workout classification from detected intervals and FTP
#[derive(Debug, Clone, Default)]
pub struct RideClassifier {
    config: ClassifierConfig,
}

impl RideClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a ride whose intervals have already been detected.
    ///
    /// Rules, in order:
    /// - no usable FTP: `Unknown`
    /// - (only with `rest_detection`) average power under the rest fraction of FTP: `Rest`
    /// - total interval time under `min_total_interval_time`: `Endurance`
    /// - average power over the endurance fraction of FTP and short intervals
    ///   on average: `Race`
    /// - otherwise `Intervals`
    pub fn classify(&self, ride: &Ride, ftp: f64) -> WorkoutType {
        if !ftp.is_finite() || ftp <= 0.0 {
            return WorkoutType::Unknown;
        }

        let config = &self.config;

        if config.rest_detection && ride.average_watts < ftp * config.rest_ftp_threshold_coefficient {
            return WorkoutType::Rest;
        }

        let total_interval_time = ride.total_interval_time();
        if ride.intervals.is_empty() || total_interval_time < config.min_total_interval_time {
            return WorkoutType::Endurance;
        }

        let average_interval_time = total_interval_time / ride.intervals.len() as f64;
        let workout_type = if ride.average_watts > ftp * config.endurance_ftp_threshold_coefficient
            && average_interval_time < config.min_average_interval_time
        {
            WorkoutType::Race
        } else {
            WorkoutType::Intervals
        };

        debug!(
            ride = %ride.name,
            total_interval_time,
            average_interval_time,
            %workout_type,
            "Classified ride"
        );

        workout_type
    }
}
