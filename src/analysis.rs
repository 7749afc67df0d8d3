//! Ride analysis pipeline
//!
//! Runs cleaning, hill and interval detection, the terrain breakdown and
//! classification for one ride, and fans a batch of rides out over rayon.

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, info_span, warn};

use crate::classifier::RideClassifier;
use crate::cleaning::StreamCleaner;
use crate::config::{AnalysisConfig, ReferencePower};
use crate::error::{Result, RideError};
use crate::hills::HillFinder;
use crate::intervals::IntervalFinder;
use crate::logging::log_ride_error;
use crate::models::{Ride, WorkoutType};
use crate::terrain;

/// Full per-ride pipeline built from one immutable configuration
#[derive(Debug, Clone)]
pub struct RideAnalyzer {
    cleaner: StreamCleaner,
    hill_finder: HillFinder,
    interval_finder: IntervalFinder,
    classifier: RideClassifier,
}

/// Result of analyzing a batch of rides
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Successfully analyzed rides, in input order
    pub rides: Vec<Ride>,
    /// Rides that could not be analyzed, by name
    pub failures: Vec<(String, String)>,
    /// Total duration in milliseconds
    pub duration_ms: u128,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.rides.len() + self.failures.len()
    }

    pub fn is_fully_successful(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of analyzed rides per workout type
    pub fn counts_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for ride in &self.rides {
            *counts.entry(ride.workout_type.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl RideAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            cleaner: StreamCleaner::new(&config.intervals),
            hill_finder: HillFinder::new(config.hills.clone()),
            interval_finder: IntervalFinder::new(config.intervals.clone()),
            classifier: RideClassifier::new(config.classifier.clone()),
        }
    }

    /// Analyze one ride.
    ///
    /// Without a usable FTP (missing, zero, negative or not finite) the
    /// segments are still computed (intervals only when they are measured
    /// against the ride average) and the ride stays `Unknown`.
    pub fn analyze(&self, ride: Ride, ftp: Option<f64>) -> Result<Ride> {
        let span = info_span!("analyze_ride", ride = %ride.name);
        let _enter = span.enter();

        let ftp = ftp.filter(|ftp| ftp.is_finite() && *ftp > 0.0);

        if ride.is_classified() {
            return Err(RideError::Validation(format!(
                "Ride '{}' is already classified as {}",
                ride.name, ride.workout_type
            )));
        }

        ride.streams.validate()?;
        let mut ride = ride.with_stats_from_streams();

        let cleaned = self.cleaner.clean(&ride.streams.power)?;

        let reference_power = match self.interval_finder.config().reference_power {
            ReferencePower::Ftp => ftp,
            ReferencePower::RideAverage => Some(ride.average_watts),
        };

        let streams = &ride.streams;
        let (hills, intervals) = rayon::join(
            || self.hill_finder.find_hills(streams),
            || match reference_power {
                Some(reference) => self
                    .interval_finder
                    .find_intervals(&cleaned, &streams.time, reference),
                None => Ok(Vec::new()),
            },
        );

        ride.hills = hills?;
        ride.intervals = intervals?;
        ride.terrain = Some(terrain::summarize(&ride.streams, &ride.hills, ride.distance));

        ride.workout_type = match ftp {
            Some(ftp) => self.classifier.classify(&ride, ftp),
            None => {
                warn!("No FTP available, ride left unclassified");
                WorkoutType::Unknown
            }
        };

        info!(
            hills = ride.hills.len(),
            intervals = ride.intervals.len(),
            workout_type = %ride.workout_type,
            "Ride analyzed"
        );

        Ok(ride)
    }

    /// Analyze rides in parallel; failed rides are reported, not fatal
    pub fn analyze_batch(&self, rides: Vec<Ride>, ftp: Option<f64>) -> BatchSummary {
        self.analyze_batch_with_progress(rides, ftp, || {})
    }

    /// Analyze rides in parallel, calling `on_done` once per finished ride
    pub fn analyze_batch_with_progress<F>(&self, rides: Vec<Ride>, ftp: Option<f64>, on_done: F) -> BatchSummary
    where
        F: Fn() + Sync,
    {
        let start_time = Instant::now();
        info!("Starting analysis of {} rides", rides.len());

        let results: Vec<(String, Result<Ride>)> = rides
            .into_par_iter()
            .map(|ride| {
                let name = ride.name.clone();
                let result = self.analyze(ride, ftp);
                on_done();
                (name, result)
            })
            .collect();

        let mut analyzed = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (name, result) in results {
            match result {
                Ok(ride) => analyzed.push(ride),
                Err(e) => {
                    log_ride_error(&e, &name);
                    failures.push((name, e.user_message()));
                }
            }
        }

        let summary = BatchSummary {
            rides: analyzed,
            failures,
            duration_ms: start_time.elapsed().as_millis(),
        };

        info!(
            analyzed = summary.rides.len(),
            failed = summary.failures.len(),
            duration_ms = summary.duration_ms as u64,
            "Batch analysis complete"
        );

        summary
    }
}
