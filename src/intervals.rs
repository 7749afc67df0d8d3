//! High-intensity interval detection
//!
//! The cleaned power stream is scanned in fixed-size chunks. A chunk whose
//! average power clears the threshold seeds a candidate interval, which is then
//! grown greedily at both ends while its average power keeps rising. Nearby
//! intervals are merged and short ones dropped.

use tracing::debug;

use crate::config::IntervalFinderConfig;
use crate::error::{Result, RideError, StreamError};
use crate::models::{elapsed_time, IntervalSegment};

/// Finds intervals in a cleaned power stream
#[derive(Debug, Clone)]
pub struct IntervalFinder {
    config: IntervalFinderConfig,
}

impl IntervalFinder {
    pub fn new(config: IntervalFinderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IntervalFinderConfig {
        &self.config
    }

    /// Find intervals whose power clears `interval_min_threshold × reference_power`
    pub fn find_intervals(
        &self,
        power: &[f64],
        time: &[f64],
        reference_power: f64,
    ) -> Result<Vec<IntervalSegment>> {
        if power.is_empty() {
            return Err(StreamError::Empty {
                stream: "power".to_string(),
            }
            .into());
        }
        if time.len() != power.len() {
            return Err(StreamError::LengthMismatch {
                stream: "time".to_string(),
                expected: power.len(),
                actual: time.len(),
            }
            .into());
        }
        if !reference_power.is_finite() || reference_power < 0.0 {
            return Err(RideError::Validation(format!(
                "Reference power must be a finite non-negative number, got {}",
                reference_power
            )));
        }

        let threshold = self.config.interval_min_threshold * reference_power;
        let candidates = self.scan(power, threshold);
        let intervals = self.clean_intervals(power, time, &candidates);

        debug!(
            threshold,
            candidates = candidates.len(),
            intervals = intervals.len(),
            "Interval detection complete"
        );

        Ok(intervals)
    }

    /// Chunk scan with greedy boundary expansion, returning `[start, end)` pairs
    fn scan(&self, power: &[f64], threshold: f64) -> Vec<(usize, usize)> {
        let chunk = self.config.search_chunk_size.max(1);
        let mut candidates = Vec::new();

        // no interval may reach back past the end of the previous one
        let mut floor = 0;
        let mut cursor = 0;

        while cursor + chunk <= power.len() {
            let seed_end = cursor + chunk;
            let seed_average = average_watts(power, cursor, seed_end);

            if seed_average < threshold {
                cursor = seed_end;
                continue;
            }

            let (start, end) = self.expand(power, cursor, seed_end, seed_average, floor);
            candidates.push((start, end));

            floor = end;
            cursor = end;
        }

        candidates
    }

    /// Grow the start backward, then the end forward, one step at a time while
    /// the average strictly improves
    fn expand(
        &self,
        power: &[f64],
        mut start: usize,
        mut end: usize,
        mut best: f64,
        floor: usize,
    ) -> (usize, usize) {
        let step = self.config.greedy_step.max(1);

        while start > floor {
            let candidate = start.saturating_sub(step).max(floor);
            let average = average_watts(power, candidate, end);
            if average > best {
                best = average;
                start = candidate;
            } else {
                break;
            }
        }

        while end < power.len() {
            let candidate = (end + step).min(power.len());
            let average = average_watts(power, start, candidate);
            if average > best {
                best = average;
                end = candidate;
            } else {
                break;
            }
        }

        (start, end)
    }

    /// Merge intervals separated by less than `interval_max_gap` seconds,
    /// compute their values and drop those shorter than `interval_min_time`
    fn clean_intervals(
        &self,
        power: &[f64],
        time: &[f64],
        candidates: &[(usize, usize)],
    ) -> Vec<IntervalSegment> {
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(candidates.len());

        for &(start, end) in candidates {
            match merged.last_mut() {
                Some(previous) if elapsed_time(time, previous.1, start) < self.config.interval_max_gap => {
                    previous.1 = end;
                }
                _ => merged.push((start, end)),
            }
        }

        merged
            .into_iter()
            .map(|(start, end)| IntervalSegment::from_stream(power, time, start, end))
            .filter(|interval| interval.time >= self.config.interval_min_time)
            .collect()
    }
}

fn average_watts(power: &[f64], start: usize, end: usize) -> f64 {
    let window = &power[start..end];
    window.iter().sum::<f64>() / window.len() as f64
}
