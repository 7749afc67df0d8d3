//! Ride records, stream data and the segments found in them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Result, StreamError};

/// Workout categories a ride can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkoutType {
    Intervals,
    Endurance,
    Race,
    Rest,
    /// Ride that was never classified (e.g. no FTP available)
    #[default]
    Unknown,
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutType::Intervals => write!(f, "Intervals"),
            WorkoutType::Endurance => write!(f, "Endurance"),
            WorkoutType::Race => write!(f, "Race"),
            WorkoutType::Rest => write!(f, "Rest"),
            WorkoutType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Degenerate arithmetic detected while computing a segment's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentWarning {
    /// Time delta across the segment is zero; speed reported as 0
    ZeroDuration,
    /// Distance delta across the segment is zero; gradient reported as 0
    ZeroDistance,
    /// Index range holds no samples; average watts reported as 0
    EmptyRange,
}

/// Index-aligned telemetry streams for one ride
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RideStreams {
    /// Power in watts
    pub power: Vec<f64>,

    /// Altitude in meters
    pub altitude: Vec<f64>,

    /// Cumulative distance in meters
    pub distance: Vec<f64>,

    /// Elapsed time in seconds
    pub time: Vec<f64>,
}

impl RideStreams {
    pub fn new(power: Vec<f64>, altitude: Vec<f64>, distance: Vec<f64>, time: Vec<f64>) -> Self {
        Self {
            power,
            altitude,
            distance,
            time,
        }
    }

    /// Number of samples, taken from the power stream
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Check that all four streams are non-empty, equally long and finite
    pub fn validate(&self) -> Result<()> {
        let expected = self.power.len();

        for (name, stream) in self.named() {
            if stream.is_empty() {
                return Err(StreamError::Empty {
                    stream: name.to_string(),
                }
                .into());
            }

            if stream.len() != expected {
                return Err(StreamError::LengthMismatch {
                    stream: name.to_string(),
                    expected,
                    actual: stream.len(),
                }
                .into());
            }

            if let Some(index) = stream.iter().position(|v| !v.is_finite()) {
                return Err(StreamError::NonFinite {
                    stream: name.to_string(),
                    index,
                }
                .into());
            }
        }

        Ok(())
    }

    fn named(&self) -> [(&'static str, &Vec<f64>); 4] {
        [
            ("power", &self.power),
            ("altitude", &self.altitude),
            ("distance", &self.distance),
            ("time", &self.time),
        ]
    }
}

/// A climb or descent detected in a ride
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillSegment {
    pub idx_start: usize,
    pub idx_end: usize,

    /// Distance covered in meters
    pub distance: f64,

    /// Signed altitude change in meters
    pub elevation_gain: f64,

    /// Signed gradient as a decimal (0.05 = 5%)
    pub average_gradient: f64,

    /// Meters per second
    pub average_speed: f64,

    /// Mean raw power over `[idx_start, idx_end)`
    pub average_watts: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SegmentWarning>,
}

impl HillSegment {
    /// Compute a hill's values from the ride streams and an index pair.
    ///
    /// Indices must be in bounds and `idx_start <= idx_end`; the streams are
    /// assumed validated.
    pub fn from_streams(streams: &RideStreams, idx_start: usize, idx_end: usize) -> Self {
        let mut warnings = Vec::new();

        let distance = streams.distance[idx_end] - streams.distance[idx_start];
        let elevation_gain = streams.altitude[idx_end] - streams.altitude[idx_start];
        let elapsed = streams.time[idx_end] - streams.time[idx_start];

        let average_gradient = if distance == 0.0 {
            warnings.push(SegmentWarning::ZeroDistance);
            0.0
        } else {
            elevation_gain / distance
        };

        let average_speed = if elapsed == 0.0 {
            warnings.push(SegmentWarning::ZeroDuration);
            0.0
        } else {
            distance / elapsed
        };

        let average_watts = match mean(&streams.power[idx_start..idx_end]) {
            Some(watts) => watts,
            None => {
                warnings.push(SegmentWarning::EmptyRange);
                0.0
            }
        };

        Self {
            idx_start,
            idx_end,
            distance,
            elevation_gain,
            average_gradient,
            average_speed,
            average_watts,
            warnings,
        }
    }

    pub fn is_climb(&self) -> bool {
        self.average_gradient > 0.0
    }

    pub fn is_descent(&self) -> bool {
        self.average_gradient < 0.0
    }
}

/// A sustained high-power effort detected in a ride
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSegment {
    pub idx_start: usize,

    /// Exclusive end index
    pub idx_end: usize,

    /// Duration in seconds, `time[idx_end] - time[idx_start]`.
    ///
    /// An interval that runs to the end of the stream has `idx_end == N` and
    /// reads `time[N - 1]` instead, so it comes out one sample shorter than an
    /// interior interval of the same length.
    pub time: f64,

    /// Mean power over `[idx_start, idx_end)`
    pub average_watts: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SegmentWarning>,
}

impl IntervalSegment {
    /// Compute an interval's values from a power stream and its time stream.
    ///
    /// `idx_end` may equal the stream length, in which case the last time
    /// sample closes the interval.
    pub fn from_stream(power: &[f64], time: &[f64], idx_start: usize, idx_end: usize) -> Self {
        let mut warnings = Vec::new();

        let elapsed = elapsed_time(time, idx_start, idx_end);
        if elapsed == 0.0 {
            warnings.push(SegmentWarning::ZeroDuration);
        }

        let average_watts = match mean(&power[idx_start..idx_end]) {
            Some(watts) => watts,
            None => {
                warnings.push(SegmentWarning::EmptyRange);
                0.0
            }
        };

        Self {
            idx_start,
            idx_end,
            time: elapsed,
            average_watts,
            warnings,
        }
    }

    /// Whether two intervals share any sample
    pub fn overlaps(&self, other: &IntervalSegment) -> bool {
        self.idx_start < other.idx_end && other.idx_start < self.idx_end
    }
}

/// Ride-level statistics split by terrain
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TerrainSummary {
    pub average_watts_uphill: Option<f64>,
    pub average_watts_downhill: Option<f64>,
    pub average_watts_flat: Option<f64>,
    pub average_speed_uphill: Option<f64>,
    pub average_speed_downhill: Option<f64>,
    pub average_speed_flat: Option<f64>,
    pub percent_up: Option<f64>,
    pub percent_down: Option<f64>,
    pub percent_flat: Option<f64>,
    pub average_uphill_gradient: Option<f64>,
}

/// A recorded ride with its telemetry and analysis results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Activity name as given by the provider
    pub name: String,

    /// Ride start time
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// Total distance in meters
    #[serde(default)]
    pub distance: f64,

    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: f64,

    /// Average power in watts
    #[serde(default)]
    pub average_watts: f64,

    /// Average speed in meters per second
    #[serde(default)]
    pub average_speed: f64,

    /// Total elevation gain in meters
    #[serde(default)]
    pub total_elevation_gain: f64,

    /// Raw telemetry
    pub streams: RideStreams,

    /// Detected climbs and descents
    #[serde(default)]
    pub hills: Vec<HillSegment>,

    /// Detected high-intensity efforts
    #[serde(default)]
    pub intervals: Vec<IntervalSegment>,

    /// Uphill/downhill/flat breakdown
    #[serde(default)]
    pub terrain: Option<TerrainSummary>,

    /// Classification result, `Unknown` until classified
    #[serde(default)]
    pub workout_type: WorkoutType,
}

impl Ride {
    /// Create an unanalyzed ride from provider data
    pub fn new(name: impl Into<String>, streams: RideStreams) -> Self {
        Self {
            name: name.into(),
            start_date: None,
            distance: 0.0,
            moving_time: 0.0,
            average_watts: 0.0,
            average_speed: 0.0,
            total_elevation_gain: 0.0,
            streams,
            hills: Vec::new(),
            intervals: Vec::new(),
            terrain: None,
            workout_type: WorkoutType::Unknown,
        }
    }

    /// Fill in scalar stats the provider left empty from the streams
    pub fn with_stats_from_streams(mut self) -> Self {
        let streams = &self.streams;
        if streams.is_empty() {
            return self;
        }

        let last = streams.len() - 1;
        if self.distance == 0.0 {
            if let (Some(first), Some(end)) = (streams.distance.first(), streams.distance.get(last)) {
                self.distance = end - first;
            }
        }
        if self.moving_time == 0.0 {
            if let (Some(first), Some(end)) = (streams.time.first(), streams.time.get(last)) {
                self.moving_time = end - first;
            }
        }
        if self.average_watts == 0.0 {
            self.average_watts = mean(&streams.power).unwrap_or(0.0);
        }
        if self.average_speed == 0.0 && self.moving_time > 0.0 {
            self.average_speed = self.distance / self.moving_time;
        }
        if self.total_elevation_gain == 0.0 {
            self.total_elevation_gain = streams
                .altitude
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).max(0.0))
                .sum();
        }

        self
    }

    pub fn is_classified(&self) -> bool {
        self.workout_type != WorkoutType::Unknown
    }

    /// Sum of all interval durations in seconds
    pub fn total_interval_time(&self) -> f64 {
        self.intervals.iter().map(|interval| interval.time).sum()
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// Time between two indices; an end index of `time.len()` reads the last sample
pub fn elapsed_time(time: &[f64], idx_start: usize, idx_end: usize) -> f64 {
    if time.is_empty() {
        return 0.0;
    }
    let last = time.len() - 1;
    time[idx_end.min(last)] - time[idx_start.min(last)]
}

/// Read a JSON array of ride records
pub fn read_rides<P: AsRef<Path>>(path: P) -> Result<Vec<Ride>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write rides as a pretty-printed JSON array
pub fn write_rides<P: AsRef<Path>>(path: P, rides: &[Ride]) -> Result<()> {
    let json = serde_json::to_string_pretty(rides)?;
    fs::write(path, json)?;
    Ok(())
}
