//! Climb and descent detection
//!
//! Hills are found in three phases:
//! - fragment detection: walk the altitude stream while it keeps rising (or
//!   falling), looking past short false flats
//! - cleaning: drop shallow fragments, merge close same-direction fragments and
//!   drop short results
//! - value computation from the ride streams

use tracing::{debug, warn};

use crate::config::HillFinderConfig;
use crate::error::Result;
use crate::models::{HillSegment, RideStreams};

/// Raw start/end index pair of a candidate hill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HillFragment {
    pub idx_start: usize,
    pub idx_end: usize,
}

impl HillFragment {
    pub fn new(idx_start: usize, idx_end: usize) -> Self {
        Self { idx_start, idx_end }
    }
}

/// Finds hills in a ride's altitude and distance streams
#[derive(Debug, Clone)]
pub struct HillFinder {
    config: HillFinderConfig,
}

impl HillFinder {
    pub fn new(config: HillFinderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HillFinderConfig {
        &self.config
    }

    /// Find all climbs and descents in a ride
    pub fn find_hills(&self, streams: &RideStreams) -> Result<Vec<HillSegment>> {
        streams.validate()?;

        let fragments = self.find_fragments(&streams.altitude, &streams.distance);
        let cleaned = self.clean_fragments(&streams.altitude, &streams.distance, &fragments);

        let hills: Vec<HillSegment> = cleaned
            .iter()
            .map(|fragment| HillSegment::from_streams(streams, fragment.idx_start, fragment.idx_end))
            .collect();

        for hill in hills.iter().filter(|hill| !hill.warnings.is_empty()) {
            warn!(
                idx_start = hill.idx_start,
                idx_end = hill.idx_end,
                warnings = ?hill.warnings,
                "Degenerate values in hill"
            );
        }

        debug!(
            fragments = fragments.len(),
            hills = hills.len(),
            "Hill detection complete"
        );

        Ok(hills)
    }

    /// Walk the altitude stream and split it into alternating rising and
    /// falling fragments.
    ///
    /// When the immediate trend breaks, the point `false_flat_distance` meters
    /// ahead decides whether the break is a false flat (the trend resumes and
    /// the walk jumps there) or the end of the fragment. A fragment still open
    /// when the walk reaches the end of the stream is not returned.
    pub fn find_fragments(&self, altitude: &[f64], distance: &[f64]) -> Vec<HillFragment> {
        let mut fragments = Vec::new();
        let len = altitude.len().min(distance.len());

        let mut ascending = true;
        let mut start = 0;
        let mut cursor = 0;

        while cursor + 1 < len {
            if continues_trend(altitude[cursor], altitude[cursor + 1], ascending) {
                cursor += 1;
                continue;
            }

            match idx_of_point_ahead(distance, cursor, self.config.false_flat_distance) {
                Some(ahead) if continues_trend(altitude[cursor], altitude[ahead], ascending) => {
                    cursor = ahead;
                }
                Some(_) => {
                    fragments.push(HillFragment::new(start, cursor));
                    ascending = !ascending;
                    start = cursor;
                    cursor += 1;
                }
                None => {
                    fragments.push(HillFragment::new(start, cursor));
                    break;
                }
            }
        }

        fragments
    }

    /// Drop shallow fragments, merge close same-direction ones and drop
    /// results shorter than `min_hill_distance`
    pub fn clean_fragments(
        &self,
        altitude: &[f64],
        distance: &[f64],
        fragments: &[HillFragment],
    ) -> Vec<HillFragment> {
        let culled = self.cull_fragments(altitude, distance, fragments);
        let merged = self.merge_fragments(altitude, distance, &culled);

        merged
            .into_iter()
            .filter(|hill| distance[hill.idx_end] - distance[hill.idx_start] >= self.config.min_hill_distance)
            .collect()
    }

    /// Keep fragments whose gradient magnitude exceeds `min_gradient`.
    /// Zero-distance fragments have no gradient and are dropped.
    pub fn cull_fragments(
        &self,
        altitude: &[f64],
        distance: &[f64],
        fragments: &[HillFragment],
    ) -> Vec<HillFragment> {
        fragments
            .iter()
            .copied()
            .filter(|fragment| {
                let slope = gradient(altitude, distance, fragment.idx_start, fragment.idx_end);
                slope.is_finite() && slope.abs() > self.config.min_gradient
            })
            .collect()
    }

    /// Merge neighbouring fragments that point the same way and are at most
    /// `hill_gap` meters apart
    pub fn merge_fragments(
        &self,
        altitude: &[f64],
        distance: &[f64],
        fragments: &[HillFragment],
    ) -> Vec<HillFragment> {
        if fragments.len() < 2 {
            return fragments.to_vec();
        }

        let mut merged = Vec::new();
        let mut current = fragments[0];

        for next in &fragments[1..] {
            let gap = distance[next.idx_start] - distance[current.idx_end];
            let current_slope = gradient(altitude, distance, current.idx_start, current.idx_end);
            let next_slope = gradient(altitude, distance, next.idx_start, next.idx_end);

            if gap <= self.config.hill_gap && current_slope * next_slope > 0.0 {
                current.idx_end = next.idx_end;
            } else {
                merged.push(current);
                current = *next;
            }
        }
        merged.push(current);

        merged
    }
}

fn continues_trend(from: f64, to: f64, ascending: bool) -> bool {
    if ascending {
        from < to
    } else {
        from > to
    }
}

/// Index of the first sample at least `value` units ahead of `current` in a
/// cumulative stream, or `None` if the stream ends first
pub fn idx_of_point_ahead(unit_stream: &[f64], current: usize, value: f64) -> Option<usize> {
    let origin = *unit_stream.get(current)?;

    (current..unit_stream.len()).find(|&i| unit_stream[i] - origin >= value)
}

/// Average gradient between two indices; NaN or infinite when no distance
/// is covered
pub fn gradient(altitude: &[f64], distance: &[f64], idx_start: usize, idx_end: usize) -> f64 {
    let rise = altitude[idx_end] - altitude[idx_start];
    let run = distance[idx_end] - distance[idx_start];

    rise / run
}
