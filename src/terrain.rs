//! Uphill, downhill and flat breakdown of a ride
//!
//! Uphill and downhill figures average over the detected hills of that sign.
//! Flat figures cover every sample outside all hills. Quantities with nothing
//! to average over are `None`.

use crate::models::{mean, HillSegment, RideStreams, TerrainSummary};

/// Compute the terrain breakdown of a ride from its streams and hills
pub fn summarize(streams: &RideStreams, hills: &[HillSegment], ride_distance: f64) -> TerrainSummary {
    let climbs: Vec<&HillSegment> = hills.iter().filter(|hill| hill.is_climb()).collect();
    let descents: Vec<&HillSegment> = hills.iter().filter(|hill| hill.is_descent()).collect();

    let percent_up = share_of_distance(&climbs, ride_distance);
    let percent_down = share_of_distance(&descents, ride_distance);
    let percent_flat = match (percent_up, percent_down) {
        (Some(up), Some(down)) => Some((1.0 - up - down).max(0.0)),
        _ => None,
    };

    let (average_watts_flat, average_speed_flat) = flat_stats(streams, hills);

    TerrainSummary {
        average_watts_uphill: mean_of(&climbs, |hill| hill.average_watts),
        average_watts_downhill: mean_of(&descents, |hill| hill.average_watts),
        average_watts_flat,
        average_speed_uphill: mean_of(&climbs, |hill| hill.average_speed),
        average_speed_downhill: mean_of(&descents, |hill| hill.average_speed),
        average_speed_flat,
        percent_up,
        percent_down,
        percent_flat,
        average_uphill_gradient: mean_of(&climbs, |hill| hill.average_gradient),
    }
}

fn mean_of(hills: &[&HillSegment], value: impl Fn(&HillSegment) -> f64) -> Option<f64> {
    let values: Vec<f64> = hills.iter().map(|hill| value(*hill)).collect();
    mean(&values)
}

fn share_of_distance(hills: &[&HillSegment], ride_distance: f64) -> Option<f64> {
    if ride_distance <= 0.0 || !ride_distance.is_finite() {
        return None;
    }
    let covered: f64 = hills.iter().map(|hill| hill.distance.abs()).sum();
    Some(covered / ride_distance)
}

/// Mean power and overall speed over the steps not covered by any hill
fn flat_stats(streams: &RideStreams, hills: &[HillSegment]) -> (Option<f64>, Option<f64>) {
    let len = streams.len();
    if len < 2 {
        return (None, None);
    }

    // step i runs from sample i to sample i + 1
    let mut on_hill = vec![false; len - 1];
    for hill in hills {
        let end = hill.idx_end.min(len - 1);
        for step in &mut on_hill[hill.idx_start.min(end)..end] {
            *step = true;
        }
    }

    let mut watts = Vec::new();
    let mut distance = 0.0;
    let mut time = 0.0;
    for i in (0..len - 1).filter(|&i| !on_hill[i]) {
        watts.push(streams.power[i]);
        distance += streams.distance[i + 1] - streams.distance[i];
        time += streams.time[i + 1] - streams.time[i];
    }

    let speed = if time > 0.0 { Some(distance / time) } else { None };
    (mean(&watts), speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(len: usize) -> RideStreams {
        RideStreams::new(
            (0..len).map(|i| if i < 10 { 300.0 } else { 150.0 }).collect(),
            vec![0.0; len],
            (0..len).map(|i| i as f64 * 10.0).collect(),
            (0..len).map(|i| i as f64).collect(),
        )
    }

    fn hill(idx_start: usize, idx_end: usize, gradient: f64, watts: f64, speed: f64) -> HillSegment {
        HillSegment {
            idx_start,
            idx_end,
            distance: (idx_end - idx_start) as f64 * 10.0,
            elevation_gain: gradient * (idx_end - idx_start) as f64 * 10.0,
            average_gradient: gradient,
            average_speed: speed,
            average_watts: watts,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_summary_splits_by_sign() {
        let streams = streams(21);
        let hills = vec![hill(0, 10, 0.06, 300.0, 5.0), hill(10, 15, -0.04, 150.0, 15.0)];

        let summary = summarize(&streams, &hills, 200.0);

        assert_eq!(summary.average_watts_uphill, Some(300.0));
        assert_eq!(summary.average_watts_downhill, Some(150.0));
        assert_eq!(summary.average_speed_uphill, Some(5.0));
        assert_eq!(summary.average_speed_downhill, Some(15.0));
        assert_eq!(summary.percent_up, Some(0.5));
        assert_eq!(summary.percent_down, Some(0.25));
        assert_eq!(summary.percent_flat, Some(0.25));
        assert_eq!(summary.average_uphill_gradient, Some(0.06));

        // steps 15..20 are flat
        assert_eq!(summary.average_watts_flat, Some(150.0));
        assert_eq!(summary.average_speed_flat, Some(10.0));
    }

    #[test]
    fn test_no_hills() {
        let streams = streams(21);
        let summary = summarize(&streams, &[], 200.0);

        assert_eq!(summary.average_watts_uphill, None);
        assert_eq!(summary.average_uphill_gradient, None);
        assert_eq!(summary.percent_up, Some(0.0));
        assert_eq!(summary.percent_flat, Some(1.0));
        assert_eq!(summary.average_speed_flat, Some(10.0));
    }

    #[test]
    fn test_zero_ride_distance_has_no_shares() {
        let summary = summarize(&streams(21), &[], 0.0);
        assert_eq!(summary.percent_up, None);
        assert_eq!(summary.percent_flat, None);
    }
}
