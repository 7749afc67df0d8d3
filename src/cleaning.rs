//! Power stream cleaning
//!
//! Sensor dropouts record as zero and single-sample spikes are common in
//! power meter data. Cleaning runs three passes in order: zero replacement,
//! moving-average smoothing and block-wise outlier suppression.

use statrs::statistics::Statistics;
use tracing::debug;

use crate::config::IntervalFinderConfig;
use crate::error::{Result, StreamError};

/// Cleans raw power streams ahead of interval detection
#[derive(Debug, Clone)]
pub struct StreamCleaner {
    smoothing_group_size: usize,
    outlier_group_size: usize,
    threshold_coefficient: f64,
}

impl StreamCleaner {
    pub fn new(config: &IntervalFinderConfig) -> Self {
        Self {
            smoothing_group_size: config.smoothing_group_size,
            outlier_group_size: config.outlier_group_size,
            threshold_coefficient: config.outlier_threshold_coefficient,
        }
    }

    /// Clean a power stream. The output has the same length as the input.
    pub fn clean(&self, power: &[f64]) -> Result<Vec<f64>> {
        if power.is_empty() {
            return Err(StreamError::Empty {
                stream: "power".to_string(),
            }
            .into());
        }

        let filled = replace_zeros(power);
        let smoothed = moving_average(&filled, self.smoothing_group_size);
        let (cleaned, replaced) =
            suppress_outliers(&smoothed, self.outlier_group_size, self.threshold_coefficient);

        debug!(
            samples = power.len(),
            zeros = power.iter().filter(|&&w| w == 0.0).count(),
            outliers = replaced,
            "Cleaned power stream"
        );

        Ok(cleaned)
    }
}

/// Replace every exact zero with the mean of the whole original stream
pub fn replace_zeros(stream: &[f64]) -> Vec<f64> {
    if stream.is_empty() {
        return Vec::new();
    }
    let average = stream.iter().sum::<f64>() / stream.len() as f64;

    stream
        .iter()
        .map(|&value| if value == 0.0 { average } else { value })
        .collect()
}

/// Symmetric moving sum over `group_size` samples on each side, divided by
/// `group_size`.
///
/// The window for sample `i` is `[i - g, i + g)` clipped to the stream, so an
/// interior sample sums `2g` values and a constant stream comes out doubled.
/// Clipped windows near the edges keep the same divisor.
pub fn moving_average(stream: &[f64], group_size: usize) -> Vec<f64> {
    if group_size == 0 {
        return stream.to_vec();
    }

    let len = stream.len();

    // prefix[i] = sum of stream[..i]
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0.0);
    for &value in stream {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + value);
    }

    (0..len)
        .map(|i| {
            let start = i.saturating_sub(group_size);
            let end = (i + group_size).min(len);
            (prefix[end] - prefix[start]) / group_size as f64
        })
        .collect()
}

/// Replace samples more than `coefficient` population standard deviations
/// from their block mean with that mean. Blocks are `group_size` long and
/// non-overlapping; a trailing partial block is left as is.
///
/// Returns the cleaned stream and the number of replaced samples.
pub fn suppress_outliers(stream: &[f64], group_size: usize, coefficient: f64) -> (Vec<f64>, usize) {
    let mut cleaned = stream.to_vec();
    let mut replaced = 0;

    if group_size == 0 {
        return (cleaned, replaced);
    }

    for block_start in (0..stream.len()).step_by(group_size) {
        let block_end = block_start + group_size;
        if block_end > stream.len() {
            break;
        }

        let block = &stream[block_start..block_end];
        let block_mean = block.iter().mean();
        let std_dev = block.iter().population_std_dev();

        let lower = block_mean - coefficient * std_dev;
        let upper = block_mean + coefficient * std_dev;

        for (offset, &value) in block.iter().enumerate() {
            if value < lower || value > upper {
                cleaned[block_start + offset] = block_mean;
                replaced += 1;
            }
        }
    }

    (cleaned, replaced)
}
