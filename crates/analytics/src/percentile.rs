//! Continuous (interpolated) percentile thresholds and tier assignment.
//!
//! Matches `percentile_cont` semantics: for percentile `p` over `n` sorted
//! values the rank is `p * (n - 1)`; a fractional rank interpolates
//! linearly between the two nearest values.

use pulse_core::{PulseError, PulseResult};
use serde::Serialize;

/// Distribution thresholds for one metric, computed once per run over the
/// whole customer population.
#[derive(Debug, Clone, Serialize)]
pub struct PercentileThresholds {
    pub metric: String,
    pub cutoffs: Vec<PercentileCutoff>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PercentileCutoff {
    pub percentile: f64,
    pub value: f64,
}

impl PercentileThresholds {
    /// Threshold value for a percentile that was requested at computation
    /// time.
    pub fn value_at(&self, percentile: f64) -> Option<f64> {
        self.cutoffs
            .iter()
            .find(|c| (c.percentile - percentile).abs() < 1e-9)
            .map(|c| c.value)
    }
}

/// Compute interpolated thresholds for the requested percentiles.
///
/// A single-value population returns that value for every percentile; an
/// empty one is a reportable `EmptyPopulation`, never a silent zero.
pub fn percentile_thresholds(
    values: &[f64],
    percentiles: &[f64],
    metric: &str,
) -> PulseResult<PercentileThresholds> {
    if values.is_empty() {
        return Err(PulseError::EmptyPopulation {
            metric: metric.to_string(),
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let cutoffs = percentiles
        .iter()
        .map(|&p| PercentileCutoff {
            percentile: p,
            value: interpolate(&sorted, p),
        })
        .collect();

    Ok(PercentileThresholds {
        metric: metric.to_string(),
        cutoffs,
    })
}

fn interpolate(sorted: &[f64], percentile: f64) -> f64 {
    let rank = percentile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let weight = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * weight
    }
}

/// Assign the highest tier whose threshold the value meets or exceeds.
///
/// `tiers` are ordered high to low and the comparison is `>=`, so a value
/// sitting exactly on a threshold lands in the higher tier. Values below
/// every threshold fall through to the last (floor) tier.
pub fn classify<T: Copy>(value: f64, tiers: &[(T, f64)]) -> Option<T> {
    tiers
        .iter()
        .find(|(_, threshold)| value >= *threshold)
        .or_else(|| tiers.last())
        .map(|(tier, _)| *tier)
}
