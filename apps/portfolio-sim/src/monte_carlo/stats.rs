//! Distribution statistics over terminal portfolio values.

use serde::{Deserialize, Serialize};

/// Statistical distribution summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Population standard deviation (ddof = 0).
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Median (50th percentile).
    pub median: f64,
    /// 5th percentile.
    pub percentile_5: f64,
    /// 25th percentile.
    pub percentile_25: f64,
    /// 75th percentile.
    pub percentile_75: f64,
    /// 95th percentile.
    pub percentile_95: f64,
}

impl DistributionStats {
    /// Summarize `values`. Empty input gives all zeros.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len();
        let sorted = sorted_copy(values);

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

        Self {
            count: n,
            mean,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
            median: percentile(&sorted, 50.0),
            percentile_5: percentile(&sorted, 5.0),
            percentile_25: percentile(&sorted, 25.0),
            percentile_75: percentile(&sorted, 75.0),
            percentile_95: percentile(&sorted, 95.0),
        }
    }
}

/// Downside summary of terminal values relative to the starting value 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
    /// Share of trials that ended below the starting value.
    pub prob_loss: f64,
    /// Mean of the terminal values at or below the 5th percentile.
    pub cvar_5: f64,
}

impl TailRisk {
    /// Compute from raw terminal values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let sorted = sorted_copy(values);
        let var_5 = percentile(&sorted, 5.0);

        let losses = values.iter().filter(|v| **v < 1.0).count();
        let tail: Vec<f64> = sorted.iter().copied().take_while(|v| *v <= var_5).collect();
        // The minimum is always <= the 5th percentile, so the tail is never empty
        let cvar_5 = tail.iter().sum::<f64>() / tail.len().max(1) as f64;

        Self {
            prob_loss: losses as f64 / values.len() as f64,
            cvar_5,
        }
    }
}

/// Percentile `q` (0-100) of ascending `sorted`, interpolating linearly
/// between the two closest order statistics. Returns NaN for empty input.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }

    let pos = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = pos - lo as f64;

    let (a, b) = (sorted[lo], sorted[hi]);
    let diff = b - a;
    // Interpolate from the nearer endpoint for accuracy
    if frac >= 0.5 {
        b - diff * (1.0 - frac)
    } else {
        a + diff * frac
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}
