//! Observation and transition types produced by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Policy input: trailing price window followed by the current allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    values: Vec<f64>,
    window_len: usize,
}

impl Observation {
    /// Wrap a flattened observation whose first `window_len` values are prices.
    ///
    /// Only the engine builds observations, always with `window_len` no
    /// longer than `values`.
    #[must_use]
    pub(crate) fn new(values: Vec<f64>, window_len: usize) -> Self {
        debug_assert!(window_len <= values.len(), "window exceeds observation");
        Self { values, window_len }
    }

    /// The full observation vector.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// The flattened price window, oldest row first.
    #[must_use]
    pub fn window(&self) -> &[f64] {
        &self.values[..self.window_len]
    }

    /// The allocation part (assets then cash).
    #[must_use]
    pub fn allocation(&self) -> &[f64] {
        &self.values[self.window_len..]
    }

    /// Observation length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the observation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume into the raw vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for Observation {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// Per-step metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Portfolio value after the step.
    pub portfolio_value: f64,
    /// Gross portfolio return for the step, before transaction cost.
    #[serde(alias = "net_return")]
    pub portfolio_return: f64,
    /// Turnover cost charged against the reward.
    pub transaction_cost: f64,
    /// Date of the row whose price was just realized.
    pub timestamp: Option<NaiveDate>,
}

/// Result of one engine step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Observation after the step.
    pub observation: Observation,
    /// Portfolio return minus transaction cost.
    pub reward: f64,
    /// Whether the episode has terminated.
    pub done: bool,
    /// Step metadata.
    pub info: StepInfo,
}
