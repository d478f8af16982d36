//! Configuration for Monte Carlo stress evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// How trials draw their random numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// One generator seeded once, consumed by every trial in order.
    #[default]
    Shared,
    /// Trial `i` gets its own generator seeded with `seed + i`, and its own
    /// policy copy reseeded from that value.
    ///
    /// Trials are independent, so they can run on a rayon pool.
    PerTrial,
}

impl SeedStrategy {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::PerTrial => "per_trial",
        }
    }
}

/// Configuration for parallel trial execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Run `per_trial` trials on rayon.
    pub enabled: bool,

    /// Maximum number of threads to use (0 = rayon's global pool).
    pub max_threads: usize,

    /// Minimum parallelization threshold (fewer trials run sequentially).
    pub min_parallel_trials: usize,

    /// Whether to log progress at every tenth of the run.
    pub track_progress: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_threads: 0,
            min_parallel_trials: 8,
            track_progress: false,
        }
    }
}

/// Configuration for Monte Carlo simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of synthetic futures to simulate.
    pub num_trials: usize,
    /// Rows in each synthetic panel.
    pub horizon_length: usize,
    /// Seed for reproducibility.
    pub seed: u64,
    /// Seeding strategy.
    pub seeding: SeedStrategy,
    /// Value passed as `deterministic` to the policy.
    pub deterministic_policy: bool,
    /// Parallel execution settings (`per_trial` only).
    pub parallel: ParallelConfig,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_trials: 200,
            horizon_length: 250,
            seed: 42,
            seeding: SeedStrategy::Shared,
            deterministic_policy: true,
            parallel: ParallelConfig::default(),
        }
    }
}

impl MonteCarloConfig {
    /// Check the run parameters against the engine's window size.
    pub fn validate(&self, window_size: usize) -> Result<()> {
        if self.num_trials == 0 {
            return Err(SimulationError::configuration(
                "num_trials must be positive",
            ));
        }
        if self.horizon_length < window_size + 1 {
            return Err(SimulationError::configuration(format!(
                "horizon_length {} must be at least window_size + 1 ({})",
                self.horizon_length,
                window_size + 1
            )));
        }
        Ok(())
    }
}
