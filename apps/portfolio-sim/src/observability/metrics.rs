//! Prometheus metrics for episodes and Monte Carlo runs.
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder, so the
//! library can be used without any metrics setup.
//!
//! # Example
//!
//! ```ignore
//! use portfolio_sim::observability::{init_metrics, MetricsConfig};
//!
//! let handle = init_metrics(&MetricsConfig::default())?;
//! // ... run a simulation ...
//! std::fs::write("metrics.prom", handle.render())?;
//! ```

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Configuration for the metrics recorder.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Histogram buckets for trial durations (in seconds).
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            // 100us to 10s
            duration_buckets: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0,
            ],
        }
    }
}

/// Install the Prometheus recorder and return a handle for rendering.
///
/// # Errors
///
/// Returns an error if the buckets are rejected or a global recorder is
/// already installed.
pub fn init_metrics(config: &MetricsConfig) -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(&config.duration_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::debug!("Prometheus metrics recorder installed");

    Ok(handle)
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure the recorder.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install the recorder.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Episode Metrics
// ============================================================================

/// Record a finished episode.
///
/// # Arguments
///
/// * `steps` - Steps taken from reset to termination
/// * `portfolio_value` - Terminal portfolio value
pub fn record_episode_completed(steps: usize, portfolio_value: f64) {
    counter!("portfolio_episodes_total").increment(1);
    histogram!("portfolio_episode_steps").record(steps as f64);
    gauge!("portfolio_last_terminal_value").set(portfolio_value);
}

// ============================================================================
// Monte Carlo Metrics
// ============================================================================

/// Record one finished Monte Carlo trial.
pub fn record_trial_completed(terminal_value: f64, duration: Duration) {
    counter!("monte_carlo_trials_total").increment(1);
    histogram!("monte_carlo_trial_duration_seconds").record(duration.as_secs_f64());
    histogram!("monte_carlo_terminal_value").record(terminal_value);
}

/// Record a Monte Carlo trial that aborted with an error.
///
/// # Arguments
///
/// * `reason` - Stable error label (e.g., "INVALID_ACTION")
pub fn record_trial_failed(reason: &'static str) {
    counter!("monte_carlo_trial_failures_total", "reason" => reason).increment(1);
}

/// Record a finished Monte Carlo run.
///
/// # Arguments
///
/// * `seeding` - Seeding strategy label (e.g., "shared", "per_trial")
/// * `trials` - Number of trials completed
/// * `duration` - Wall time of the whole run
pub fn record_simulation_completed(seeding: &str, trials: usize, duration: Duration) {
    counter!("monte_carlo_runs_total", "seeding" => seeding.to_string()).increment(1);
    gauge!("monte_carlo_run_trials").set(trials as f64);
    histogram!("monte_carlo_run_duration_seconds").record(duration.as_secs_f64());
}
