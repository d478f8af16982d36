//! Observability for the simulator.
//!
//! Prometheus metrics rendered from an in-process recorder. Nothing here
//! starts a listener; the binary writes the rendered exposition to a file
//! once the run finishes.

mod metrics;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_episode_completed,
    record_simulation_completed, record_trial_completed, record_trial_failed,
};
