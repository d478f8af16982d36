// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_collect,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Portfolio Sim - Rust Core Library
//!
//! Portfolio allocation simulator and Monte Carlo stress evaluator.
//!
//! # Architecture
//!
//! ## Core
//!
//! - `env`: Simulation engine. Reset/step over a price panel, reward and
//!   turnover-cost accounting, observation construction
//! - `monte_carlo`: Bootstrap resampling of historical returns, seeded
//!   trial execution (sequential or rayon), terminal value statistics
//!
//! ## Collaborators
//!
//! - `panel`: Validated multi-asset price table
//! - `policy`: The `Policy` seam plus baseline policies
//! - `evaluation`: Historical rollout with a buy-and-hold baseline
//!
//! ## Glue
//!
//! - `config`: YAML configuration with environment variable interpolation
//! - `report`: JSON reports and panel files
//! - `observability` / `telemetry`: Prometheus metrics and tracing setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Configuration loading and validation.
pub mod config;

/// Portfolio simulation engine.
pub mod env;

/// Error types.
pub mod error;

/// Historical rollout evaluation.
pub mod evaluation;

/// Monte Carlo stress evaluation.
pub mod monte_carlo;

/// Metrics instrumentation.
pub mod observability;

/// Price panels.
pub mod panel;

/// Allocation policies.
pub mod policy;

/// JSON reports and panel files.
pub mod report;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use env::{EnvConfig, Observation, PortfolioEnv, StepInfo, Transition, ZeroSumAction};
pub use error::{Result, SimulationError};
pub use evaluation::{EpisodeTrace, EvaluationSummary, buy_and_hold_curve, rollout};
pub use monte_carlo::{MonteCarloConfig, MonteCarloEvaluator, MonteCarloResult, simulate};
pub use panel::PricePanel;
pub use policy::Policy;
