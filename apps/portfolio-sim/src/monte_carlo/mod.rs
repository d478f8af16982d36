//! Monte Carlo stress evaluation.
//!
//! Bootstrap-resamples a historical panel's row-over-row returns into
//! synthetic futures, runs a fresh engine over each one under a fixed
//! policy, and aggregates the distribution of terminal portfolio values:
//! - Return pool and synthetic panel construction (`resample`)
//! - Seeded trial execution, sequential or on rayon (`evaluator`)
//! - Distribution statistics and tail risk (`stats`)
//!
//! # Example
//!
//! ```ignore
//! use portfolio_sim::monte_carlo::MonteCarloEvaluator;
//! use portfolio_sim::policy::EqualWeightPolicy;
//!
//! let evaluator = MonteCarloEvaluator::builder()
//!     .window_size(50)
//!     .num_trials(200)
//!     .horizon_length(250)
//!     .seed(42)
//!     .build()?;
//!
//! let result = evaluator.run(&mut EqualWeightPolicy, &panel)?;
//! println!("mean {:.4} p5 {:.4}", result.stats.mean, result.stats.percentile_5);
//! ```

mod config;
mod evaluator;
mod progress;
mod resample;
mod stats;

pub use config::{MonteCarloConfig, ParallelConfig, SeedStrategy};
pub use evaluator::{MonteCarloEvaluator, MonteCarloEvaluatorBuilder, MonteCarloResult, simulate};
pub use progress::{Progress, ProgressTracker};
pub use resample::ReturnPool;
pub use stats::{DistributionStats, TailRisk, percentile};
