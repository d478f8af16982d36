//! Monte Carlo evaluator: drives a policy through many synthetic futures.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, info, span, warn};

use super::config::{MonteCarloConfig, ParallelConfig, SeedStrategy};
use super::progress::ProgressTracker;
use super::resample::ReturnPool;
use super::stats::{DistributionStats, TailRisk};
use crate::env::{EnvConfig, PortfolioEnv};
use crate::error::{Result, SimulationError};
use crate::observability;
use crate::panel::PricePanel;
use crate::policy::Policy;

/// Mixed into a trial's seed before reseeding its policy copy, so the policy
/// never replays the resampling stream.
const POLICY_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Complete Monte Carlo simulation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Seeding strategy the values were drawn with.
    pub seeding: SeedStrategy,
    /// Terminal portfolio value of every trial, in trial order.
    pub terminal_values: Vec<f64>,
    /// Distribution of the terminal values.
    pub stats: DistributionStats,
    /// Downside summary of the terminal values.
    pub tail: TailRisk,
}

impl MonteCarloResult {
    /// Aggregate raw terminal values.
    #[must_use]
    pub fn from_terminal_values(seeding: SeedStrategy, terminal_values: Vec<f64>) -> Self {
        let stats = DistributionStats::from_values(&terminal_values);
        let tail = TailRisk::from_values(&terminal_values);
        Self {
            seeding,
            terminal_values,
            stats,
            tail,
        }
    }
}

/// Monte Carlo stress evaluator.
#[derive(Debug, Clone)]
pub struct MonteCarloEvaluator {
    env_config: EnvConfig,
    config: MonteCarloConfig,
}

impl MonteCarloEvaluator {
    /// Create an evaluator, validating both configurations.
    pub fn new(env_config: EnvConfig, config: MonteCarloConfig) -> Result<Self> {
        env_config.validate()?;
        config.validate(env_config.window_size)?;
        Ok(Self { env_config, config })
    }

    /// Start building an evaluator from defaults.
    #[must_use]
    pub fn builder() -> MonteCarloEvaluatorBuilder {
        MonteCarloEvaluatorBuilder::new()
    }

    /// Engine configuration used for every trial.
    #[must_use]
    pub const fn env_config(&self) -> &EnvConfig {
        &self.env_config
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Run every trial with the configured seeding strategy and aggregate.
    ///
    /// Under `shared` seeding `policy` is driven directly. Under `per_trial`
    /// each trial drives its own clone of `policy`, reseeded from the trial
    /// seed.
    pub fn run<P>(&self, policy: &mut P, panel: &PricePanel) -> Result<MonteCarloResult>
    where
        P: Policy + Clone + Send + Sync,
    {
        let start = Instant::now();
        info!(
            trials = self.config.num_trials,
            horizon = self.config.horizon_length,
            window = self.env_config.window_size,
            seed = self.config.seed,
            seeding = self.config.seeding.as_str(),
            policy = policy.name(),
            "Running Monte Carlo simulation"
        );

        let terminal_values = match self.config.seeding {
            SeedStrategy::Shared => {
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                self.simulate_with_rng(policy, panel, &mut rng)?
            }
            SeedStrategy::PerTrial => self.simulate_per_trial(policy, panel)?,
        };

        let result = MonteCarloResult::from_terminal_values(self.config.seeding, terminal_values);
        let elapsed = start.elapsed();
        observability::record_simulation_completed(
            self.config.seeding.as_str(),
            result.terminal_values.len(),
            elapsed,
        );

        info!(
            trials = result.stats.count,
            mean = result.stats.mean,
            std_dev = result.stats.std_dev,
            p5 = result.stats.percentile_5,
            p95 = result.stats.percentile_95,
            elapsed_ms = elapsed.as_millis() as u64,
            "Monte Carlo simulation complete"
        );

        Ok(result)
    }

    /// Run every trial sequentially, drawing from one caller-supplied generator.
    ///
    /// The same generator state, policy and panel reproduce the same values.
    pub fn simulate_with_rng<P, R>(
        &self,
        policy: &mut P,
        panel: &PricePanel,
        rng: &mut R,
    ) -> Result<Vec<f64>>
    where
        P: Policy + ?Sized,
        R: Rng + ?Sized,
    {
        let pool = ReturnPool::from_panel(panel)?;
        let tracker = ProgressTracker::new(self.config.num_trials as u64);

        (0..self.config.num_trials)
            .map(|trial| {
                let value = self.run_trial(policy, &pool, rng, trial);
                self.report_progress(&tracker);
                value
            })
            .collect()
    }

    /// Run every trial with its own generator seeded `seed + i`.
    ///
    /// Runs on rayon when enabled and there are enough trials; the output is
    /// the same either way.
    pub fn simulate_per_trial<P>(&self, policy: &P, panel: &PricePanel) -> Result<Vec<f64>>
    where
        P: Policy + Clone + Send + Sync,
    {
        let pool = ReturnPool::from_panel(panel)?;
        let tracker = Arc::new(ProgressTracker::new(self.config.num_trials as u64));
        let parallel = &self.config.parallel;

        if !parallel.enabled || self.config.num_trials < parallel.min_parallel_trials {
            return (0..self.config.num_trials)
                .map(|trial| self.seeded_trial(policy, &pool, &tracker, trial))
                .collect();
        }

        let run = || {
            (0..self.config.num_trials)
                .into_par_iter()
                .map(|trial| self.seeded_trial(policy, &pool, &tracker, trial))
                .collect::<Result<Vec<f64>>>()
        };

        if parallel.max_threads > 0 {
            build_thread_pool(parallel)?.install(run)
        } else {
            run()
        }
    }

    fn seeded_trial<P>(
        &self,
        policy: &P,
        pool: &ReturnPool,
        tracker: &ProgressTracker,
        trial: usize,
    ) -> Result<f64>
    where
        P: Policy + Clone,
    {
        let trial_seed = self.config.seed.wrapping_add(trial as u64);
        let mut policy = policy.clone();
        policy.reseed(trial_seed ^ POLICY_SEED_SALT);
        let mut rng = StdRng::seed_from_u64(trial_seed);
        let value = self.run_trial(&mut policy, pool, &mut rng, trial);
        self.report_progress(tracker);
        value
    }

    fn run_trial<P, R>(
        &self,
        policy: &mut P,
        pool: &ReturnPool,
        rng: &mut R,
        trial: usize,
    ) -> Result<f64>
    where
        P: Policy + ?Sized,
        R: Rng + ?Sized,
    {
        let span = span!(Level::DEBUG, "monte_carlo_trial", trial);
        let _guard = span.enter();

        let outcome = self.execute_trial(policy, pool, rng);
        if let Err(err) = &outcome {
            observability::record_trial_failed(err.reason());
            warn!(error = %err, "Trial failed");
        }
        outcome
    }

    fn execute_trial<P, R>(&self, policy: &mut P, pool: &ReturnPool, rng: &mut R) -> Result<f64>
    where
        P: Policy + ?Sized,
        R: Rng + ?Sized,
    {
        let start = Instant::now();

        let synthetic = pool.synthetic_panel(rng, self.config.horizon_length)?;
        let mut env = PortfolioEnv::new(synthetic, self.env_config.clone())?;

        let deterministic = self.config.deterministic_policy;
        let mut observation = env.reset();
        loop {
            let action = policy.predict(&observation, deterministic);
            let transition = env.step(&action)?;
            if transition.done {
                break;
            }
            observation = transition.observation;
        }

        let terminal_value = env.portfolio_value();
        observability::record_trial_completed(terminal_value, start.elapsed());
        debug!(terminal_value, "Trial complete");

        Ok(terminal_value)
    }

    fn report_progress(&self, tracker: &ProgressTracker) {
        if let Some(progress) = tracker.trial_completed()
            && self.config.parallel.track_progress
        {
            debug!(
                completed = progress.completed,
                total = progress.total,
                trials_per_sec = progress.trials_per_sec,
                eta_secs = progress.eta_secs,
                "Progress: {:.1}%",
                progress.percentage()
            );
        }
    }
}

fn build_thread_pool(config: &ParallelConfig) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_threads)
        .thread_name(|i| format!("monte-carlo-{i}"))
        .build()
        .map_err(|e| SimulationError::ThreadPool {
            message: e.to_string(),
        })
}

/// Simulate `num_trials` futures with one shared generator seeded by `seed`.
///
/// Trials run with the default transaction cost and the policy in
/// deterministic mode. Returns one terminal value per trial.
pub fn simulate<P>(
    policy: &mut P,
    panel: &PricePanel,
    window_size: usize,
    num_trials: usize,
    horizon_length: usize,
    seed: u64,
) -> Result<Vec<f64>>
where
    P: Policy + ?Sized,
{
    let evaluator = MonteCarloEvaluator::builder()
        .window_size(window_size)
        .num_trials(num_trials)
        .horizon_length(horizon_length)
        .seed(seed)
        .build()?;
    let mut rng = StdRng::seed_from_u64(seed);
    evaluator.simulate_with_rng(policy, panel, &mut rng)
}

/// Builder for Monte Carlo evaluators.
#[derive(Debug, Default)]
pub struct MonteCarloEvaluatorBuilder {
    env_config: EnvConfig,
    config: MonteCarloConfig,
}

impl MonteCarloEvaluatorBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole engine configuration.
    #[must_use]
    pub fn env_config(mut self, env_config: EnvConfig) -> Self {
        self.env_config = env_config;
        self
    }

    /// Replace the whole run configuration.
    #[must_use]
    pub fn config(mut self, config: MonteCarloConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the observation window size.
    #[must_use]
    pub const fn window_size(mut self, window_size: usize) -> Self {
        self.env_config.window_size = window_size;
        self
    }

    /// Set the transaction cost rate.
    #[must_use]
    pub const fn transaction_cost_pct(mut self, cost: f64) -> Self {
        self.env_config.transaction_cost_pct = cost;
        self
    }

    /// Set number of trials.
    #[must_use]
    pub const fn num_trials(mut self, n: usize) -> Self {
        self.config.num_trials = n;
        self
    }

    /// Set synthetic horizon length.
    #[must_use]
    pub const fn horizon_length(mut self, rows: usize) -> Self {
        self.config.horizon_length = rows;
        self
    }

    /// Set random seed for reproducibility.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set seeding strategy.
    #[must_use]
    pub const fn seeding(mut self, seeding: SeedStrategy) -> Self {
        self.config.seeding = seeding;
        self
    }

    /// Set the `deterministic` flag passed to the policy.
    #[must_use]
    pub const fn deterministic_policy(mut self, deterministic: bool) -> Self {
        self.config.deterministic_policy = deterministic;
        self
    }

    /// Set parallel execution settings.
    #[must_use]
    pub fn parallel(mut self, parallel: ParallelConfig) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Build the evaluator.
    pub fn build(self) -> Result<MonteCarloEvaluator> {
        MonteCarloEvaluator::new(self.env_config, self.config)
    }
}
