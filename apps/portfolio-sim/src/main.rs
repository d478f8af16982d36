//! Portfolio Sim Binary
//!
//! Evaluates a baseline allocation policy on the holdout slice of a price
//! panel, then stress-tests it with Monte Carlo resampling of that slice.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin portfolio-sim -- [config.yaml]
//! ```
//!
//! Without an argument `config.yaml` is used when present, built-in
//! defaults otherwise.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Overrides the configured log level
//! - Any `${VAR}` referenced from the config file

use std::path::Path;

use anyhow::{Context, anyhow};
use portfolio_sim::config::{Config, load_config, load_config_from_string};
use portfolio_sim::env::PortfolioEnv;
use portfolio_sim::evaluation::{buy_and_hold_curve, rollout};
use portfolio_sim::monte_carlo::MonteCarloEvaluator;
use portfolio_sim::observability::{MetricsConfig, init_metrics};
use portfolio_sim::policy::{BaselinePolicy, Policy};
use portfolio_sim::report::{EvaluationReport, MonteCarloReport, load_panel, write_json};
use portfolio_sim::telemetry::init_tracing;
use tracing::{info, warn};

/// Default config file looked up when no path is given.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn main() -> anyhow::Result<()> {
    let config = read_config()?;

    init_tracing(&config.observability.logging)
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))?;

    let metrics = if config.observability.metrics.enabled {
        Some(init_metrics(&MetricsConfig::default())?)
    } else {
        None
    };

    let panel = load_panel(&config.data.panel_path)?;
    let holdout = panel.tail(config.data.holdout_rows);
    if holdout.len() < config.data.holdout_rows {
        warn!(
            requested = config.data.holdout_rows,
            available = holdout.len(),
            "Panel shorter than holdout, using all rows"
        );
    }
    info!(
        rows = holdout.len(),
        first = ?holdout.dates().first(),
        last = ?holdout.last_date(),
        "Holdout slice selected"
    );

    let mut policy = BaselinePolicy::from_config(&config.policy);

    // Historical rollout
    let mut env = PortfolioEnv::new(holdout.clone(), config.environment.clone())
        .context("failed to build engine over holdout slice")?;
    let trace = rollout(&mut env, &mut policy, config.monte_carlo.deterministic_policy)?;
    let baseline = buy_and_hold_curve(&holdout, config.environment.window_size, 0)?;
    let evaluation = EvaluationReport::new(policy.name(), config.environment.clone(), &trace, baseline);

    info!(
        policy = policy.name(),
        final_value = evaluation.summary.final_value,
        buy_and_hold = ?evaluation.summary.baseline_final_value,
        max_drawdown = evaluation.summary.max_drawdown,
        total_cost = evaluation.summary.total_cost,
        "Historical evaluation"
    );
    write_json(&config.output.evaluation_report(), &evaluation)?;

    // Monte Carlo stress test
    let evaluator = MonteCarloEvaluator::new(config.environment.clone(), config.monte_carlo.clone())?;
    let mut mc_policy = BaselinePolicy::from_config(&config.policy);
    let result = evaluator.run(&mut mc_policy, &holdout)?;

    info!(
        "Monte Carlo Results over {} sims: mean {:.2}, std dev {:.2}, 5th percentile {:.2}, 95th percentile {:.2}",
        result.stats.count,
        result.stats.mean,
        result.stats.std_dev,
        result.stats.percentile_5,
        result.stats.percentile_95
    );

    let report = MonteCarloReport::new(
        mc_policy.name(),
        config.environment.clone(),
        config.monte_carlo.clone(),
        result,
    );
    write_json(&config.output.monte_carlo_report(), &report)?;

    if let Some(handle) = metrics {
        let path = config.output.metrics_snapshot();
        std::fs::write(&path, handle.render())
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Metrics snapshot written");
    }

    Ok(())
}

/// Config from the first argument, `config.yaml`, or defaults.
fn read_config() -> anyhow::Result<Config> {
    if let Some(path) = std::env::args().nth(1) {
        return Ok(load_config(Some(path.as_str()))?);
    }
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        return Ok(load_config(None)?);
    }
    // Validated defaults
    Ok(load_config_from_string("{}")?)
}
