//! Historical rollout evaluation.
//!
//! Runs a policy through one full episode over a real panel and summarizes
//! it against a buy-and-hold baseline.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::env::{PortfolioEnv, Transition};
use crate::error::{Result, SimulationError};
use crate::panel::PricePanel;
use crate::policy::Policy;

/// Every transition of one episode plus its equity curve.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeTrace {
    /// Transition records in step order.
    pub transitions: Vec<Transition>,
    /// Portfolio value before the first step and after every step.
    pub equity_curve: Vec<f64>,
}

impl EpisodeTrace {
    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether no step was taken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Portfolio value at the end of the episode.
    #[must_use]
    pub fn final_value(&self) -> f64 {
        self.equity_curve.last().copied().unwrap_or(1.0)
    }

    /// Sum of per-step rewards.
    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.transitions.iter().map(|t| t.reward).sum()
    }

    /// Sum of per-step transaction costs.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.transitions.iter().map(|t| t.info.transaction_cost).sum()
    }

    /// Summarize, optionally against a baseline equity curve.
    #[must_use]
    pub fn summarize(&self, baseline: Option<&[f64]>) -> EvaluationSummary {
        EvaluationSummary {
            steps: self.len(),
            final_value: self.final_value(),
            total_reward: self.total_reward(),
            total_cost: self.total_cost(),
            max_drawdown: max_drawdown(&self.equity_curve),
            baseline_final_value: baseline.and_then(|b| b.last().copied()),
        }
    }
}

/// Headline numbers of one evaluated episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Steps taken.
    pub steps: usize,
    /// Terminal portfolio value.
    pub final_value: f64,
    /// Sum of rewards.
    pub total_reward: f64,
    /// Sum of transaction costs.
    pub total_cost: f64,
    /// Largest peak-to-trough fall of the equity curve, as a fraction.
    pub max_drawdown: f64,
    /// Terminal value of the baseline curve, if one was given.
    pub baseline_final_value: Option<f64>,
}

/// Reset `env` and drive it with `policy` until the episode ends.
pub fn rollout<P>(env: &mut PortfolioEnv, policy: &mut P, deterministic: bool) -> Result<EpisodeTrace>
where
    P: Policy + ?Sized,
{
    let mut observation = env.reset();
    let mut transitions = Vec::with_capacity(env.episode_length());
    let mut equity_curve = Vec::with_capacity(env.episode_length() + 1);
    equity_curve.push(env.portfolio_value());

    loop {
        let action = policy.predict(&observation, deterministic);
        let transition = env.step(&action)?;
        equity_curve.push(transition.info.portfolio_value);
        observation = transition.observation.clone();
        let done = transition.done;
        transitions.push(transition);
        if done {
            break;
        }
    }

    info!(
        policy = policy.name(),
        steps = transitions.len(),
        final_value = env.portfolio_value(),
        "Rollout complete"
    );

    Ok(EpisodeTrace {
        transitions,
        equity_curve,
    })
}

/// Price of `asset` from row `window_size` onwards, normalized to 1.0 at
/// that row.
pub fn buy_and_hold_curve(panel: &PricePanel, window_size: usize, asset: usize) -> Result<Vec<f64>> {
    if window_size >= panel.len() {
        return Err(SimulationError::configuration(format!(
            "window_size {window_size} must be smaller than panel length {}",
            panel.len()
        )));
    }
    if asset >= panel.n_assets() {
        return Err(SimulationError::configuration(format!(
            "asset {asset} out of range for {} assets",
            panel.n_assets()
        )));
    }

    let base = panel.row(window_size)[asset];
    Ok((window_size..panel.len())
        .map(|i| panel.row(i)[asset] / base)
        .collect())
}

/// Largest relative fall from a running peak, 0.0 for a non-decreasing curve.
#[must_use]
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in curve {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst
}
