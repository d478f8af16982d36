//! The portfolio simulation engine.

use std::fmt;

use tracing::{debug, warn};

use super::config::{EnvConfig, ZeroSumAction};
use super::types::{Observation, StepInfo, Transition};
use crate::error::{Result, SimulationError};
use crate::observability;
use crate::panel::PricePanel;

/// Guard added to the action sum in `ZeroSumAction::Epsilon` mode.
pub const NORMALIZATION_EPSILON: f64 = 1e-8;

/// One allocation episode over a fixed price panel.
///
/// The cursor `t` points at the next row to be realized: a step applies the
/// new allocation to the move from row `t - 1` to row `t`, then advances.
/// The episode ends once every row has been realized (`t == len`).
#[derive(Debug, Clone)]
pub struct PortfolioEnv {
    panel: PricePanel,
    config: EnvConfig,
    cursor: usize,
    weights: Vec<f64>,
    portfolio_value: f64,
}

impl PortfolioEnv {
    /// Create an engine over `panel`, already reset.
    pub fn new(panel: PricePanel, config: EnvConfig) -> Result<Self> {
        config.validate()?;

        if panel.len() < 2 {
            return Err(SimulationError::configuration(format!(
                "panel needs at least 2 rows, got {}",
                panel.len()
            )));
        }
        if config.window_size >= panel.len() {
            return Err(SimulationError::configuration(format!(
                "window_size {} must be smaller than panel length {}",
                config.window_size,
                panel.len()
            )));
        }

        let n_assets = panel.n_assets();
        let mut env = Self {
            panel,
            config,
            cursor: 0,
            weights: vec![0.0; n_assets + 1],
            portfolio_value: 1.0,
        };
        env.reset();
        Ok(env)
    }

    /// Start a new episode: all cash, value 1.0, cursor at `window_size`.
    pub fn reset(&mut self) -> Observation {
        self.cursor = self.config.window_size;
        self.weights.fill(0.0);
        if let Some(cash) = self.weights.last_mut() {
            *cash = 1.0;
        }
        self.portfolio_value = 1.0;
        self.observation()
    }

    /// Apply `action` (raw weights for every asset then cash) for one period.
    pub fn step(&mut self, action: &[f64]) -> Result<Transition> {
        if self.is_done() {
            return Err(SimulationError::OutOfRange {
                cursor: self.cursor,
                len: self.panel.len(),
            });
        }

        let weights = self.normalize(action)?;
        let returns = asset_returns(
            self.panel.row(self.cursor - 1),
            self.panel.row(self.cursor),
        );

        let portfolio_return: f64 = weights.iter().zip(&returns).map(|(w, r)| w * r).sum();
        let turnover: f64 = weights
            .iter()
            .zip(&self.weights)
            .map(|(new, old)| (new - old).abs())
            .sum();
        let transaction_cost = self.config.transaction_cost_pct * turnover;
        let reward = portfolio_return - transaction_cost;

        let growth = if self.config.charge_costs_to_equity {
            reward
        } else {
            portfolio_return
        };
        self.portfolio_value *= 1.0 + growth;

        self.weights = weights;
        self.cursor += 1;
        let done = self.is_done();

        let info = StepInfo {
            portfolio_value: self.portfolio_value,
            portfolio_return,
            transaction_cost,
            timestamp: self.panel.timestamp(self.cursor - 1),
        };

        if done {
            debug!(
                steps = self.steps_taken(),
                portfolio_value = self.portfolio_value,
                "Episode complete"
            );
            observability::record_episode_completed(self.steps_taken(), self.portfolio_value);
        }

        Ok(Transition {
            observation: self.observation(),
            reward,
            done,
            info,
        })
    }

    /// Current observation: trailing window ending at row `t - 1`, then weights.
    #[must_use]
    pub fn observation(&self) -> Observation {
        let window = self
            .panel
            .rows(self.cursor - self.config.window_size, self.cursor);
        let mut values = Vec::with_capacity(self.observation_dim());
        values.extend_from_slice(window);
        values.extend_from_slice(&self.weights);
        Observation::new(values, window.len())
    }

    fn normalize(&self, action: &[f64]) -> Result<Vec<f64>> {
        let expected = self.action_dim();
        if action.len() != expected {
            return Err(SimulationError::invalid_action(format!(
                "expected {expected} weights, got {}",
                action.len()
            )));
        }
        if let Some(i) = action.iter().position(|a| !a.is_finite()) {
            return Err(SimulationError::invalid_action(format!(
                "weight {i} is not finite: {}",
                action[i]
            )));
        }
        if let Some(i) = action.iter().position(|a| *a < 0.0) {
            return Err(SimulationError::invalid_action(format!(
                "weight {i} is negative: {}",
                action[i]
            )));
        }

        let sum: f64 = action.iter().sum();
        if !sum.is_finite() {
            return Err(SimulationError::invalid_action("weights overflow when summed"));
        }

        match self.config.zero_sum_action {
            ZeroSumAction::Epsilon => {
                if sum == 0.0 {
                    warn!(
                        cursor = self.cursor,
                        "Zero-sum action normalized to an empty allocation"
                    );
                }
                let denom = sum + NORMALIZATION_EPSILON;
                Ok(action.iter().map(|a| a / denom).collect())
            }
            ZeroSumAction::HoldPrevious if sum == 0.0 => {
                debug!(cursor = self.cursor, "Zero-sum action, holding previous allocation");
                Ok(self.weights.clone())
            }
            ZeroSumAction::Reject if sum == 0.0 => Err(SimulationError::invalid_action(
                "weights sum to zero",
            )),
            ZeroSumAction::HoldPrevious | ZeroSumAction::Reject => {
                Ok(action.iter().map(|a| a / sum).collect())
            }
        }
    }

    /// Whether every panel row has been realized.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.panel.len()
    }

    /// Time cursor `t`.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Steps taken since the last reset.
    #[must_use]
    pub const fn steps_taken(&self) -> usize {
        self.cursor - self.config.window_size
    }

    /// Steps an episode over this panel takes from reset to termination.
    #[must_use]
    pub fn episode_length(&self) -> usize {
        self.panel.len() - self.config.window_size
    }

    /// Current allocation (assets then cash).
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Cumulative portfolio value.
    #[must_use]
    pub const fn portfolio_value(&self) -> f64 {
        self.portfolio_value
    }

    /// The panel this engine runs over.
    #[must_use]
    pub const fn panel(&self) -> &PricePanel {
        &self.panel
    }

    /// Engine parameters.
    #[must_use]
    pub const fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Number of risky assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.panel.n_assets()
    }

    /// Length of an action vector (assets plus cash).
    #[must_use]
    pub fn action_dim(&self) -> usize {
        self.n_assets() + 1
    }

    /// Length of an observation vector.
    #[must_use]
    pub fn observation_dim(&self) -> usize {
        self.config.window_size * self.n_assets() + self.action_dim()
    }
}

impl fmt::Display for PortfolioEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step: {}, Portfolio Value: {:.4}, Weights: [",
            self.cursor, self.portfolio_value
        )?;
        for (i, w) in self.weights.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{w:.4}")?;
        }
        write!(f, "]")
    }
}

/// Simple returns from `prev` to `curr`, with a trailing zero for cash.
fn asset_returns(prev: &[f64], curr: &[f64]) -> Vec<f64> {
    let mut returns: Vec<f64> = prev.iter().zip(curr).map(|(p, c)| c / p - 1.0).collect();
    returns.push(0.0);
    returns
}
