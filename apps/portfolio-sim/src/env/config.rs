//! Configuration for the portfolio simulation engine.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// How the engine treats an action whose weights sum to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSumAction {
    /// Divide every action by `sum + 1e-8`.
    ///
    /// A zero-sum action becomes an all-zero allocation instead of failing.
    /// Non-zero actions sum to `sum / (sum + 1e-8)`, which is within 1e-6 of
    /// one whenever the raw sum is at least 0.01.
    #[default]
    Epsilon,
    /// Divide by the exact sum; keep the previous allocation on a zero sum.
    HoldPrevious,
    /// Divide by the exact sum; fail with `InvalidAction` on a zero sum.
    Reject,
}

/// Engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Number of trailing panel rows in each observation.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Cost charged per unit of L1 turnover (0.001 = 10 bps).
    #[serde(default = "default_transaction_cost_pct")]
    pub transaction_cost_pct: f64,
    /// Zero-sum action handling.
    #[serde(default)]
    pub zero_sum_action: ZeroSumAction,
    /// Compound the transaction cost into the portfolio value.
    ///
    /// When `false` the cost only reduces the reward, so the tracked value
    /// follows the gross portfolio return.
    #[serde(default)]
    pub charge_costs_to_equity: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            transaction_cost_pct: default_transaction_cost_pct(),
            zero_sum_action: ZeroSumAction::default(),
            charge_costs_to_equity: false,
        }
    }
}

impl EnvConfig {
    /// Config with the given window and cost, defaults elsewhere.
    #[must_use]
    pub fn new(window_size: usize, transaction_cost_pct: f64) -> Self {
        Self {
            window_size,
            transaction_cost_pct,
            ..Default::default()
        }
    }

    /// Set the zero-sum action policy.
    #[must_use]
    pub const fn with_zero_sum_action(mut self, mode: ZeroSumAction) -> Self {
        self.zero_sum_action = mode;
        self
    }

    /// Set whether costs are compounded into the portfolio value.
    #[must_use]
    pub const fn with_costs_charged_to_equity(mut self, charge: bool) -> Self {
        self.charge_costs_to_equity = charge;
        self
    }

    /// Check parameters that do not depend on the panel.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SimulationError::configuration(
                "window_size must be positive",
            ));
        }
        let cost = self.transaction_cost_pct;
        if !cost.is_finite() || !(0.0..1.0).contains(&cost) {
            return Err(SimulationError::configuration(format!(
                "transaction_cost_pct must be in [0, 1), got {cost}"
            )));
        }
        Ok(())
    }
}

const fn default_window_size() -> usize {
    50
}

const fn default_transaction_cost_pct() -> f64 {
    0.001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert_eq!(config.window_size, 50);
        assert!((config.transaction_cost_pct - 0.001).abs() < f64::EPSILON);
        assert_eq!(config.zero_sum_action, ZeroSumAction::Epsilon);
        assert!(!config.charge_costs_to_equity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_config_validation() {
        assert!(EnvConfig::new(0, 0.001).validate().is_err());
        assert!(EnvConfig::new(10, -0.1).validate().is_err());
        assert!(EnvConfig::new(10, 1.0).validate().is_err());
        assert!(EnvConfig::new(10, f64::NAN).validate().is_err());
        assert!(EnvConfig::new(10, 0.0).validate().is_ok());
    }

    #[test]
    fn test_zero_sum_action_serde() {
        let mode: ZeroSumAction = serde_yaml_bw::from_str("hold_previous").unwrap();
        assert_eq!(mode, ZeroSumAction::HoldPrevious);
    }
}
