//! Portfolio allocation environment.
//!
//! Owns one episode's state over a fixed price panel:
//! - Time cursor, current allocation and cumulative portfolio value
//! - Observation construction (price window + allocation)
//! - Reward and turnover-cost accounting per step
//!
//! # Example
//!
//! ```ignore
//! use portfolio_sim::env::{EnvConfig, PortfolioEnv};
//! use portfolio_sim::panel::PricePanel;
//!
//! let panel = PricePanel::from_rows(rows)?;
//! let mut env = PortfolioEnv::new(panel, EnvConfig::new(50, 0.001))?;
//!
//! let mut obs = env.reset();
//! loop {
//!     let action = policy.predict(&obs, true);
//!     let transition = env.step(&action)?;
//!     obs = transition.observation;
//!     if transition.done {
//!         break;
//!     }
//! }
//! println!("final value: {}", env.portfolio_value());
//! ```

mod config;
mod engine;
mod types;

pub use config::{EnvConfig, ZeroSumAction};
pub use engine::{NORMALIZATION_EPSILON, PortfolioEnv};
pub use types::{Observation, StepInfo, Transition};

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::SimulationError;
    use crate::panel::PricePanel;

    fn constant_panel(rows: usize, assets: usize) -> PricePanel {
        PricePanel::from_rows(vec![vec![100.0; assets]; rows]).unwrap()
    }

    fn trending_panel() -> PricePanel {
        PricePanel::from_rows(vec![
            vec![100.0, 50.0],
            vec![102.0, 49.0],
            vec![101.0, 51.0],
            vec![105.0, 52.0],
            vec![107.0, 50.0],
        ])
        .unwrap()
    }

    fn all_cash(assets: usize) -> Vec<f64> {
        let mut action = vec![0.0; assets + 1];
        action[assets] = 1.0;
        action
    }

    #[test]
    fn test_reset_state() {
        let mut env = PortfolioEnv::new(trending_panel(), EnvConfig::new(2, 0.001)).unwrap();
        let obs = env.reset();

        assert_eq!(env.cursor(), 2);
        assert_eq!(env.weights(), &[0.0, 0.0, 1.0]);
        assert_eq!(env.portfolio_value(), 1.0);
        assert_eq!(obs.len(), env.observation_dim());
        assert_eq!(obs.window(), &[100.0, 50.0, 102.0, 49.0]);
        assert_eq!(obs.allocation(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_dimensions() {
        let env = PortfolioEnv::new(constant_panel(60, 3), EnvConfig::default()).unwrap();
        assert_eq!(env.action_dim(), 4);
        assert_eq!(env.observation_dim(), 50 * 3 + 4);
        assert_eq!(env.episode_length(), 10);
    }

    #[test]
    fn test_all_cash_scenario() {
        // 3 assets, 52 constant rows, window 50: two steps, nothing moves
        let mut env = PortfolioEnv::new(constant_panel(52, 3), EnvConfig::new(50, 0.001)).unwrap();
        env.reset();

        // Epsilon normalization leaves cash at 1 - 1e-8, so the first step
        // pays a cost on that sliver of turnover
        let first = env.step(&all_cash(3)).unwrap();
        assert!(!first.done);
        assert!(first.info.transaction_cost.abs() < 1e-9);
        assert!(first.reward.abs() < 1e-9);
        assert_eq!(first.info.portfolio_value, 1.0);

        let second = env.step(&all_cash(3)).unwrap();
        assert!(second.done);
        assert_eq!(second.info.transaction_cost, 0.0);
        assert_eq!(second.reward, 0.0);
        assert_eq!(env.portfolio_value(), 1.0);
    }

    #[test]
    fn test_doubling_asset_scenario() {
        let panel = PricePanel::from_rows(vec![
            vec![10.0, 5.0],
            vec![10.0, 5.0],
            vec![20.0, 5.0],
        ])
        .unwrap();
        let mut env = PortfolioEnv::new(panel, EnvConfig::new(2, 0.001)).unwrap();
        env.reset();

        let transition = env.step(&[1.0, 0.0, 0.0]).unwrap();
        assert!((transition.info.portfolio_return - 1.0).abs() < 1e-7);

        // Full switch out of cash turns over two units
        assert!((transition.info.transaction_cost - 0.002).abs() < 1e-9);
        assert_eq!(
            transition.reward,
            transition.info.portfolio_return - transition.info.transaction_cost
        );
        assert!(transition.done);
    }

    #[test]
    fn test_cost_not_compounded_by_default() {
        let panel = PricePanel::from_rows(vec![vec![10.0], vec![10.0], vec![11.0]]).unwrap();
        let mut env = PortfolioEnv::new(panel, EnvConfig::new(1, 0.01)).unwrap();
        env.reset();

        let first = env.step(&[1.0, 0.0]).unwrap();
        assert!(first.info.transaction_cost > 0.0);
        assert!(first.reward < 0.0);
        // Flat move: value untouched even though a cost was charged
        assert_eq!(env.portfolio_value(), 1.0);

        let second = env.step(&[1.0, 0.0]).unwrap();
        assert!((second.info.portfolio_value - (1.0 + second.info.portfolio_return)).abs() < 1e-15);
    }

    #[test]
    fn test_cost_compounded_when_enabled() {
        let panel = PricePanel::from_rows(vec![vec![10.0], vec![10.0], vec![11.0]]).unwrap();
        let config = EnvConfig::new(1, 0.01).with_costs_charged_to_equity(true);
        let mut env = PortfolioEnv::new(panel, config).unwrap();
        env.reset();

        let first = env.step(&[1.0, 0.0]).unwrap();
        assert!((env.portfolio_value() - (1.0 + first.reward)).abs() < 1e-15);
        assert!(env.portfolio_value() < 1.0);
    }

    #[test]
    fn test_all_cash_scenario_is_exact_without_epsilon() {
        let config = EnvConfig::new(50, 0.001).with_zero_sum_action(ZeroSumAction::HoldPrevious);
        let mut env = PortfolioEnv::new(constant_panel(52, 3), config).unwrap();
        env.reset();

        let first = env.step(&all_cash(3)).unwrap();
        assert_eq!(first.info.transaction_cost, 0.0);
        assert_eq!(first.reward, 0.0);
        assert_eq!(env.weights(), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_cash_contributes_nothing() {
        let mut env = PortfolioEnv::new(trending_panel(), EnvConfig::new(1, 0.0)).unwrap();
        env.reset();

        let transition = env.step(&all_cash(2)).unwrap();
        assert_eq!(transition.info.portfolio_return, 0.0);
        assert_eq!(transition.reward, 0.0);
    }

    #[test]
    fn test_step_after_done_is_out_of_range() {
        let mut env = PortfolioEnv::new(constant_panel(3, 1), EnvConfig::new(2, 0.0)).unwrap();
        env.reset();

        let last = env.step(&[0.5, 0.5]).unwrap();
        assert!(last.done);
        assert_eq!(env.cursor(), 3);

        let err = env.step(&[0.5, 0.5]).unwrap_err();
        assert_eq!(err, SimulationError::OutOfRange { cursor: 3, len: 3 });
    }

    #[test]
    fn test_reset_after_done_starts_over() {
        let mut env = PortfolioEnv::new(trending_panel(), EnvConfig::new(3, 0.001)).unwrap();
        env.reset();
        while !env.is_done() {
            env.step(&[1.0, 0.0, 0.0]).unwrap();
        }
        assert_ne!(env.portfolio_value(), 1.0);

        env.reset();
        assert_eq!(env.cursor(), 3);
        assert_eq!(env.portfolio_value(), 1.0);
        assert!(env.step(&[1.0, 0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_construction_errors() {
        let err = PortfolioEnv::new(constant_panel(10, 2), EnvConfig::new(10, 0.0)).unwrap_err();
        assert!(matches!(err, SimulationError::Configuration { .. }));

        let err = PortfolioEnv::new(constant_panel(1, 2), EnvConfig::new(1, 0.0)).unwrap_err();
        assert!(err.to_string().contains("at least 2 rows"));

        let err = PortfolioEnv::new(constant_panel(10, 2), EnvConfig::new(0, 0.0)).unwrap_err();
        assert!(matches!(err, SimulationError::Configuration { .. }));
    }

    #[test]
    fn test_invalid_actions() {
        let mut env = PortfolioEnv::new(trending_panel(), EnvConfig::new(2, 0.0)).unwrap();
        env.reset();

        for action in [
            vec![0.5, 0.5],
            vec![0.5, 0.5, 0.0, 0.0],
            vec![f64::NAN, 0.5, 0.5],
            vec![f64::INFINITY, 0.0, 0.0],
            vec![-0.1, 0.6, 0.5],
        ] {
            let err = env.step(&action).unwrap_err();
            assert!(
                matches!(err, SimulationError::InvalidAction { .. }),
                "action {action:?} should be rejected"
            );
        }
        // Rejected actions never advance the episode
        assert_eq!(env.cursor(), 2);
    }

    #[test]
    fn test_zero_sum_epsilon_mode() {
        let mut env = PortfolioEnv::new(trending_panel(), EnvConfig::new(2, 0.001)).unwrap();
        env.reset();

        let transition = env.step(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(env.weights(), &[0.0, 0.0, 0.0]);
        assert_eq!(transition.info.portfolio_return, 0.0);
        // Leaving the all-cash allocation costs one unit of turnover
        assert!((transition.info.transaction_cost - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_zero_sum_hold_previous_mode() {
        let config = EnvConfig::new(2, 0.001).with_zero_sum_action(ZeroSumAction::HoldPrevious);
        let mut env = PortfolioEnv::new(trending_panel(), config).unwrap();
        env.reset();

        env.step(&[1.0, 3.0, 0.0]).unwrap();
        assert_eq!(env.weights(), &[0.25, 0.75, 0.0]);

        let transition = env.step(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(env.weights(), &[0.25, 0.75, 0.0]);
        assert_eq!(transition.info.transaction_cost, 0.0);
    }

    #[test]
    fn test_zero_sum_reject_mode() {
        let config = EnvConfig::new(2, 0.001).with_zero_sum_action(ZeroSumAction::Reject);
        let mut env = PortfolioEnv::new(trending_panel(), config).unwrap();
        env.reset();

        let err = env.step(&[0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidAction { .. }));
        assert_eq!(env.cursor(), 2);
    }

    #[test]
    fn test_timestamps_follow_realized_row() {
        let dates: Vec<NaiveDate> = (2..=4)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        let panel = PricePanel::new(
            vec!["A".to_string()],
            dates.clone(),
            vec![vec![1.0], vec![1.1], vec![1.2]],
        )
        .unwrap();
        let mut env = PortfolioEnv::new(panel, EnvConfig::new(1, 0.0)).unwrap();
        env.reset();

        let first = env.step(&[1.0, 0.0]).unwrap();
        assert_eq!(first.info.timestamp, Some(dates[1]));
        let second = env.step(&[1.0, 0.0]).unwrap();
        assert_eq!(second.info.timestamp, Some(dates[2]));

        let mut undated =
            PortfolioEnv::new(constant_panel(3, 1), EnvConfig::new(1, 0.0)).unwrap();
        assert_eq!(undated.step(&[1.0, 0.0]).unwrap().info.timestamp, None);
    }

    #[test]
    fn test_observation_slides_with_cursor() {
        let mut env = PortfolioEnv::new(trending_panel(), EnvConfig::new(2, 0.0)).unwrap();
        env.reset();

        let transition = env.step(&[1.0, 1.0, 0.0]).unwrap();
        assert_eq!(transition.observation.window(), &[102.0, 49.0, 101.0, 51.0]);
        assert_eq!(transition.observation.allocation(), env.weights());
    }
}
