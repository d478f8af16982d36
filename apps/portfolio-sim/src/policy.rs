//! Allocation policies.
//!
//! The engine and the Monte Carlo evaluator only need one operation from a
//! policy: map an observation to a raw action vector (one weight per asset,
//! then cash). How the policy was produced is irrelevant to them, so a
//! learned model, a fixed rule or a random baseline are interchangeable.
//!
//! Baselines infer the action length from the observation's allocation part,
//! so the same instance works for any panel width.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::env::Observation;

/// Maps observations to raw allocation actions.
pub trait Policy {
    /// Choose an action for `observation`.
    ///
    /// `deterministic` asks stochastic policies for their most likely action
    /// instead of a sample.
    fn predict(&mut self, observation: &Observation, deterministic: bool) -> Vec<f64>;

    /// Short name used in logs and reports.
    fn name(&self) -> &str {
        "custom"
    }

    /// Restart any internal randomness from `seed`.
    ///
    /// Called on each trial's copy of the policy so stochastic policies draw
    /// independent action streams. Deterministic policies ignore it.
    fn reseed(&mut self, _seed: u64) {}
}

impl<P: Policy + ?Sized> Policy for &mut P {
    fn predict(&mut self, observation: &Observation, deterministic: bool) -> Vec<f64> {
        (**self).predict(observation, deterministic)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn reseed(&mut self, seed: u64) {
        (**self).reseed(seed);
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn predict(&mut self, observation: &Observation, deterministic: bool) -> Vec<f64> {
        (**self).predict(observation, deterministic)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn reseed(&mut self, seed: u64) {
        (**self).reseed(seed);
    }
}

/// Always holds everything in cash.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashPolicy;

impl Policy for CashPolicy {
    fn predict(&mut self, observation: &Observation, _deterministic: bool) -> Vec<f64> {
        let n = observation.allocation().len();
        let mut action = vec![0.0; n];
        if let Some(cash) = action.last_mut() {
            *cash = 1.0;
        }
        action
    }

    fn name(&self) -> &str {
        "cash"
    }
}

/// Splits the portfolio evenly across every risky asset, no cash.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeightPolicy;

impl Policy for EqualWeightPolicy {
    fn predict(&mut self, observation: &Observation, _deterministic: bool) -> Vec<f64> {
        let n = observation.allocation().len();
        let mut action = vec![1.0; n];
        if let Some(cash) = action.last_mut() {
            *cash = 0.0;
        }
        action
    }

    fn name(&self) -> &str {
        "equal_weight"
    }
}

/// Returns the same raw weights every step.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPolicy {
    weights: Vec<f64>,
}

impl ConstantPolicy {
    /// Policy emitting `weights` (assets then cash) on every step.
    #[must_use]
    pub const fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    /// The emitted weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl Policy for ConstantPolicy {
    fn predict(&mut self, _observation: &Observation, _deterministic: bool) -> Vec<f64> {
        self.weights.clone()
    }

    fn name(&self) -> &str {
        "constant"
    }
}

/// Uniform random raw weights from a seeded generator.
///
/// In deterministic mode it returns the mean action, which after
/// normalization is an equal split across assets and cash.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Seeded random policy.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn predict(&mut self, observation: &Observation, deterministic: bool) -> Vec<f64> {
        let n = observation.allocation().len();
        if deterministic {
            return vec![0.5; n];
        }
        (0..n).map(|_| self.rng.random::<f64>()).collect()
    }

    fn name(&self) -> &str {
        "random"
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Baseline policy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Hold cash.
    Cash,
    /// Equal weight across risky assets.
    #[default]
    EqualWeight,
    /// Fixed raw weights (assets then cash).
    Constant {
        /// Raw weights.
        weights: Vec<f64>,
    },
    /// Seeded uniform random weights.
    Random {
        /// Generator seed.
        seed: u64,
    },
}

/// Closed set of baseline policies, cloneable for per-trial execution.
#[derive(Debug, Clone)]
pub enum BaselinePolicy {
    /// See [`CashPolicy`].
    Cash(CashPolicy),
    /// See [`EqualWeightPolicy`].
    EqualWeight(EqualWeightPolicy),
    /// See [`ConstantPolicy`].
    Constant(ConstantPolicy),
    /// See [`RandomPolicy`].
    Random(RandomPolicy),
}

impl BaselinePolicy {
    /// Build the configured baseline.
    #[must_use]
    pub fn from_config(config: &PolicyConfig) -> Self {
        match config {
            PolicyConfig::Cash => Self::Cash(CashPolicy),
            PolicyConfig::EqualWeight => Self::EqualWeight(EqualWeightPolicy),
            PolicyConfig::Constant { weights } => {
                Self::Constant(ConstantPolicy::new(weights.clone()))
            }
            PolicyConfig::Random { seed } => Self::Random(RandomPolicy::new(*seed)),
        }
    }
}

impl Policy for BaselinePolicy {
    fn predict(&mut self, observation: &Observation, deterministic: bool) -> Vec<f64> {
        match self {
            Self::Cash(p) => p.predict(observation, deterministic),
            Self::EqualWeight(p) => p.predict(observation, deterministic),
            Self::Constant(p) => p.predict(observation, deterministic),
            Self::Random(p) => p.predict(observation, deterministic),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Cash(p) => p.name(),
            Self::EqualWeight(p) => p.name(),
            Self::Constant(p) => p.name(),
            Self::Random(p) => p.name(),
        }
    }

    fn reseed(&mut self, seed: u64) {
        if let Self::Random(p) = self {
            p.reseed(seed);
        }
    }
}
