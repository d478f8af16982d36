//! Error types for the simulation core.
//!
//! None of these are recovered locally: every failure is a deterministic
//! consequence of the inputs, so the core surfaces it to the caller instead of
//! retrying.
//!
//! | Variant | Raised by | Meaning |
//! |---------|-----------|---------|
//! | `Configuration` | engine / evaluator construction | Invalid parameters |
//! | `InvalidAction` | `PortfolioEnv::step` | Malformed policy output |
//! | `OutOfRange` | `PortfolioEnv::step` | Stepping a finished episode |
//! | `InsufficientHistory` | Monte Carlo setup | Fewer than two historical rows |
//! | `InvalidPanel` | `PricePanel` construction | Ragged or non-positive prices |
//! | `ThreadPool` | parallel Monte Carlo | Dedicated rayon pool failed to build |

use thiserror::Error;

/// Errors raised by the simulation engine and the Monte Carlo evaluator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    /// Invalid construction parameters.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The policy produced an action the engine cannot apply.
    #[error("Invalid action: {reason}")]
    InvalidAction {
        /// Why the action was rejected.
        reason: String,
    },

    /// `step` was called after the episode terminated.
    #[error("Step out of range: cursor {cursor} has reached panel length {len}")]
    OutOfRange {
        /// Current time cursor.
        cursor: usize,
        /// Number of rows in the panel.
        len: usize,
    },

    /// Not enough historical rows to compute a return pool.
    #[error("Insufficient history: need at least {required} rows, got {available}")]
    InsufficientHistory {
        /// Minimum number of rows required.
        required: usize,
        /// Rows actually available.
        available: usize,
    },

    /// The price panel is malformed.
    #[error("Invalid price panel: {reason}")]
    InvalidPanel {
        /// What is wrong with the panel.
        reason: String,
    },

    /// A dedicated thread pool could not be created.
    #[error("Failed to initialize thread pool: {message}")]
    ThreadPool {
        /// Error message.
        message: String,
    },
}

impl SimulationError {
    /// Shorthand for a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for an invalid action error.
    pub fn invalid_action(reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            reason: reason.into(),
        }
    }

    /// Shorthand for an invalid panel error.
    pub fn invalid_panel(reason: impl Into<String>) -> Self {
        Self::InvalidPanel {
            reason: reason.into(),
        }
    }

    /// Stable reason string, used as a log/metric label.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION",
            Self::InvalidAction { .. } => "INVALID_ACTION",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::InsufficientHistory { .. } => "INSUFFICIENT_HISTORY",
            Self::InvalidPanel { .. } => "INVALID_PANEL",
            Self::ThreadPool { .. } => "THREAD_POOL",
        }
    }
}

/// Result alias for the simulation core.
pub type Result<T> = std::result::Result<T, SimulationError>;
