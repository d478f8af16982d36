//! Configuration module for the simulator binary.
//!
//! Provides YAML configuration loading, validation, and environment
//! variable interpolation. Every section is optional and falls back to
//! its defaults.
//!
//! # Usage
//!
//! ```rust,ignore
//! use portfolio_sim::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! println!("trials: {}", config.monte_carlo.num_trials);
//! ```

mod data;
mod observability;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use data::{DataConfig, OutputConfig};
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};

use crate::env::EnvConfig;
use crate::monte_carlo::MonteCarloConfig;
use crate::policy::PolicyConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Engine parameters.
    #[serde(default)]
    pub environment: EnvConfig,
    /// Monte Carlo run parameters.
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    /// Baseline policy selection.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Input panel settings.
    #[serde(default)]
    pub data: DataConfig,
    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |e: crate::error::SimulationError| ConfigError::ValidationError(e.to_string());

    config.environment.validate().map_err(invalid)?;

    let window = config.environment.window_size;
    config.monte_carlo.validate(window).map_err(invalid)?;

    if config.data.holdout_rows <= window {
        return Err(ConfigError::ValidationError(format!(
            "data.holdout_rows ({}) must exceed environment.window_size ({window})",
            config.data.holdout_rows
        )));
    }

    if let PolicyConfig::Constant { weights } = &config.policy
        && (weights.is_empty() || weights.iter().any(|w| !w.is_finite() || *w < 0.0))
    {
        return Err(ConfigError::ValidationError(
            "policy.weights must be a non-empty list of non-negative numbers".to_string(),
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    let level = config.observability.logging.level.to_lowercase();
    if !valid_levels.contains(&level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.level must be one of: {valid_levels:?}"
        )));
    }

    let valid_formats = ["compact", "pretty", "full"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    Ok(())
}
