//! JSON reports and panel files.
//!
//! Reports go to caller-supplied paths; parent directories are created on
//! write. Nothing here keeps process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::env::{EnvConfig, StepInfo};
use crate::evaluation::{EpisodeTrace, EvaluationSummary};
use crate::monte_carlo::{MonteCarloConfig, MonteCarloResult};
use crate::panel::PricePanel;

/// Report and panel file errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error in {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Monte Carlo run written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloReport {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Policy name.
    pub policy: String,
    /// Engine configuration of every trial.
    pub environment: EnvConfig,
    /// Run configuration.
    pub monte_carlo: MonteCarloConfig,
    /// Terminal values and their statistics.
    pub result: MonteCarloResult,
}

impl MonteCarloReport {
    /// Stamp a finished run.
    #[must_use]
    pub fn new(
        policy: impl Into<String>,
        environment: EnvConfig,
        monte_carlo: MonteCarloConfig,
        result: MonteCarloResult,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            policy: policy.into(),
            environment,
            monte_carlo,
            result,
        }
    }
}

/// One step of an evaluated episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Reward of the step.
    pub reward: f64,
    /// Step metadata.
    #[serde(flatten)]
    pub info: StepInfo,
}

/// Historical rollout written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Policy name.
    pub policy: String,
    /// Engine configuration.
    pub environment: EnvConfig,
    /// Headline numbers.
    pub summary: EvaluationSummary,
    /// Policy equity curve, starting at 1.0.
    pub equity_curve: Vec<f64>,
    /// Buy-and-hold curve of the first asset.
    pub baseline_curve: Vec<f64>,
    /// Per-step records.
    pub steps: Vec<StepRecord>,
}

impl EvaluationReport {
    /// Build from a finished trace and its baseline.
    #[must_use]
    pub fn new(
        policy: impl Into<String>,
        environment: EnvConfig,
        trace: &EpisodeTrace,
        baseline_curve: Vec<f64>,
    ) -> Self {
        let steps = trace
            .transitions
            .iter()
            .map(|t| StepRecord {
                reward: t.reward,
                info: t.info,
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            policy: policy.into(),
            environment,
            summary: trace.summarize(Some(&baseline_curve)),
            equity_curve: trace.equity_curve.clone(),
            baseline_curve,
            steps,
        }
    }
}

/// Write `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Read a JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReportError> {
    let contents = fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a price panel from a JSON file.
///
/// Panel validation failures surface as JSON errors naming the offending
/// row or price.
pub fn load_panel(path: &Path) -> Result<PricePanel, ReportError> {
    let panel: PricePanel = read_json(path)?;
    info!(
        path = %path.display(),
        rows = panel.len(),
        assets = panel.n_assets(),
        "Price panel loaded"
    );
    Ok(panel)
}
