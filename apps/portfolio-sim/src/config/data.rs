//! Input data and output location configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the price panel comes from and how much of it is held out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON price panel file.
    #[serde(default = "default_panel_path")]
    pub panel_path: PathBuf,
    /// Trailing rows used for evaluation and as Monte Carlo history.
    #[serde(default = "default_holdout_rows")]
    pub holdout_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            panel_path: default_panel_path(),
            holdout_rows: default_holdout_rows(),
        }
    }
}

/// Where reports are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report directory, created on demand.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl OutputConfig {
    /// Path of the Monte Carlo report.
    #[must_use]
    pub fn monte_carlo_report(&self) -> PathBuf {
        self.dir.join("monte_carlo.json")
    }

    /// Path of the historical evaluation report.
    #[must_use]
    pub fn evaluation_report(&self) -> PathBuf {
        self.dir.join("evaluation.json")
    }

    /// Path of the Prometheus metrics snapshot.
    #[must_use]
    pub fn metrics_snapshot(&self) -> PathBuf {
        self.dir.join("metrics.prom")
    }
}

fn default_panel_path() -> PathBuf {
    PathBuf::from("data/prices.json")
}

const fn default_holdout_rows() -> usize {
    250
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}
