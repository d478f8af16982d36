//! Progress tracking for Monte Carlo trials.
//!
//! Workers bump a shared atomic counter; only the trial that lands on a
//! reporting stride (every tenth of the run, and the last trial) gets a
//! snapshot back, so logging stays proportional to the run, not its size.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Number of progress reports a run is split into.
const REPORTS_PER_RUN: u64 = 10;

/// Lock-free trial counter shared across worker threads.
#[derive(Debug)]
pub struct ProgressTracker {
    total: u64,
    stride: u64,
    completed: AtomicU64,
    started: Instant,
}

impl ProgressTracker {
    /// Tracker for a run of `total` trials.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            stride: (total / REPORTS_PER_RUN).max(1),
            completed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Trials between two reports.
    #[must_use]
    pub const fn stride(&self) -> u64 {
        self.stride
    }

    /// Count one finished trial.
    ///
    /// Returns a snapshot when this trial lands on a reporting stride or
    /// finishes the run, `None` otherwise.
    pub fn trial_completed(&self) -> Option<Progress> {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        (completed % self.stride == 0 || completed == self.total)
            .then(|| self.snapshot(completed))
    }

    /// Current progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.snapshot(self.completed.load(Ordering::Relaxed))
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn snapshot(&self, completed: u64) -> Progress {
        let elapsed = self.started.elapsed().as_secs_f64();
        let trials_per_sec = if elapsed > 0.0 {
            completed as f64 / elapsed
        } else {
            0.0
        };
        let remaining = self.total.saturating_sub(completed);
        let eta_secs = if trials_per_sec > 0.0 {
            (remaining as f64 / trials_per_sec) as u64
        } else {
            0
        };

        Progress {
            total: self.total,
            completed,
            elapsed_secs: elapsed as u64,
            eta_secs,
            trials_per_sec,
        }
    }
}

/// Progress snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Trials in the run.
    pub total: u64,
    /// Trials finished so far.
    pub completed: u64,
    /// Seconds since the tracker was created.
    pub elapsed_secs: u64,
    /// Estimated seconds remaining.
    pub eta_secs: u64,
    /// Throughput so far.
    pub trials_per_sec: f64,
}

impl Progress {
    /// Completion percentage; an empty run counts as complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    /// Whether every trial has finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}
