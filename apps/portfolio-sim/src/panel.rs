//! Price panel: the immutable multi-asset price table an episode runs over.
//!
//! A panel is a chronologically ordered sequence of rows, one price per asset
//! per row, with an optional date index. Prices are stored row-major in a
//! single buffer so that an observation window is one contiguous slice.
//!
//! Panels arrive from an external data collaborator already cleaned; the
//! constructor only rejects shapes and values the engine cannot run on.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "assets": ["AAPL", "MSFT"],
//!   "dates": ["2024-01-02", "2024-01-03"],
//!   "prices": [[185.6, 370.9], [184.3, 370.6]]
//! }
//! ```
//!
//! `dates` may be omitted.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Immutable multi-asset price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPanel", into = "RawPanel")]
pub struct PricePanel {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
    n_rows: usize,
}

/// Wire representation of a panel, validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPanel {
    assets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dates: Vec<NaiveDate>,
    prices: Vec<Vec<f64>>,
}

impl TryFrom<RawPanel> for PricePanel {
    type Error = SimulationError;

    fn try_from(raw: RawPanel) -> Result<Self> {
        Self::new(raw.assets, raw.dates, raw.prices)
    }
}

impl From<PricePanel> for RawPanel {
    fn from(panel: PricePanel) -> Self {
        let prices = (0..panel.n_rows).map(|i| panel.row(i).to_vec()).collect();
        Self {
            assets: panel.assets,
            dates: panel.dates,
            prices,
        }
    }
}

impl PricePanel {
    /// Build a panel from named assets, an optional date index and price rows.
    ///
    /// `dates` must be empty or hold one strictly increasing date per row.
    pub fn new(assets: Vec<String>, dates: Vec<NaiveDate>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_assets = assets.len();
        let mut prices = Vec::with_capacity(rows.len() * n_assets);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_assets {
                return Err(SimulationError::invalid_panel(format!(
                    "row {i} has {} prices, expected {n_assets}",
                    row.len()
                )));
            }
            prices.extend_from_slice(row);
        }
        Self::from_flat(assets, dates, prices)
    }

    /// Build a panel from a row-major price buffer.
    pub fn from_flat(assets: Vec<String>, dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self> {
        let n_assets = assets.len();
        if n_assets == 0 {
            return Err(SimulationError::invalid_panel(
                "panel must contain at least one asset",
            ));
        }
        if prices.len() % n_assets != 0 {
            return Err(SimulationError::invalid_panel(format!(
                "{} prices cannot be split into rows of {n_assets}",
                prices.len()
            )));
        }
        let n_rows = prices.len() / n_assets;

        if let Some(pos) = prices.iter().position(|p| !p.is_finite() || *p <= 0.0) {
            return Err(SimulationError::invalid_panel(format!(
                "price at row {} asset {} is not a positive finite number: {}",
                pos / n_assets,
                pos % n_assets,
                prices[pos]
            )));
        }

        if !dates.is_empty() {
            if dates.len() != n_rows {
                return Err(SimulationError::invalid_panel(format!(
                    "{} dates for {n_rows} rows",
                    dates.len()
                )));
            }
            if let Some(i) = dates.windows(2).position(|w| w[0] >= w[1]) {
                return Err(SimulationError::invalid_panel(format!(
                    "dates are not strictly increasing at row {}",
                    i + 1
                )));
            }
        }

        Ok(Self {
            assets,
            dates,
            prices,
            n_rows,
        })
    }

    /// Build an undated panel with generated asset names (`asset_0`, `asset_1`, ...).
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_assets = rows.first().map_or(0, Vec::len);
        let assets = (0..n_assets).map(|i| format!("asset_{i}")).collect();
        Self::new(assets, Vec::new(), rows)
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the panel has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Number of assets (columns).
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Asset names in column order.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Date index (empty for undated panels).
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Prices of one row.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let n = self.n_assets();
        &self.prices[index * n..(index + 1) * n]
    }

    /// Rows `start..end` flattened in chronological order.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    #[must_use]
    pub fn rows(&self, start: usize, end: usize) -> &[f64] {
        let n = self.n_assets();
        &self.prices[start * n..end * n]
    }

    /// Last row, if any.
    #[must_use]
    pub fn last_row(&self) -> Option<&[f64]> {
        self.n_rows.checked_sub(1).map(|i| self.row(i))
    }

    /// Date of a row, `None` for undated panels or out-of-range rows.
    #[must_use]
    pub fn timestamp(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    /// Date of the last row, if dated.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Price series of one asset.
    ///
    /// # Panics
    ///
    /// Panics if `asset >= n_assets()`.
    #[must_use]
    pub fn column(&self, asset: usize) -> Vec<f64> {
        (0..self.n_rows).map(|i| self.row(i)[asset]).collect()
    }

    /// The last `n` rows (the whole panel if `n >= len()`).
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        let start = self.n_rows.saturating_sub(n);
        self.slice(start, self.n_rows)
    }

    /// Split into `(head, tail)` where `tail` holds the last `n` rows.
    #[must_use]
    pub fn split_tail(&self, n: usize) -> (Self, Self) {
        let split = self.n_rows.saturating_sub(n);
        (self.slice(0, split), self.slice(split, self.n_rows))
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        let dates = if self.dates.is_empty() {
            Vec::new()
        } else {
            self.dates[start..end].to_vec()
        };
        Self {
            assets: self.assets.clone(),
            dates,
            prices: self.rows(start, end).to_vec(),
            n_rows: end - start,
        }
    }
}

/// The next `count` weekdays strictly after `last`.
///
/// Holidays are not modelled; the result matches a plain business-day calendar.
#[must_use]
pub fn business_days_after(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut day = last;
    while days.len() < count {
        let Some(next) = day.succ_opt() else {
            break;
        };
        day = next;
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
    }
    days
}
