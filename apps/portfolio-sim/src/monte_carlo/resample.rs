//! Bootstrap resampling of historical returns into synthetic price panels.

use chrono::NaiveDate;
use rand::Rng;

use crate::error::{Result, SimulationError};
use crate::panel::{PricePanel, business_days_after};

/// Row-over-row simple returns of a historical panel, plus the anchor a
/// synthetic path starts from.
#[derive(Debug, Clone)]
pub struct ReturnPool {
    assets: Vec<String>,
    returns: Vec<f64>,
    n_rows: usize,
    last_prices: Vec<f64>,
    last_date: Option<NaiveDate>,
}

impl ReturnPool {
    /// Build the pool from a historical panel with at least 2 rows.
    pub fn from_panel(panel: &PricePanel) -> Result<Self> {
        let Some(last_prices) = panel.last_row().filter(|_| panel.len() >= 2) else {
            return Err(SimulationError::InsufficientHistory {
                required: 2,
                available: panel.len(),
            });
        };

        let n_rows = panel.len() - 1;
        let mut returns = Vec::with_capacity(n_rows * panel.n_assets());
        for i in 1..panel.len() {
            let (prev, curr) = (panel.row(i - 1), panel.row(i));
            returns.extend(prev.iter().zip(curr).map(|(p, c)| c / p - 1.0));
        }

        Ok(Self {
            assets: panel.assets().to_vec(),
            returns,
            n_rows,
            last_prices: last_prices.to_vec(),
            last_date: panel.last_date(),
        })
    }

    /// Number of return rows available for drawing.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the pool is empty. Never true for a constructed pool.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Returns of one pool row.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let n = self.n_assets();
        &self.returns[index * n..(index + 1) * n]
    }

    /// Final historical prices, the base of every synthetic path.
    #[must_use]
    pub fn last_prices(&self) -> &[f64] {
        &self.last_prices
    }

    /// Draw `horizon` pool rows with replacement and compound them onto the
    /// last historical prices.
    ///
    /// Row `k` of the result is `last_prices * prod_{j<=k}(1 + r_j)`. The
    /// panel is dated with the business days following the historical panel
    /// when that panel was dated.
    pub fn synthetic_panel<R: Rng + ?Sized>(&self, rng: &mut R, horizon: usize) -> Result<PricePanel> {
        let n = self.n_assets();
        let mut growth = vec![1.0; n];
        let mut prices = Vec::with_capacity(horizon * n);

        for _ in 0..horizon {
            let drawn = self.row(rng.random_range(0..self.n_rows));
            for (g, r) in growth.iter_mut().zip(drawn) {
                *g *= 1.0 + r;
            }
            prices.extend(self.last_prices.iter().zip(&growth).map(|(p, g)| p * g));
        }

        let dates = self
            .last_date
            .map(|last| business_days_after(last, horizon))
            .unwrap_or_default();

        PricePanel::from_flat(self.assets.clone(), dates, prices)
    }
}
