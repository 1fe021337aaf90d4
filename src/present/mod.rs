//! Turns a loaded table and its weekly summary into everything the page displays.

mod chart;
mod grid;

pub use chart::Figure;
pub use grid::{Grid, GridPage, PAGE_SIZE};

use crate::model::{Transactions, WeeklySummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Both charts and the grid, always built together from the same table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Identifies the publication this dashboard belongs to. Zero until it is published.
    snapshot: u64,
    /// Describes where the table came from, e.g. a path or an uploaded file name.
    source: String,
    loaded_at: DateTime<Utc>,
    summary: Vec<WeeklySummary>,
    amount_chart: Figure,
    units_chart: Figure,
    grid: Grid,
}

impl Dashboard {
    pub fn new(
        source: impl Into<String>,
        transactions: &Transactions,
        summary: Vec<WeeklySummary>,
    ) -> Self {
        Self {
            snapshot: 0,
            source: source.into(),
            loaded_at: Utc::now(),
            amount_chart: Figure::weekly_amount(&summary),
            units_chart: Figure::weekly_units(&summary),
            grid: Grid::new(transactions),
            summary,
        }
    }

    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: u64) {
        self.snapshot = snapshot;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn summary(&self) -> &[WeeklySummary] {
        &self.summary
    }

    pub fn amount_chart(&self) -> &Figure {
        &self.amount_chart
    }

    pub fn units_chart(&self) -> &Figure {
        &self.units_chart
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Returns 1-based grid page `number`, tagged with this dashboard's snapshot.
    pub fn page(&self, number: usize) -> GridPage<'_> {
        self.grid.page(number).with_snapshot(self.snapshot)
    }

    /// What `GET /api/dashboard` returns: the charts plus the first grid page.
    pub fn view(&self) -> DashboardView<'_> {
        DashboardView {
            snapshot: self.snapshot,
            source: &self.source,
            loaded_at: self.loaded_at,
            summary: &self.summary,
            amount_chart: &self.amount_chart,
            units_chart: &self.units_chart,
            columns: self.grid.columns(),
            grid: self.page(1),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    snapshot: u64,
    source: &'a str,
    loaded_at: DateTime<Utc>,
    summary: &'a [WeeklySummary],
    amount_chart: &'a Figure,
    units_chart: &'a Figure,
    columns: &'a [String],
    grid: GridPage<'a>,
}
