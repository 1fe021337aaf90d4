use crate::model::{Amount, WeekStart};
use serde::Serialize;

/// The totals for one calendar week.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct WeeklySummary {
    week: WeekStart,
    total_amount: Amount,
    total_units: u64,
}

impl WeeklySummary {
    pub fn new(week: WeekStart, total_amount: Amount, total_units: u64) -> Self {
        Self {
            week,
            total_amount,
            total_units,
        }
    }

    pub fn week(&self) -> WeekStart {
        self.week
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn total_units(&self) -> u64 {
        self.total_units
    }
}
