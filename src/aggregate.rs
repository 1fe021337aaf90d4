//! Groups a `Transactions` table into one `WeeklySummary` per calendar week.

use crate::error::LoadError;
use crate::model::{Amount, Transaction, WeekStart, WeeklySummary, TOTAL_STR, UNITS_SOLD_STR};
use std::collections::BTreeMap;

/// Sums amounts and units per week. The result is ordered by ascending week, holds one entry per
/// week that has at least one transaction, and no sum is rounded.
///
/// A weekly sum that overflows fails the whole aggregation with a `ParseError` pointing at the
/// row that pushed it over.
pub fn weekly_summary<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Result<Vec<WeeklySummary>, LoadError> {
    let mut weeks: BTreeMap<WeekStart, (Amount, u64)> = BTreeMap::new();
    for transaction in transactions {
        let (amount, units) = weeks
            .entry(transaction.week_start())
            .or_insert((Amount::default(), 0));
        *amount = amount.checked_add(&transaction.total()).ok_or_else(|| {
            LoadError::parse(
                transaction.line(),
                TOTAL_STR,
                format!("The total for the week of {} overflows", transaction.week_start()),
            )
        })?;
        *units = units.checked_add(transaction.units_sold()).ok_or_else(|| {
            LoadError::parse(
                transaction.line(),
                UNITS_SOLD_STR,
                format!("The units for the week of {} overflow", transaction.week_start()),
            )
        })?;
    }

    Ok(weeks
        .into_iter()
        .map(|(week, (amount, units))| WeeklySummary::new(week, amount, units))
        .collect())
}
