//! Types that represent the core data model: the loaded `Transactions` table and the
//! `WeeklySummary` rows computed from it.
mod amount;
mod date;
mod mapping;
mod summary;
mod transaction;

pub use amount::{Amount, AmountError, AmountFormat};
pub use date::{DateError, TransactionDate, WeekStart};
pub use mapping::{Header, Mapping, MappingError};
pub use summary::WeeklySummary;
pub use transaction::{
    Transaction, Transactions, UnitsSource, DATE_STR, TOTAL_STR, UNITS_SOLD_STR, WEEK_STR,
};
