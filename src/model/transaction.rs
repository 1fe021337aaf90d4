use crate::error::LoadError;
use crate::model::mapping::{Header, Mapping};
use crate::model::{Amount, TransactionDate, WeekStart};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DATE_STR: &str = "Date";
pub const TOTAL_STR: &str = "Total (EUR)";
pub const WEEK_STR: &str = "Week";
pub const UNITS_SOLD_STR: &str = "Units Sold";

/// The CSV header row is line 1, so data row `n` (0-based) is on line `n + 2`.
const FIRST_DATA_LINE: u64 = 2;

/// Where the per-row unit count comes from.
///
/// Exported statements usually have one row per item sold, so every row counts as one unit
/// unless a quantity column is configured.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitsSource {
    #[default]
    PerRow,
    Column(String),
}

impl UnitsSource {
    pub fn from_column(column: Option<impl Into<String>>) -> Self {
        match column {
            Some(c) => UnitsSource::Column(c.into()),
            None => UnitsSource::PerRow,
        }
    }
}

/// The full table loaded from one source: every row with its derived week and unit count.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Transactions {
    mapping: Mapping,
    /// Column names in display order: the source headers followed by any derived columns the
    /// source did not already have.
    columns: Vec<Header>,
    date_ix: usize,
    total_ix: usize,
    data: Vec<Transaction>,
}

impl Transactions {
    /// Builds the table from a header row and data rows. Any bad cell fails the whole table.
    pub fn new<S, R>(
        headers: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = R>,
        units: &UnitsSource,
    ) -> Result<Self, LoadError>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
    {
        let mapping = Mapping::new(headers).map_err(|e| LoadError::SchemaError(e.to_string()))?;
        let date_ix = mapping
            .require(DATE_STR)
            .map_err(|e| LoadError::SchemaError(e.to_string()))?;
        let total_ix = mapping
            .require(TOTAL_STR)
            .map_err(|e| LoadError::SchemaError(e.to_string()))?;
        let units_ix = match units {
            UnitsSource::PerRow => None,
            UnitsSource::Column(name) => Some(
                mapping
                    .require(name)
                    .map_err(|e| LoadError::SchemaError(e.to_string()))?,
            ),
        };

        let mut columns = mapping.headers().to_vec();
        for derived in [WEEK_STR, UNITS_SOLD_STR] {
            if mapping.header_index(derived).is_none() {
                columns.push(derived.into());
            }
        }

        let mut data = Vec::new();
        for (row_ix, row) in rows.into_iter().enumerate() {
            let line = row_ix as u64 + FIRST_DATA_LINE;
            let cells: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            if cells.len() != mapping.len() {
                return Err(LoadError::parse(
                    line,
                    "<record>",
                    format!(
                        "Expected {} fields but found {}",
                        mapping.len(),
                        cells.len()
                    ),
                ));
            }
            data.push(Transaction::new(line, &mapping, cells, date_ix, total_ix, units_ix)?);
        }

        Ok(Self {
            mapping,
            columns,
            date_ix,
            total_ix,
            data,
        })
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn columns(&self) -> &[Header] {
        &self.columns
    }

    pub fn data(&self) -> &[Transaction] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The sum of every row's total, or `None` if it does not fit in a `Decimal`.
    pub fn total(&self) -> Option<Amount> {
        self.data
            .iter()
            .try_fold(Amount::default(), |sum, t| sum.checked_add(&t.total))
    }

    /// Renders one row as display strings, one per entry of `columns()`. Parsed columns show
    /// their normalized value; everything else passes through untouched.
    pub fn display_row(&self, transaction: &Transaction) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(ix, column)| match column.as_ref() {
                WEEK_STR => transaction.week_start.to_string(),
                UNITS_SOLD_STR => transaction.units_sold.to_string(),
                _ if ix == self.date_ix => transaction.date.to_string(),
                _ if ix == self.total_ix => transaction.total.to_string(),
                _ => transaction.cells.get(ix).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

/// A single source row plus its derived fields.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    /// The line of the source this row was read from.
    line: u64,
    date: TransactionDate,
    total: Amount,
    week_start: WeekStart,
    units_sold: u64,
    /// The raw cells, in source column order.
    cells: Vec<String>,
}

impl Transaction {
    fn new(
        line: u64,
        mapping: &Mapping,
        cells: Vec<String>,
        date_ix: usize,
        total_ix: usize,
        units_ix: Option<usize>,
    ) -> Result<Self, LoadError> {
        let cell = |ix: usize| cells.get(ix).map(String::as_str).unwrap_or_default();
        let header = |ix: usize| {
            mapping
                .headers()
                .get(ix)
                .map(|h| h.as_ref().to_string())
                .unwrap_or_default()
        };

        let date = TransactionDate::from_str(cell(date_ix))
            .map_err(|e| LoadError::parse(line, header(date_ix), e.to_string()))?;
        let week_start = date.week_start().ok_or_else(|| {
            LoadError::parse(line, header(date_ix), "The date is out of the supported range")
        })?;
        let total = Amount::from_str(cell(total_ix)).map_err(|e| {
            LoadError::parse(
                line,
                header(total_ix),
                format!("Invalid amount '{}': {e}", cell(total_ix)),
            )
        })?;
        let units_sold = match units_ix {
            None => 1,
            Some(ix) => cell(ix).trim().parse::<u64>().map_err(|e| {
                LoadError::parse(
                    line,
                    header(ix),
                    format!("Invalid unit count '{}': {e}", cell(ix)),
                )
            })?,
        };

        Ok(Self {
            line,
            date,
            total,
            week_start,
            units_sold,
            cells,
        })
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn date(&self) -> TransactionDate {
        self.date
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub fn units_sold(&self) -> u64 {
        self.units_sold
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_derives_week_and_units() {
        let t = Transactions::new(
            ["Date", "Description", "Total (EUR)"].map(String::from),
            rows(&[&["04/01/2024", "Coffee", "3.50"]]),
            &UnitsSource::PerRow,
        )
        .unwrap();
        let row = &t.data()[0];
        assert_eq!(row.week_start().to_string(), "2024-01-01");
        assert_eq!(row.units_sold(), 1);
        assert_eq!(row.total().value(), Decimal::from_str("3.50").unwrap());
    }

    #[test]
    fn test_columns_append_derived_fields() {
        let t = Transactions::new(
            ["Date", "Description", "Total (EUR)"].map(String::from),
            rows(&[&["04/01/2024", "Coffee", "3.50"]]),
            &UnitsSource::PerRow,
        )
        .unwrap();
        let columns: Vec<&str> = t.columns().iter().map(|c| c.as_ref()).collect();
        assert_eq!(
            columns,
            vec!["Date", "Description", "Total (EUR)", "Week", "Units Sold"]
        );
        assert_eq!(
            t.display_row(&t.data()[0]),
            vec!["2024-01-04", "Coffee", "3.50", "2024-01-01", "1"]
        );
    }

    #[test]
    fn test_existing_week_column_is_replaced_in_place() {
        let t = Transactions::new(
            ["Week", "Date", "Total (EUR)"].map(String::from),
            rows(&[&["whatever", "10/01/2024", "1"]]),
            &UnitsSource::PerRow,
        )
        .unwrap();
        let columns: Vec<&str> = t.columns().iter().map(|c| c.as_ref()).collect();
        assert_eq!(columns, vec!["Week", "Date", "Total (EUR)", "Units Sold"]);
        assert_eq!(
            t.display_row(&t.data()[0]),
            vec!["2024-01-08", "2024-01-10", "1", "1"]
        );
    }

    #[test]
    fn test_missing_total_column_is_schema_error() {
        let err = Transactions::new(
            ["Date", "Amount"].map(String::from),
            rows(&[&["04/01/2024", "3.50"]]),
            &UnitsSource::PerRow,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::SchemaError(_)), "{err}");
    }

    #[test]
    fn test_bad_date_is_parse_error_with_line() {
        let err = Transactions::new(
            ["Date", "Total (EUR)"].map(String::from),
            rows(&[&["04/01/2024", "1.00"], &["yesterday", "2.00"]]),
            &UnitsSource::PerRow,
        )
        .unwrap_err();
        match err {
            LoadError::ParseError { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "Date");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_bad_amount_is_parse_error() {
        let err = Transactions::new(
            ["Date", "Total (EUR)"].map(String::from),
            rows(&[&["04/01/2024", "abc"]]),
            &UnitsSource::PerRow,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::ParseError { .. }), "{err}");
    }

    #[test]
    fn test_units_from_column() {
        let t = Transactions::new(
            ["Date", "Qty", "Total (EUR)"].map(String::from),
            rows(&[&["04/01/2024", "3", "9.00"], &["05/01/2024", " 2 ", "4.00"]]),
            &UnitsSource::Column("Qty".into()),
        )
        .unwrap();
        let units: Vec<u64> = t.data().iter().map(|r| r.units_sold()).collect();
        assert_eq!(units, vec![3, 2]);
    }

    #[test]
    fn test_units_column_missing_or_malformed() {
        let missing = Transactions::new(
            ["Date", "Total (EUR)"].map(String::from),
            rows(&[&["04/01/2024", "9.00"]]),
            &UnitsSource::Column("Qty".into()),
        )
        .unwrap_err();
        assert!(matches!(missing, LoadError::SchemaError(_)));

        let malformed = Transactions::new(
            ["Date", "Qty", "Total (EUR)"].map(String::from),
            rows(&[&["04/01/2024", "-1", "9.00"]]),
            &UnitsSource::Column("Qty".into()),
        )
        .unwrap_err();
        assert!(matches!(malformed, LoadError::ParseError { .. }));
    }

    #[test]
    fn test_total_is_sum_of_rows() {
        let t = Transactions::new(
            ["Date", "Total (EUR)"].map(String::from),
            rows(&[&["01/01/2024", "1.10"], &["20/02/2024", "€2.20"]]),
            &UnitsSource::PerRow,
        )
        .unwrap();
        assert_eq!(t.total().unwrap().value(), Decimal::from_str("3.30").unwrap());
        assert_eq!(t.data()[1].line(), 3);
    }
}
