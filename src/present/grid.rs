use crate::model::Transactions;
use serde::Serialize;

/// Rows per grid page.
pub const PAGE_SIZE: usize = 10;

/// The display table: one row per loaded transaction, one column per field the loader produced.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Grid {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(transactions: &Transactions) -> Self {
        Self {
            columns: transactions
                .columns()
                .iter()
                .map(|c| c.as_ref().to_string())
                .collect(),
            rows: transactions
                .data()
                .iter()
                .map(|t| transactions.display_row(t))
                .collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The number of pages, at least one so an empty grid still has a (blank) first page.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(PAGE_SIZE).max(1)
    }

    /// Returns 1-based page `number`. Page 0 is read as page 1; pages past the end are empty.
    pub fn page(&self, number: usize) -> GridPage<'_> {
        let number = number.max(1);
        let start = (number - 1).saturating_mul(PAGE_SIZE).min(self.rows.len());
        let end = start.saturating_add(PAGE_SIZE).min(self.rows.len());
        GridPage {
            snapshot: 0,
            page: number,
            page_count: self.page_count(),
            page_size: PAGE_SIZE,
            total_rows: self.rows.len(),
            rows: &self.rows[start..end],
        }
    }
}

/// One page of the grid, as sent to the page.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct GridPage<'a> {
    /// The snapshot of the dashboard the rows were taken from.
    snapshot: u64,
    page: usize,
    page_count: usize,
    page_size: usize,
    total_rows: usize,
    rows: &'a [Vec<String>],
}

impl GridPage<'_> {
    pub(crate) fn with_snapshot(mut self, snapshot: u64) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn rows(&self) -> &[Vec<String>] {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::load_bytes;
    use crate::model::UnitsSource;

    fn grid_with_rows(n: usize) -> Grid {
        let mut csv = String::from("Date,Note,Total (EUR)\n");
        for i in 0..n {
            csv.push_str(&format!("{:02}/03/2024,row {},1.00\n", i % 28 + 1, i + 1));
        }
        Grid::new(&load_bytes(csv.as_bytes(), &UnitsSource::PerRow).unwrap())
    }

    #[test]
    fn test_first_page_of_25() {
        let grid = grid_with_rows(25);
        assert_eq!(grid.page_count(), 3);
        let page = grid.page(1);
        assert_eq!(page.rows().len(), 10);
        assert_eq!(page.rows()[0][1], "row 1");
        assert_eq!(page.rows()[9][1], "row 10");
    }

    #[test]
    fn test_last_partial_page() {
        let grid = grid_with_rows(25);
        let page = grid.page(3);
        assert_eq!(page.rows().len(), 5);
        assert_eq!(page.rows()[0][1], "row 21");
        assert_eq!(page.rows()[4][1], "row 25");
    }

    #[test]
    fn test_out_of_range_pages() {
        let grid = grid_with_rows(25);
        assert!(grid.page(4).rows().is_empty());
        assert!(grid.page(usize::MAX).rows().is_empty());
        assert_eq!(grid.page(0).page(), 1);
        assert_eq!(grid.page(0).rows()[0][1], "row 1");
    }

    #[test]
    fn test_columns_are_dynamic() {
        let grid = grid_with_rows(1);
        assert_eq!(
            grid.columns(),
            ["Date", "Note", "Total (EUR)", "Week", "Units Sold"]
        );
        assert_eq!(grid.rows()[0], ["2024-03-01", "row 1", "1.00", "2024-02-26", "1"]);
    }

    #[test]
    fn test_empty_grid_has_one_page() {
        let grid = grid_with_rows(0);
        assert_eq!(grid.page_count(), 1);
        assert!(grid.page(1).rows().is_empty());
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let grid = grid_with_rows(20);
        assert_eq!(grid.page_count(), 2);
        assert_eq!(grid.page(2).rows().len(), 10);
    }
}
