//! Reads a CSV source into a `Transactions` table.
//!
//! Loading is all-or-nothing: the first malformed record, missing column or unparseable cell
//! aborts the load with a `LoadError` and no table is produced.

use crate::error::LoadError;
use crate::model::{Transactions, UnitsSource};
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads the raw bytes of the source at `path`.
pub async fn read_source(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| LoadError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads and loads the CSV file at `path`.
pub async fn load_path(path: &Path, units: &UnitsSource) -> Result<Transactions, LoadError> {
    let bytes = read_source(path).await?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    load_bytes(&bytes, units)
}

/// Loads CSV content that is already in memory, e.g. an uploaded file.
pub fn load_bytes(bytes: &[u8], units: &UnitsSource) -> Result<Transactions, LoadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(LoadError::SchemaError(String::from(
            "The source has no header row",
        )));
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        records.push(result?);
    }

    let transactions = Transactions::new(
        headers.iter(),
        records.iter().map(|r| r.iter()),
        units,
    )?;
    debug!(
        "Loaded {} rows with columns {:?}",
        transactions.len(),
        headers.iter().collect::<Vec<_>>()
    );
    Ok(transactions)
}
