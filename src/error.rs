use std::path::PathBuf;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The ways loading a transactions source can fail. Any of these aborts the whole load; nothing
/// from a failed load is ever published.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The configured path is missing or could not be read.
    #[error("Unable to read the transactions source '{}': {source}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cell could not be parsed, or the CSV itself is malformed.
    #[error("Parse error on line {line}, column '{column}': {message}")]
    ParseError {
        line: u64,
        column: String,
        message: String,
    },

    /// A required column is absent or the header row is unusable.
    #[error("Schema error: {0}")]
    SchemaError(String),
}

impl LoadError {
    pub(crate) fn parse(line: u64, column: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::ParseError {
            line,
            column: column.into(),
            message: message.into(),
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or_default();
        LoadError::parse(line, "<record>", e.to_string())
    }
}
