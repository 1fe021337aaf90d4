//! These structs provide the CLI interface for the txn-dashboard binary.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// txn-dashboard: Weekly transaction totals in your browser.
///
/// Loads a CSV export of transactions, buckets them into Monday-to-Sunday weeks and serves a
/// single page with two charts (weekly totals in euros and weekly units sold) and a paginated
/// table of every transaction. The CSV needs a `Date` column (day-first, e.g. 31/01/2024) and a
/// `Total (EUR)` column; any other columns are shown in the table as they are.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load the transactions file and serve the dashboard.
    ///
    /// The file is read once at startup. Use the page's Reload button to read it again, or its
    /// Upload control to replace the table with another CSV file.
    Serve(ServeArgs),
    /// Load the transactions file once and print the weekly totals.
    Summary(SummaryArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The transactions CSV file. Defaults to "transactions 20205.csv" in the working directory.
    #[arg(long, env = "DASHBOARD_SOURCE")]
    source: Option<PathBuf>,

    /// A column holding the number of units of each row. When not given, every row counts as one
    /// unit sold.
    #[arg(long, env = "DASHBOARD_UNITS_COLUMN")]
    units_column: Option<String>,

    /// An optional JSON configuration file. Flags take precedence over its values.
    #[arg(long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,
}

impl Common {
    pub fn new(log_level: LevelFilter, source: Option<PathBuf>) -> Self {
        Self {
            log_level,
            source,
            units_column: None,
            config: None,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn units_column(&self) -> Option<&str> {
        self.units_column.as_deref()
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// (Not shown): Args for the `txn-dashboard serve` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ServeArgs {
    /// The interface to bind. Defaults to 127.0.0.1.
    #[arg(long, env = "DASHBOARD_HOST")]
    host: Option<String>,

    /// The port to listen on. Defaults to 8050.
    #[arg(long, env = "DASHBOARD_PORT")]
    port: Option<u16>,
}

impl ServeArgs {
    pub fn new(host: Option<String>, port: Option<u16>) -> Self {
        Self { host, port }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// (Not shown): Args for the `txn-dashboard summary` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct SummaryArgs {
    /// Print the summary as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

impl SummaryArgs {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn json(&self) -> bool {
        self.json
    }
}
