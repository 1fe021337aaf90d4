//! Configuration handling for the dashboard.
//!
//! Settings come from three places, in order of precedence: command line flags (or their
//! environment variables), an optional `config.json` passed with `--config`, and built-in
//! defaults that reproduce the original behaviour (read `transactions 20205.csv` from the working
//! directory, serve on `127.0.0.1:8050`).

use crate::args::{Common, ServeArgs};
use crate::model::UnitsSource;
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "txn-dashboard";
const CONFIG_VERSION: u8 = 1;
pub const DEFAULT_SOURCE: &str = "transactions 20205.csv";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8050;

/// The resolved configuration of the app. It is built once at startup and handed to whatever
/// needs it; nothing reads flags or the environment after that.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    source: PathBuf,
    units: UnitsSource,
    host: String,
    port: u16,
    config_path: Option<PathBuf>,
}

impl Config {
    /// A configuration that reads `source` and otherwise uses the defaults.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            units: UnitsSource::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            config_path: None,
        }
    }

    pub fn with_units(mut self, units: UnitsSource) -> Self {
        self.units = units;
        self
    }

    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Resolves the configuration from the command line, loading the `--config` file if one was
    /// given.
    pub async fn load(common: &Common, serve: Option<&ServeArgs>) -> Result<Self> {
        let (file, base_dir) = match common.config() {
            Some(path) => {
                let file = ConfigFile::load(path).await?;
                let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (file, base_dir)
            }
            None => (ConfigFile::default(), PathBuf::new()),
        };

        let source = match (common.source(), file.source.as_ref()) {
            (Some(flag), _) => flag.to_path_buf(),
            (None, Some(from_file)) if from_file.is_relative() => base_dir.join(from_file),
            (None, Some(from_file)) => from_file.clone(),
            (None, None) => PathBuf::from(DEFAULT_SOURCE),
        };

        let units = UnitsSource::from_column(
            common
                .units_column()
                .map(str::to_string)
                .or(file.units_column),
        );

        let host = serve
            .and_then(|s| s.host().map(str::to_string))
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = serve
            .and_then(ServeArgs::port)
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            source,
            units,
            host,
            port,
            config_path: common.config().map(Path::to_path_buf),
        })
    }

    /// The CSV file read at startup and on every reload.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn units(&self) -> &UnitsSource {
        &self.units
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// The address the server binds to.
    pub fn address(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .with_context(|| format!("Invalid host and port '{addr}'"))
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "txn-dashboard",
///   "config_version": 1,
///   "source": "data/transactions.csv",
///   "units_column": "Quantity",
///   "host": "0.0.0.0",
///   "port": 8050
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "txn-dashboard"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the transactions CSV, relative to the config file or absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<PathBuf>,

    /// A column holding per-row quantities. Every row counts as one unit when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    units_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            source: None,
            units_column: None,
            host: None,
            port: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    #[cfg(test)]
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
