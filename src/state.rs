//! The published dashboard and the reload cycle that replaces it.
//!
//! A reload runs load, aggregate and present to completion off to the side, then swaps the new
//! `Dashboard` into the published slot in one step. Readers only ever clone the `Arc` that is in
//! the slot, so they see either the old dashboard or the new one, never a mix. Reloads are
//! admitted one at a time.

use crate::aggregate::weekly_summary;
use crate::load;
use crate::model::UnitsSource;
use crate::present::Dashboard;
use crate::Config;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error, info};

/// Where a reload reads its CSV from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Source {
    /// A file on disk, normally the configured source.
    Path(PathBuf),
    /// The bytes of an uploaded file.
    Upload { name: String, bytes: Vec<u8> },
}

impl Source {
    pub fn describe(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Upload { name, .. } => format!("upload: {name}"),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadState {
    #[default]
    Idle,
    Loading,
}

serde_plain::derive_display_from_serialize!(ReloadState);
serde_plain::derive_fromstr_from_deserialize!(ReloadState);

/// Runs one full cycle (load, aggregate, present) for `source`. Touches no shared state.
pub async fn build(source: &Source, units: &UnitsSource) -> Result<Dashboard> {
    let transactions = match source {
        Source::Path(path) => load::load_path(path, units).await?,
        Source::Upload { bytes, .. } => load::load_bytes(bytes, units)?,
    };
    let summary = weekly_summary(transactions.data())?;
    debug!(
        "Aggregated {} rows into {} weeks",
        transactions.len(),
        summary.len()
    );
    Ok(Dashboard::new(source.describe(), &transactions, summary))
}

/// Owns the published dashboard. Cheap to clone; clones share the same slot.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<Config>,
    published: Arc<RwLock<Option<Arc<Dashboard>>>>,
    reload_state: Arc<Mutex<ReloadState>>,
    admission: Arc<tokio::sync::Mutex<()>>,
    /// The id of the last published snapshot.
    snapshots: Arc<AtomicU64>,
}

impl AppState {
    /// Creates a state with nothing published yet.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            published: Arc::new(RwLock::new(None)),
            reload_state: Arc::new(Mutex::new(ReloadState::Idle)),
            admission: Arc::new(tokio::sync::Mutex::new(())),
            snapshots: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The currently published dashboard, if any load has succeeded yet.
    pub fn current(&self) -> Option<Arc<Dashboard>> {
        self.published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn reload_state(&self) -> ReloadState {
        *self
            .reload_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-reads the configured source.
    pub async fn reload(&self) -> Result<Arc<Dashboard>> {
        let source = Source::Path(self.config.source().to_path_buf());
        self.reload_from(source).await
    }

    /// Runs a full cycle for `source` and publishes the result. On failure nothing is published
    /// and the previous dashboard stays in place.
    pub async fn reload_from(&self, source: Source) -> Result<Arc<Dashboard>> {
        let _admitted = self.admission.lock().await;
        let _loading = LoadingGuard::enter(&self.reload_state);
        info!("Reloading from {}", source.describe());

        match build(&source, self.config.units()).await {
            Ok(dashboard) => Ok(self.publish(dashboard)),
            Err(e) => {
                error!("Reload from {} failed: {e:#}", source.describe());
                Err(e)
            }
        }
    }

    /// Tags `dashboard` with the next snapshot id and swaps it into the published slot.
    fn publish(&self, mut dashboard: Dashboard) -> Arc<Dashboard> {
        dashboard.set_snapshot(self.snapshots.fetch_add(1, Ordering::Relaxed) + 1);
        let dashboard = Arc::new(dashboard);
        let previous = self
            .published
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(Arc::clone(&dashboard));
        info!(
            "Published snapshot {}: {} weeks and {} rows from {} (replaced: {})",
            dashboard.snapshot(),
            dashboard.summary().len(),
            dashboard.grid().rows().len(),
            dashboard.source(),
            previous.is_some()
        );
        dashboard
    }
}

/// Holds `ReloadState::Loading` for as long as it lives.
struct LoadingGuard<'a>(&'a Mutex<ReloadState>);

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a Mutex<ReloadState>) -> Self {
        *state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = ReloadState::Loading;
        Self(state)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = ReloadState::Idle;
    }
}
