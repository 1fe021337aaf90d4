//! Handlers for the `serve` and `summary` subcommands.

mod serve;
mod summary;

use serde::Serialize;
use std::fmt::Debug;
use tracing::info;

pub use serve::serve;
pub use summary::summary;

/// What a command hands back to `main`: text for the user, plus the data it was rendered from
/// when there is any.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    message: String,
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    pub fn new(message: impl Into<String>, structure: T) -> Self {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    pub fn new_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Logs the message. Long-running commands report through the log rather than stdout.
    pub fn log(&self) {
        info!("{}", self.message);
    }
}
