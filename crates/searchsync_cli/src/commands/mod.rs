//! CLI command implementations.

pub mod check;
pub mod identity;
pub mod rebuild;
pub mod search;

use crate::dataset::Dataset;
use crate::error::{CliError, CliResult};
use searchsync_core::{MemoryRecordStore, SyncConfig, Synchronizer};
use searchsync_fts::FtsEngine;
use std::sync::Arc;
use tracing::info;

/// Output format shared by the commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl std::str::FromStr for Format {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

/// A dataset loaded into a store, wired to an in-memory engine.
pub struct Workspace {
    /// The record store.
    pub store: Arc<MemoryRecordStore>,
    /// The engine.
    pub engine: Arc<FtsEngine>,
    /// The synchronizer.
    pub sync: Synchronizer,
}

impl Workspace {
    /// Loads `dataset` into a fresh store and engine.
    pub fn open(dataset: &Dataset, config: SyncConfig) -> Self {
        let store = Arc::new(dataset.to_store());
        let engine = Arc::new(FtsEngine::new());
        let blueprints = dataset.blueprints(&store);
        let sync = Synchronizer::new(config, blueprints, store.clone(), engine.clone());
        info!(
            records = store.len(),
            types = dataset.blueprints.len(),
            "dataset loaded"
        );
        Self {
            store,
            engine,
            sync,
        }
    }
}

/// Parses the `--format` argument.
pub fn parse_format(format: &str) -> CliResult<Format> {
    format.parse()
}
