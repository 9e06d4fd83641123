//! Store builder for flexible configuration.
//!
//! The builder covers the two stock modes (memory-only and file-backed)
//! plus dependency injection of an arbitrary durable collaborator, which
//! is how the test suite runs the durable code path without touching
//! disk.

use crate::error::{Result, StatsError};
use crate::storage::{DurableBackend, FileBackend};
use crate::store::AnalyticsStore;
use crate::types::Config;
use std::path::PathBuf;

/// Builder for [`AnalyticsStore`] instances.
pub struct StoreBuilder {
    data_dir: Option<PathBuf>,
    backend: Option<Box<dyn DurableBackend>>,
    config: Config,
}

impl StoreBuilder {
    /// New builder with default in-memory configuration.
    pub fn new() -> Self {
        Self {
            data_dir: None,
            backend: None,
            config: Config::default(),
        }
    }

    /// Persist collections as files under `dir` (created if needed).
    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.into());
        self.backend = None;
        self
    }

    /// Persist collections through a custom backend. Takes precedence
    /// over [`data_dir`](Self::data_dir).
    pub fn backend(mut self, backend: Box<dyn DurableBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Keep all state in process memory, dropping any configured
    /// persistence.
    pub fn in_memory(mut self) -> Self {
        self.data_dir = None;
        self.backend = None;
        self
    }

    /// Set the store configuration (capacities, hit windows).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Build the store, opening the durable backing if one was
    /// configured.
    pub fn build(self) -> Result<AnalyticsStore> {
        self.config.validate().map_err(StatsError::Other)?;

        let backend = match (self.backend, self.data_dir) {
            (Some(backend), _) => Some(backend),
            (None, Some(dir)) => {
                Some(Box::new(FileBackend::new(dir)?) as Box<dyn DurableBackend>)
            }
            (None, None) => None,
        };

        Ok(AnalyticsStore::from_parts(backend, self.config))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
