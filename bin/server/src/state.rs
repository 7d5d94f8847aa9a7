//! Server application state shared by the request handlers

use crate::config::ServerConfig;
use std::path::PathBuf;
use storage::FileStore;

/// Read-only state handed to every request through `web::Data`
pub struct AppState {
    pub store: FileStore,
    pub upload_password: String,
    pub max_upload_size: u64,
    pub spool_dir: PathBuf,
}

impl AppState {
    pub fn new(
        store: FileStore,
        upload_password: impl Into<String>,
        max_upload_size: u64,
        spool_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            upload_password: upload_password.into(),
            max_upload_size,
            spool_dir: spool_dir.into(),
        }
    }

    pub fn from_config(config: &ServerConfig, store: FileStore) -> Self {
        Self::new(
            store,
            config.upload_password.clone(),
            config.max_upload_size,
            config.spool_dir.clone(),
        )
    }

    /// Exact comparison against the configured shared secret; empty never matches
    pub fn is_authorized(&self, candidate: &str) -> bool {
        !candidate.is_empty() && candidate == self.upload_password
    }
}
