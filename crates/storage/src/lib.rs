pub mod filesystem;

use common::file_utils::PathError;
use std::path::PathBuf;
use thiserror::Error;

pub use filesystem::FileStore;

/// Errors raised by the storage directory
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage directory could not be created or canonicalized
    #[error("Failed to prepare storage directory {path:?}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The filename does not resolve to a file inside the storage directory
    #[error(transparent)]
    Path(#[from] PathError),

    /// The destination file could not be created or truncated
    #[error("Failed to create file: {0}")]
    Create(#[source] std::io::Error),

    /// Copying content into the destination file failed
    #[error("Failed to write file: {0}")]
    Write(#[source] std::io::Error),
}
