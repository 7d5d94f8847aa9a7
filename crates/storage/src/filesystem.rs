//! Flat storage directory on the local filesystem

use crate::StoreError;
use common::file_utils::{self, PathError};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

/// The single directory holding every uploaded and downloadable file.
///
/// Concurrent stores to the same filename are not serialized: the last
/// writer wins and two overlapping copies may interleave.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create the storage directory (and parents) if absent and canonicalize it
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|source| StoreError::Init {
            path: root.to_path_buf(),
            source,
        })?;
        let root = std::fs::canonicalize(root).map_err(|source| StoreError::Init {
            path: root.to_path_buf(),
            source,
        })?;

        debug!("Storage directory ready: {:?}", root);
        Ok(Self { root })
    }

    /// Absolute path of the storage directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a filename to a path strictly inside the storage directory
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, PathError> {
        file_utils::resolve_within(&self.root, filename)
    }

    /// Create or truncate `filename` and stream `reader` into it.
    ///
    /// Returns the destination path. If the copy fails the partially
    /// written file is removed.
    pub async fn store<R>(&self, filename: &str, reader: &mut R) -> Result<PathBuf, StoreError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let path = self.resolve(filename)?;

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(StoreError::Create)?;

        let copied = async {
            let written = tokio::io::copy(reader, &mut file).await?;
            file.flush().await?;
            Ok::<u64, std::io::Error>(written)
        }
        .await;

        match copied {
            Ok(written) => {
                debug!("Stored {} bytes at {:?}", written, path);
                Ok(path)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to remove partial file {:?}: {}", path, remove_err);
                }
                Err(StoreError::Write(e))
            }
        }
    }
}
