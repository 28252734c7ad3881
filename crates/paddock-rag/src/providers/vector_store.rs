//! Vector store provider trait for persisting built indexes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::retrieval::VectorIndex;

/// Version tag written into every persisted index file
const FORMAT_VERSION: u32 = 1;

/// Trait for durable index storage
///
/// Implementations:
/// - `LocalVectorStore`: JSON artifact on the local filesystem
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Overwrite the stored index with `index`
    async fn save(&self, index: &VectorIndex) -> Result<()>;

    /// Load the stored index, `Ok(None)` if nothing was saved yet
    async fn load(&self) -> Result<Option<VectorIndex>>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct IndexFileRef<'a> {
    version: u32,
    index: &'a VectorIndex,
}

#[derive(Deserialize)]
struct IndexFile {
    version: u32,
    index: VectorIndex,
}

/// Local index store writing a single JSON file
///
/// Writes go to a temporary file in the target directory which is then
/// renamed over the artifact, so concurrent readers see either the previous
/// or the new index and never a partial file.
pub struct LocalVectorStore {
    path: PathBuf,
}

impl LocalVectorStore {
    /// Create a store persisting to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn save(&self, index: &VectorIndex) -> Result<()> {
        let bytes = serde_json::to_vec(&IndexFileRef {
            version: FORMAT_VERSION,
            index,
        })?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn load(&self) -> Result<Option<VectorIndex>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: IndexFile = serde_json::from_slice(&bytes)?;
        if file.version != FORMAT_VERSION {
            return Err(Error::Internal(format!(
                "Unsupported index format version {} in {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(Some(file.index))
    }

    async fn health_check(&self) -> Result<bool> {
        // A missing directory is created on first save
        match tokio::fs::metadata(parent_dir(&self.path)).await {
            Ok(meta) => Ok(meta.is_dir() && !meta.permissions().readonly()),
            Err(_) => Ok(true),
        }
    }

    fn name(&self) -> &str {
        "local-json"
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
