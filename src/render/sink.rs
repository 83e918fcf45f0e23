//! Where rendered artifacts go.

use crate::error::RenderError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Destination for rendered artifacts. Implementations are shared across
/// render tasks.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `contents` under `name`, returning where it ended up.
    async fn write(&self, name: &str, contents: &str) -> Result<PathBuf, RenderError>;
}

/// Writes artifacts as files under a root directory, creating it on demand.
#[derive(Clone, Debug)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSink { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactSink for FsSink {
    async fn write(&self, name: &str, contents: &str) -> Result<PathBuf, RenderError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| RenderError::Write {
                path: self.root.clone(),
                source,
            })?;
        let path = self.root.join(name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| RenderError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn write(&self, name: &str, contents: &str) -> Result<PathBuf, RenderError> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), contents.to_string());
        Ok(PathBuf::from(name))
    }
}
