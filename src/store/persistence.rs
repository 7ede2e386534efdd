//! On-disk route document.
//!
//! # Responsibilities
//! - Read the whole document from the backing file
//! - Write the whole document back atomically
//!
//! # Design Decisions
//! - A missing or empty file reads as an empty collection
//! - Writes go to `<file>.tmp`, are fsynced, then renamed over the target
//! - No partial or append updates

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::store::{RouteDefinition, RouteId, StoreError};

/// Failure to read or write the backing file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed route document {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The persisted state: one ordered collection of definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDocument {
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
}

impl RouteDocument {
    /// `max(existing ids) + 1`, or `1` for an empty collection.
    ///
    /// Fails once the highest stored id is `RouteId::MAX`; ids are never
    /// wrapped or reused below the maximum.
    pub fn next_id(&self) -> Result<RouteId, StoreError> {
        match self.routes.iter().map(|route| route.id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted(max)),
        }
    }

    pub fn find(&self, id: RouteId) -> Option<&RouteDefinition> {
        self.routes.iter().find(|route| route.id == id)
    }

    pub fn find_mut(&mut self, id: RouteId) -> Option<&mut RouteDefinition> {
        self.routes.iter_mut().find(|route| route.id == id)
    }
}

/// Handle on the JSON file backing the store.
#[derive(Debug, Clone)]
pub struct RouteFile {
    path: PathBuf,
}

impl RouteFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, treating a missing file as empty.
    pub async fn load(&self) -> Result<RouteDocument, PersistenceError> {
        Ok(self.read_existing().await?.unwrap_or_default())
    }

    /// Load the document, returning `None` when the file does not exist.
    pub async fn read_existing(&self) -> Result<Option<RouteDocument>, PersistenceError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(RouteDocument::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PersistenceError::Format {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the file contents with `document`.
    pub async fn save(&self, document: &RouteDocument) -> Result<(), PersistenceError> {
        let serialized =
            serde_json::to_vec_pretty(document).map_err(|source| PersistenceError::Format {
                path: self.path.clone(),
                source,
            })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, &serialized).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.io_error(e));
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::trace!(
            path = %self.path.display(),
            routes = document.routes.len(),
            "Route document written"
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}
