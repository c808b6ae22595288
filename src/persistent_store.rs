//! # PersistentStore — single-file JSON vector persistence
//!
//! The simpler of the two persistence layers: one JSON file holding the
//! fixed dimension and the full `id -> vector` map, as opposed to
//! [`crate::binary_store::BinaryStore`]'s split binary-blob-plus-metadata
//! layout. Useful for small collections or tooling that wants a
//! human-readable dump.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::vector_store::VectorStore;

#[derive(Debug, Serialize, Deserialize)]
struct FileFormat {
    dimension: Option<usize>,
    vectors: HashMap<String, Vec<f32>>,
}

/// A [`VectorStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct PersistentStore {
    path: PathBuf,
    store: VectorStore,
}

impl PersistentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PersistentStore {
            path: path.into(),
            store: VectorStore::new(),
        }
    }

    /// Load from `path`, tolerating a missing or corrupt file by starting
    /// empty and logging a warning.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = VectorStore::new();

        if let Ok(bytes) = fs::read(&path) {
            match serde_json::from_slice::<FileFormat>(&bytes) {
                Ok(parsed) => {
                    store.set_dimension(parsed.dimension);
                    *store.vectors_mut() = parsed.vectors;
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "corrupt persistent store, starting empty");
                }
            }
        }

        PersistentStore { path, store }
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VectorStore {
        &mut self.store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state to `path` as a single JSON document.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let document = FileFormat {
            dimension: self.store.dimension(),
            vectors: self.store.vectors().clone(),
        };
        let json = serde_json::to_vec_pretty(&document)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
