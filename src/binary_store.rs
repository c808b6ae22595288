//! # BinaryStore — on-disk vectors + metadata sidecar
//!
//! Persists a [`VectorStore`]'s contents as two files in a collection's
//! directory: an opaque `bincode`-encoded vectors blob and a plain
//! `metadata.json` sidecar. This is the durable layer [`crate::collection`]
//! builds on; the in-memory [`VectorStore`] and HNSW graph are both rebuilt
//! from it on load.
//!
//! Loads are tolerant of corruption in either file: a damaged or truncated
//! blob logs a warning and starts that half empty rather than failing the
//! whole collection open, per the persistence contract in `spec.md` §7
//! ("Corrupt persistence on open is tolerated: start fresh, warn.").

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, VecStreamError};
use crate::vector_store::VectorStore;

const VECTORS_FILE: &str = "vectors.bin";
const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Serialize, Deserialize)]
struct VectorsBlob {
    dimension: Option<usize>,
    vectors: HashMap<String, Vec<f32>>,
}

/// Vectors plus a parallel metadata tree, persisted to a directory.
#[derive(Debug)]
pub struct BinaryStore {
    dir: PathBuf,
    store: VectorStore,
    metadata: HashMap<String, Value>,
}

impl BinaryStore {
    fn vectors_path(dir: &Path) -> PathBuf {
        dir.join(VECTORS_FILE)
    }

    fn metadata_path(dir: &Path) -> PathBuf {
        dir.join(METADATA_FILE)
    }

    /// Start a fresh, empty store rooted at `dir` (not yet written to disk).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        BinaryStore {
            dir: dir.into(),
            store: VectorStore::new(),
            metadata: HashMap::new(),
        }
    }

    /// Load from `dir`, tolerating a missing or corrupt vectors blob or
    /// metadata sidecar by starting that half empty and logging a warning.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let mut store = VectorStore::new();

        let vectors_path = Self::vectors_path(&dir);
        if let Ok(bytes) = fs::read(&vectors_path) {
            match bincode::serde::decode_from_slice::<VectorsBlob, _>(&bytes, bincode::config::standard()) {
                Ok((blob, _)) => {
                    store.set_dimension(blob.dimension);
                    *store.vectors_mut() = blob.vectors;
                }
                Err(err) => {
                    tracing::warn!(path = %vectors_path.display(), error = %err, "corrupt vectors blob, starting empty");
                }
            }
        }

        let metadata_path = Self::metadata_path(&dir);
        let metadata = match fs::read(&metadata_path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                tracing::warn!(path = %metadata_path.display(), error = %err, "corrupt metadata sidecar, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        BinaryStore { dir, store, metadata }
    }

    pub fn dimension(&self) -> Option<usize> {
        self.store.dimension()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.store.ids()
    }

    pub fn vector_store(&self) -> &VectorStore {
        &self.store
    }

    /// Insert or replace `id`'s vector and metadata.
    pub fn add(&mut self, id: impl Into<String>, vector: Vec<f32>, metadata: Option<Value>) -> Result<()> {
        let id = id.into();
        self.store.add(id.clone(), vector)?;
        match metadata {
            Some(m) => {
                self.metadata.insert(id, m);
            }
            None => {
                self.metadata.remove(&id);
            }
        }
        Ok(())
    }

    /// Fetch `(vector, metadata)` for `id`.
    pub fn get(&self, id: &str) -> Result<(&[f32], Option<&Value>)> {
        let vector = self.store.get(id)?;
        Ok((vector, self.metadata.get(id)))
    }

    pub fn metadata(&self, id: &str) -> Option<&Value> {
        self.metadata.get(id)
    }

    /// Remove `id`'s vector and metadata.
    pub fn remove(&mut self, id: &str) -> Result<Vec<f32>> {
        let vector = self.store.remove(id)?;
        self.metadata.remove(id);
        Ok(vector)
    }

    /// Empty both the vectors and the metadata sidecar and reset the fixed
    /// dimension, then rewrite both files to disk so they reflect the
    /// empty state.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear();
        self.metadata.clear();
        self.save()
    }

    /// Write both files to disk, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let blob = VectorsBlob {
            dimension: self.store.dimension(),
            vectors: self.store.vectors().clone(),
        };
        let encoded = bincode::serde::encode_to_vec(&blob, bincode::config::standard())
            .map_err(|e| VecStreamError::Serialization(e.to_string()))?;
        fs::write(Self::vectors_path(&self.dir), encoded)?;

        let metadata_json = serde_json::to_vec_pretty(&self.metadata)?;
        fs::write(Self::metadata_path(&self.dir), metadata_json)?;

        Ok(())
    }

    /// `(vectors blob bytes, metadata.json bytes)` on disk, `0` if absent.
    pub fn sizes(&self) -> (u64, u64) {
        let vectors = fs::metadata(Self::vectors_path(&self.dir)).map(|m| m.len()).unwrap_or(0);
        let metadata = fs::metadata(Self::metadata_path(&self.dir)).map(|m| m.len()).unwrap_or(0);
        (vectors, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_vectors_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BinaryStore::new(dir.path());
        store.add("a", vec![1.0, 2.0, 3.0], Some(json!({"category": "x"}))).unwrap();
        store.add("b", vec![4.0, 5.0, 6.0], None).unwrap();
        store.save().unwrap();

        let loaded = BinaryStore::load(dir.path());
        assert_eq!(loaded.len(), 2);
        let (v, m) = loaded.get("a").unwrap();
        assert_eq!(v, &[1.0, 2.0, 3.0]);
        assert_eq!(m, Some(&json!({"category": "x"})));
        let (_, m2) = loaded.get("b").unwrap();
        assert_eq!(m2, None);
    }

    #[test]
    fn load_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = BinaryStore::load(dir.path().join("does-not-exist"));
        assert!(store.is_empty());
        assert_eq!(store.dimension(), None);
    }

    #[test]
    fn load_tolerates_corrupt_vectors_blob() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VECTORS_FILE), b"not a valid bincode blob at all").unwrap();
        let store = BinaryStore::load(dir.path());
        assert!(store.is_empty());
    }

    #[test]
    fn load_tolerates_corrupt_metadata_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BinaryStore::new(dir.path());
        store.add("a", vec![1.0, 0.0], Some(json!({"k": "v"}))).unwrap();
        store.save().unwrap();
        fs::write(dir.path().join(METADATA_FILE), b"{not json").unwrap();

        let loaded = BinaryStore::load(dir.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.metadata("a"), None);
    }

    #[test]
    fn clear_empties_store_and_persists_the_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BinaryStore::new(dir.path());
        store.add("a", vec![1.0, 0.0], Some(json!({"k": "v"}))).unwrap();
        store.add("b", vec![0.0, 1.0], None).unwrap();
        store.save().unwrap();

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.dimension(), None);
        assert_eq!(store.metadata("a"), None);

        let reloaded = BinaryStore::load(dir.path());
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.dimension(), None);
    }

    #[test]
    fn remove_drops_both_vector_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BinaryStore::new(dir.path());
        store.add("a", vec![1.0, 0.0], Some(json!({"k": "v"}))).unwrap();
        store.remove("a").unwrap();
        assert!(matches!(store.get("a"), Err(VecStreamError::NotFound(_))));
        assert_eq!(store.metadata("a"), None);
    }
}
