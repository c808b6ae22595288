//! # CollectionManager — the multi-namespace registry
//!
//! Owns a directory tree: `base/collections/<name>/` holds each
//! collection's vectors and metadata sidecar, and `base/collections_metadata.json`
//! is the manifest recording which collections exist and how each was
//! configured. Collections are opened lazily and cached in memory; `delete`
//! drops both the manifest entry and the in-memory handle before removing
//! the directory tree.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::{Result, VecStreamError};
use crate::hnsw::HnswParams;

const MANIFEST_FILE: &str = "collections_metadata.json";
const COLLECTIONS_DIR: &str = "collections";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestHnswParams {
    #[serde(rename = "M")]
    m: usize,
    ef_construction: usize,
    ml: usize,
}

impl From<&HnswParams> for ManifestHnswParams {
    fn from(p: &HnswParams) -> Self {
        ManifestHnswParams {
            m: p.m,
            ef_construction: p.ef_construction,
            ml: p.ml,
        }
    }
}

impl ManifestHnswParams {
    fn into_params(self, seed: u64) -> HnswParams {
        HnswParams {
            m: self.m,
            m_max0: self.m * 2,
            ef_construction: self.ef_construction,
            ml: self.ml,
            seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    name: String,
    created_at: DateTime<Utc>,
    use_hnsw: bool,
    hnsw_params: Option<ManifestHnswParams>,
}

/// Vector count, dimension, and on-disk footprint for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub name: String,
    pub vector_count: usize,
    pub dimension: Option<usize>,
    pub vectors_bytes: u64,
    pub metadata_bytes: u64,
    pub use_hnsw: bool,
    pub created_at: DateTime<Utc>,
}

/// Registry of named collections rooted at a base directory.
#[derive(Debug)]
pub struct CollectionManager {
    base: PathBuf,
    manifest: HashMap<String, ManifestEntry>,
    open: HashMap<String, Collection>,
}

impl CollectionManager {
    fn manifest_path(base: &std::path::Path) -> PathBuf {
        base.join(MANIFEST_FILE)
    }

    fn collection_dir(base: &std::path::Path, name: &str) -> PathBuf {
        base.join(COLLECTIONS_DIR).join(name)
    }

    /// Open (or create) a registry rooted at `base`, loading any existing
    /// manifest. A missing or corrupt manifest starts as an empty registry.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;

        let manifest = match fs::read(Self::manifest_path(&base)) {
            Ok(bytes) => serde_json::from_slice::<HashMap<String, ManifestEntry>>(&bytes).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "corrupt collections manifest, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Ok(CollectionManager {
            base,
            manifest,
            open: HashMap::new(),
        })
    }

    fn save_manifest(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.manifest)?;
        fs::write(Self::manifest_path(&self.base), json)?;
        Ok(())
    }

    /// Create a new, empty collection named `name`. Fails
    /// [`VecStreamError::AlreadyExists`] if the name is already registered.
    pub fn create(&mut self, name: impl Into<String>, use_hnsw: bool, hnsw_params: Option<HnswParams>) -> Result<()> {
        let name = name.into();
        if self.manifest.contains_key(&name) {
            return Err(VecStreamError::AlreadyExists(name));
        }

        let params = if use_hnsw {
            Some(hnsw_params.unwrap_or_default())
        } else {
            None
        };
        let entry = ManifestEntry {
            name: name.clone(),
            created_at: Utc::now(),
            use_hnsw,
            hnsw_params: params.as_ref().map(ManifestHnswParams::from),
        };

        let collection = Collection::new(&name, Self::collection_dir(&self.base, &name), params);
        collection.save()?;

        self.manifest.insert(name.clone(), entry);
        self.save_manifest()?;
        self.open.insert(name, collection);
        Ok(())
    }

    /// Fetch a mutable handle to `name`, lazily loading it from disk via
    /// the manifest if it isn't already open. Fails `NotFound` if `name`
    /// isn't registered.
    pub fn get(&mut self, name: &str) -> Result<&mut Collection> {
        if !self.open.contains_key(name) {
            let entry = self
                .manifest
                .get(name)
                .ok_or_else(|| VecStreamError::NotFound(name.to_string()))?
                .clone();
            let params = entry.hnsw_params.map(|p| p.into_params(HnswParams::default().seed));
            let collection = Collection::load(name, Self::collection_dir(&self.base, name), params)?;
            self.open.insert(name.to_string(), collection);
        }
        Ok(self.open.get_mut(name).expect("just inserted"))
    }

    /// Known collection names.
    pub fn list(&self) -> Vec<String> {
        self.manifest.keys().cloned().collect()
    }

    /// Remove `name`'s manifest entry, drop its in-memory handle, and
    /// recursively delete its directory.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        if self.manifest.remove(name).is_none() {
            return Err(VecStreamError::NotFound(name.to_string()));
        }
        self.open.remove(name);
        self.save_manifest()?;

        let dir = Self::collection_dir(&self.base, name);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    /// Vector count, dimension, disk sizes, and manifest fields for `name`.
    pub fn stats(&mut self, name: &str) -> Result<CollectionStats> {
        let entry = self
            .manifest
            .get(name)
            .cloned()
            .ok_or_else(|| VecStreamError::NotFound(name.to_string()))?;
        let collection = self.get(name)?;
        let (vectors_bytes, metadata_bytes) = collection.sizes();
        Ok(CollectionStats {
            name: entry.name,
            vector_count: collection.len(),
            dimension: collection.dimension(),
            vectors_bytes,
            metadata_bytes,
            use_hnsw: entry.use_hnsw,
            created_at: entry.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CollectionManager::new(dir.path()).unwrap();

        manager.create("docs", true, None).unwrap();
        assert_eq!(manager.list(), vec!["docs".to_string()]);

        let err = manager.create("docs", true, None).unwrap_err();
        assert!(matches!(err, VecStreamError::AlreadyExists(_)));

        manager.get("docs").unwrap().add_vector("a", vec![1.0, 0.0], None).unwrap();
        manager.get("docs").unwrap().save().unwrap();

        manager.delete("docs").unwrap();
        assert!(manager.list().is_empty());
        assert!(matches!(manager.get("docs"), Err(VecStreamError::NotFound(_))));
    }

    #[test]
    fn get_unknown_collection_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CollectionManager::new(dir.path()).unwrap();
        assert!(matches!(manager.get("ghost"), Err(VecStreamError::NotFound(_))));
    }

    #[test]
    fn s6_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut manager = CollectionManager::new(dir.path()).unwrap();
            manager.create("c", true, None).unwrap();
            let collection = manager.get("c").unwrap();
            for i in 0..100 {
                let v = vec![i as f32, (i * 2) as f32];
                collection
                    .add_vector(format!("v{i}"), v, Some(serde_json::json!({"i": i})))
                    .unwrap();
            }
            collection.save().unwrap();
        }

        let mut manager = CollectionManager::new(dir.path()).unwrap();
        assert_eq!(manager.list(), vec!["c".to_string()]);
        let stats = manager.stats("c").unwrap();
        assert_eq!(stats.vector_count, 100);
        assert_eq!(stats.dimension, Some(2));

        let collection = manager.get("c").unwrap();
        let (v, m) = collection.get_vector_with_metadata("v42").unwrap();
        assert_eq!(v, vec![42.0, 84.0]);
        assert_eq!(m, Some(serde_json::json!({"i": 42})));
    }
}
