//! # Collection — a named partition of vectors with its own index
//!
//! Binds a [`BinaryStore`] (the durable layer) to an [`IndexManager`] (the
//! searchable layer). `add_vector`/`remove_vector`/`get_vector_with_metadata`
//! are pass-throughs that keep both in sync; `search_similar` routes through
//! [`QueryEngine`], which in turn dispatches to HNSW or the flat oracle
//! depending on configuration. HNSW is configured at collection creation,
//! but the index itself only gains structure once vectors start arriving —
//! an empty `HnswIndex` costs nothing but the struct.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::binary_store::BinaryStore;
use crate::error::Result;
use crate::hnsw::HnswParams;
use crate::index_manager::IndexManager;
use crate::metadata::Filter;
use crate::query_engine::QueryEngine;

/// A named vector namespace: durable storage plus a searchable index.
#[derive(Debug)]
pub struct Collection {
    name: String,
    dir: PathBuf,
    store: BinaryStore,
    index_manager: IndexManager,
}

impl Collection {
    /// Create a fresh, empty collection rooted at `dir`.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, hnsw_params: Option<HnswParams>) -> Self {
        let dir = dir.into();
        Collection {
            name: name.into(),
            store: BinaryStore::new(&dir),
            index_manager: IndexManager::new(hnsw_params),
            dir,
        }
    }

    /// Load an existing collection's vectors from `dir`, tolerating
    /// corruption per [`BinaryStore::load`]'s contract, and build the index
    /// from what's read — the HNSW graph is never itself persisted.
    pub fn load(name: impl Into<String>, dir: impl Into<PathBuf>, hnsw_params: Option<HnswParams>) -> Result<Self> {
        let dir = dir.into();
        let store = BinaryStore::load(&dir);
        let mut index_manager = IndexManager::new(hnsw_params);
        index_manager.update(&store)?;
        Ok(Collection {
            name: name.into(),
            dir,
            store,
            index_manager,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
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

    pub fn uses_hnsw(&self) -> bool {
        self.index_manager.uses_hnsw()
    }

    pub fn sizes(&self) -> (u64, u64) {
        self.store.sizes()
    }

    pub fn add_vector(&mut self, id: impl Into<String>, vector: Vec<f32>, metadata: Option<Value>) -> Result<()> {
        self.store.add(id, vector, metadata)?;
        self.index_manager.update(&self.store)
    }

    pub fn remove_vector(&mut self, id: &str) -> Result<()> {
        self.store.remove(id)?;
        self.index_manager.update(&self.store)
    }

    /// Empty this collection's vectors and metadata in place (and rewrite
    /// the now-empty files to disk), without deregistering the collection
    /// itself — unlike [`crate::collection_manager::CollectionManager::delete`],
    /// which removes the collection and its directory outright.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.index_manager.update(&self.store)
    }

    pub fn get_vector_with_metadata(&self, id: &str) -> Result<(Vec<f32>, Option<Value>)> {
        let (vector, metadata) = self.store.get(id)?;
        Ok((vector.to_vec(), metadata.cloned()))
    }

    /// Similarity search, inflating the candidate pool to honor `filter`
    /// when one is given. See [`QueryEngine::search`].
    pub fn search_similar(
        &mut self,
        query: &[f32],
        k: usize,
        threshold: f32,
        filter: Option<&Filter>,
    ) -> Result<Vec<(String, f32)>> {
        QueryEngine::search(&mut self.index_manager, &self.store, query, k, threshold, filter, None)
    }

    /// Persist the vectors and metadata sidecar. The index itself is never
    /// written; it's rebuilt from the store on the next [`Collection::load`].
    pub fn save(&self) -> Result<()> {
        self.store.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn s1_exact_hit() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::new("c", dir.path(), Some(HnswParams::default()));
        collection.add_vector("a", vec![1.0, 0.0, 0.0], None).unwrap();
        collection.add_vector("b", vec![0.0, 1.0, 0.0], None).unwrap();
        collection.add_vector("c", vec![0.0, 0.0, 1.0], None).unwrap();

        let results = collection.search_similar(&[1.0, 0.0, 0.0], 2, 0.0, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert!((results[0].1 - 1.0).abs() < 1e-5);
        assert!(results[1].0 == "b" || results[1].0 == "c");
    }

    #[test]
    fn s2_replace() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::new("c", dir.path(), Some(HnswParams::default()));
        collection.add_vector("x", vec![1.0, 0.0], None).unwrap();
        collection.add_vector("x", vec![0.0, 1.0], None).unwrap();

        let (v, _) = collection.get_vector_with_metadata("x").unwrap();
        assert_eq!(v, vec![0.0, 1.0]);

        let results = collection.search_similar(&[0.0, 1.0], 1, 0.0, None).unwrap();
        assert_eq!(results[0].0, "x");
        assert!((results[0].1 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn clear_empties_the_collection_but_keeps_it_usable() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::new("c", dir.path(), Some(HnswParams::default()));
        collection.add_vector("a", vec![1.0, 0.0], Some(json!({"k": "v"}))).unwrap();
        collection.add_vector("b", vec![0.0, 1.0], None).unwrap();

        collection.clear().unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.dimension(), None);
        assert!(collection.get_vector_with_metadata("a").is_err());

        collection.add_vector("c", vec![1.0, 1.0], None).unwrap();
        let results = collection.search_similar(&[1.0, 1.0], 1, 0.0, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "c");
    }

    #[test]
    fn s3_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::new("c", dir.path(), Some(HnswParams::default()));
        for i in 0..10 {
            let angle = i as f32 * 0.3;
            collection.add_vector(format!("v{i}"), vec![angle.cos(), angle.sin()], None).unwrap();
        }
        collection.remove_vector("v5").unwrap();

        let target_angle = 5.0_f32 * 0.3;
        let results = collection
            .search_similar(&[target_angle.cos(), target_angle.sin()], 10, 0.0, None)
            .unwrap();
        assert!(!results.iter().any(|(id, _)| id == "v5"));
        assert_eq!(results.len(), 9);
    }

    #[test]
    fn s4_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::new("c", dir.path(), Some(HnswParams::default()));
        collection
            .add_vector("p1", vec![1.0, 0.0], Some(json!({"category": "e", "details": {"brand": "Sony"}})))
            .unwrap();
        collection
            .add_vector("p2", vec![0.99, 0.14], Some(json!({"category": "e", "details": {"brand": "Apple"}})))
            .unwrap();

        let filter: Filter = [("details.brand".to_string(), json!("Sony"))].into_iter().collect();
        let results = collection.search_similar(&[1.0, 0.0], 5, 0.0, Some(&filter)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "p1");
    }

    #[test]
    fn s5_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::new("c", dir.path(), Some(HnswParams::default()));
        collection.add_vector("a", vec![1.0, 0.0], None).unwrap();
        collection.add_vector("b", vec![0.999, 0.045], None).unwrap();
        collection.add_vector("c", vec![0.0, 1.0], None).unwrap();

        let results = collection.search_similar(&[1.0, 0.0], 3, 0.9, None).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn save_and_reload_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut collection = Collection::new("c", dir.path(), Some(HnswParams::default()));
            collection.add_vector("a", vec![1.0, 2.0], Some(json!({"k": "v"}))).unwrap();
            collection.save().unwrap();
        }
        let reloaded = Collection::load("c", dir.path(), Some(HnswParams::default())).unwrap();
        assert_eq!(reloaded.len(), 1);
        let (v, m) = reloaded.get_vector_with_metadata("a").unwrap();
        assert_eq!(v, vec![1.0, 2.0]);
        assert_eq!(m, Some(json!({"k": "v"})));
    }
}
