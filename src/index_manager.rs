//! # IndexManager — keeps a flat and an optional HNSW index in sync
//!
//! Owns a `(flat VectorStore, HnswIndex?)` pair built over the same
//! [`crate::binary_store::BinaryStore`]. `update` is idempotent: it walks
//! the source once, removing anything no longer present and pushing
//! through anything new or whose *vector value* has changed since it was
//! last indexed — re-adding an existing ID (spec.md's replace-in-place
//! semantics) changes the stored vector without touching the ID set, so
//! currency can't be judged by ID-set membership alone. Search dispatches
//! to HNSW when one is configured and built; otherwise it falls back to
//! the flat store's exact cosine search. The flat path also exists to
//! serve collections explicitly configured without HNSW, and doubles as
//! the recall oracle in property tests.

use std::collections::HashMap;

use crate::binary_store::BinaryStore;
use crate::error::Result;
use crate::hnsw::{HnswIndex, HnswParams};
use crate::vector_store::VectorStore;

/// A flat exact index paired with an optional approximate HNSW index, both
/// kept current against the same backing [`BinaryStore`].
#[derive(Debug)]
pub struct IndexManager {
    flat: VectorStore,
    hnsw: Option<HnswIndex>,
    /// The vector last pushed into the index for each ID, so a replaced
    /// vector (same ID, new value) is detected and re-pushed.
    indexed: HashMap<String, Vec<f32>>,
}

impl IndexManager {
    /// `hnsw_params = None` means this collection never builds an
    /// approximate index; search always goes through the flat path.
    pub fn new(hnsw_params: Option<HnswParams>) -> Self {
        IndexManager {
            flat: VectorStore::new(),
            hnsw: hnsw_params.map(HnswIndex::new),
            indexed: HashMap::new(),
        }
    }

    pub fn uses_hnsw(&self) -> bool {
        self.hnsw.is_some()
    }

    /// True iff every ID in `source` is indexed with exactly its current
    /// vector value, and nothing stale remains indexed.
    pub fn is_current(&self, source: &BinaryStore) -> bool {
        if self.indexed.len() != source.len() {
            return false;
        }
        source.ids().all(|id| {
            let Ok((vector, _)) = source.get(id) else {
                return false;
            };
            self.indexed.get(id).is_some_and(|indexed_vector| indexed_vector.as_slice() == vector)
        })
    }

    /// Bring the index in line with `source`: drop IDs no longer present,
    /// then push through any ID that's new or whose vector changed.
    pub fn update(&mut self, source: &BinaryStore) -> Result<()> {
        let stale: Vec<String> = self
            .indexed
            .keys()
            .filter(|id| source.get(id).is_err())
            .cloned()
            .collect();
        for id in stale {
            let _ = self.flat.remove(&id);
            if let Some(hnsw) = self.hnsw.as_mut() {
                let _ = hnsw.remove_item(&id);
            }
            self.indexed.remove(&id);
        }

        for id in source.ids().map(String::from).collect::<Vec<_>>() {
            let (vector, _) = source.get(&id)?;
            if self.indexed.get(&id).is_some_and(|v| v.as_slice() == vector) {
                continue;
            }
            let vector = vector.to_vec();
            self.flat.add(id.clone(), vector.clone())?;
            if let Some(hnsw) = self.hnsw.as_mut() {
                hnsw.add_item(id.clone(), vector.clone())?;
            }
            self.indexed.insert(id, vector);
        }

        Ok(())
    }

    /// Exact cosine top-k via the flat path, ignoring any HNSW index. Used
    /// as the recall oracle in property tests and by collections that
    /// never configure HNSW.
    pub fn search_flat(&self, query: &[f32], k: usize, threshold: f32) -> Vec<(String, f32)> {
        self.flat.search(query, k, threshold)
    }

    /// Search via HNSW when configured and built, otherwise the flat path.
    pub fn search(&self, query: &[f32], k: usize, threshold: f32, ef_search: Option<usize>) -> Vec<(String, f32)> {
        match &self.hnsw {
            Some(hnsw) if !hnsw.is_empty() => hnsw
                .search(query, k, ef_search)
                .into_iter()
                .filter(|(_, sim)| *sim >= threshold)
                .collect(),
            _ => self.flat.search(query, k, threshold),
        }
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }
}
