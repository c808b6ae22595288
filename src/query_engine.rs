//! # QueryEngine — threshold- and filter-aware search
//!
//! Sits above [`crate::index_manager::IndexManager`] and
//! [`crate::binary_store::BinaryStore`]. Without a filter, a search is a
//! direct pass-through to the index. With one, the engine requests an
//! inflated candidate pool above the similarity threshold, then walks it in
//! similarity order admitting entries whose metadata satisfies the filter,
//! stopping once `k` have been admitted — so a filter can never silently
//! return fewer than `k` matches just because the index's own top-`k` chose
//! to skip non-matching neighbors.

use crate::binary_store::BinaryStore;
use crate::error::Result;
use crate::index_manager::IndexManager;
use crate::metadata::{self, Filter};

/// Minimum inflated candidate pool size, independent of `k`.
const MIN_POOL: usize = 100;
/// Pool size scales with `k` beyond `MIN_POOL`.
const POOL_MULTIPLIER: usize = 4;

/// Stateless search algorithm; the index and the metadata it filters
/// against are owned by the caller ([`crate::collection::Collection`]).
pub struct QueryEngine;

impl QueryEngine {
    /// Run a search, widening the candidate pool and filtering by metadata
    /// when `filter` is present and non-empty.
    pub fn search(
        index_manager: &mut IndexManager,
        source: &BinaryStore,
        query: &[f32],
        k: usize,
        threshold: f32,
        filter: Option<&Filter>,
        ef_search: Option<usize>,
    ) -> Result<Vec<(String, f32)>> {
        index_manager.update(source)?;

        let Some(filter) = filter.filter(|f| !f.is_empty()) else {
            return Ok(index_manager.search(query, k, threshold, ef_search));
        };

        let pool_size = (POOL_MULTIPLIER * k).max(MIN_POOL).min(index_manager.len().max(1));
        let pool = index_manager.search(query, pool_size, threshold, ef_search);

        let mut admitted = Vec::with_capacity(k);
        for (id, similarity) in pool {
            if metadata::matches(source.metadata(&id), filter) {
                admitted.push((id, similarity));
                if admitted.len() >= k {
                    break;
                }
            }
        }
        Ok(admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::HnswParams;
    use serde_json::json;

    fn fixture() -> (BinaryStore, IndexManager) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BinaryStore::new(dir.path());
        store.add("p1", vec![1.0, 0.0], Some(json!({"category": "e", "details": {"brand": "Sony"}}))).unwrap();
        store.add("p2", vec![0.9, 0.1], Some(json!({"category": "e", "details": {"brand": "Apple"}}))).unwrap();
        let manager = IndexManager::new(Some(HnswParams::default()));
        (store, manager)
    }

    #[test]
    fn no_filter_passes_through() {
        let (store, mut manager) = fixture();
        let results = QueryEngine::search(&mut manager, &store, &[1.0, 0.0], 5, 0.0, None, None).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn filter_admits_only_matching_metadata() {
        let (store, mut manager) = fixture();
        let filter: Filter = [("details.brand".to_string(), json!("Sony"))].into_iter().collect();
        let results = QueryEngine::search(&mut manager, &store, &[1.0, 0.0], 5, 0.0, Some(&filter), None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "p1");
    }

    #[test]
    fn empty_filter_behaves_like_no_filter() {
        let (store, mut manager) = fixture();
        let results = QueryEngine::search(&mut manager, &store, &[1.0, 0.0], 5, 0.0, Some(&Filter::new()), None).unwrap();
        assert_eq!(results.len(), 2);
    }
}
