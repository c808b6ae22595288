//! # Flat (exact) vector store
//!
//! The simplest layer in the stack: an in-memory map from string ID to a
//! fixed-dimension `f32` vector, with brute-force cosine top-k search. It
//! serves both as a correctness oracle for the HNSW path (see
//! [`crate::index_manager`]) and as the search path for collections small
//! enough that an approximate index isn't worth the bookkeeping.
//!
//! Dimension is established by the first insertion and is immutable after
//! that; a later insertion of a mismatched length is rejected with
//! [`VecStreamError::InvalidDimension`].

use rayon::prelude::*;
use std::collections::HashMap;

use crate::error::{Result, VecStreamError};
use crate::math::cosine_similarity;

/// Brute-force scans above this many vectors are parallelized with rayon.
const PARALLEL_SCAN_THRESHOLD: usize = 2_000;

/// An in-memory mapping from ID to vector, with uniform dimension.
#[derive(Debug, Default, Clone)]
pub struct VectorStore {
    vectors: HashMap<String, Vec<f32>>,
    dimension: Option<usize>,
}

impl VectorStore {
    /// Create an empty store with no fixed dimension yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension established by the first insertion, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True if the store holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// All stored IDs, in arbitrary order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.vectors.keys().map(|s| s.as_str())
    }

    /// Insert or replace the vector at `id`.
    ///
    /// Fixes the store's dimension on the first call. Subsequent calls with
    /// a different length fail with [`VecStreamError::InvalidDimension`]
    /// without mutating the store.
    pub fn add(&mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        match self.dimension {
            Some(d) if vector.len() != d => {
                return Err(VecStreamError::InvalidDimension {
                    expected: d,
                    actual: vector.len(),
                });
            }
            None => self.dimension = Some(vector.len()),
            _ => {}
        }
        self.vectors.insert(id.into(), vector);
        Ok(())
    }

    /// Fetch a vector by ID.
    pub fn get(&self, id: &str) -> Result<&[f32]> {
        self.vectors
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| VecStreamError::NotFound(id.to_string()))
    }

    /// Remove a vector by ID.
    pub fn remove(&mut self, id: &str) -> Result<Vec<f32>> {
        self.vectors
            .remove(id)
            .ok_or_else(|| VecStreamError::NotFound(id.to_string()))
    }

    /// Remove everything and forget the established dimension.
    pub fn clear(&mut self) {
        self.vectors.clear();
        self.dimension = None;
    }

    /// Exact cosine top-k search.
    ///
    /// Returns up to `k` `(id, similarity)` pairs with `similarity >=
    /// threshold`, sorted by similarity descending. An empty store returns
    /// `[]`. `k` larger than the population returns all qualifying entries.
    pub fn search(&self, query: &[f32], k: usize, threshold: f32) -> Vec<(String, f32)> {
        let mut scored: Vec<(String, f32)> = if self.vectors.len() >= PARALLEL_SCAN_THRESHOLD {
            self.vectors
                .par_iter()
                .map(|(id, v)| (id.clone(), cosine_similarity(query, v)))
                .filter(|(_, sim)| *sim >= threshold)
                .collect()
        } else {
            self.vectors
                .iter()
                .map(|(id, v)| (id.clone(), cosine_similarity(query, v)))
                .filter(|(_, sim)| *sim >= threshold)
                .collect()
        };
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Borrow the underlying map (used by sibling stores that layer
    /// persistence or metadata on top without duplicating the data).
    pub(crate) fn vectors(&self) -> &HashMap<String, Vec<f32>> {
        &self.vectors
    }

    pub(crate) fn set_dimension(&mut self, dim: Option<usize>) {
        self.dimension = dim;
    }

    pub(crate) fn vectors_mut(&mut self) -> &mut HashMap<String, Vec<f32>> {
        &mut self.vectors
    }
}
