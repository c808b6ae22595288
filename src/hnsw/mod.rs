//! # HNSW approximate nearest-neighbor graph
//!
//! A Hierarchical Navigable Small World graph: a stack of proximity graphs
//! where upper layers are sparse long-range shortcuts and layer 0 holds
//! every node. Search descends greedily through the sparse layers to find a
//! good entry point, then does a bounded best-first expansion at layer 0.
//!
//! Nodes are stored in an arena ([`node::Node`] behind [`node::NodeId`]
//! handles) rather than keyed by string ID, so the hot path never hashes a
//! string; the `id -> NodeId` map lives only at this module's boundary.
//! Vectors are L2-normalized once at insertion, so every distance
//! computation afterward is a plain dot product
//! ([`crate::math::normalized_cosine_distance`]) — a zero-norm vector is
//! left unnormalized (all zeros), which naturally yields distance `1.0`
//! against anything without any special-casing.

mod node;
mod rng;
mod search;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, VecStreamError};
use crate::math::{normalize, normalized_cosine_distance};

pub use node::NodeId;
use node::Node;
use search::HeapEntry;

/// Tuning parameters for an [`HnswIndex`].
#[derive(Debug, Clone)]
pub struct HnswParams {
    /// Target degree at levels >= 1.
    pub m: usize,
    /// Maximum degree at level 0.
    pub m_max0: usize,
    /// Candidate list size used during insertion.
    pub ef_construction: usize,
    /// Soft maximum level cap.
    pub ml: usize,
    /// Seed for the level-sampling PRNG, so graphs (and therefore searches)
    /// are reproducible.
    pub seed: u64,
}

impl Default for HnswParams {
    fn default() -> Self {
        HnswParams {
            m: 16,
            m_max0: 32,
            ef_construction: 200,
            ml: 9,
            seed: 0x5EED,
        }
    }
}

/// A Hierarchical Navigable Small World index.
///
/// Construction cost and memory scale with `M`/`ef_construction`; query
/// recall trades off against `ef_search`. See [`HnswParams`].
#[derive(Debug)]
pub struct HnswIndex {
    nodes: Vec<Option<Node>>,
    id_to_node: HashMap<String, NodeId>,
    entry_point: Option<NodeId>,
    dimension: Option<usize>,
    params: HnswParams,
    rng: ChaCha8Rng,
}

impl HnswIndex {
    pub fn new(params: HnswParams) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(params.seed);
        HnswIndex {
            nodes: Vec::new(),
            id_to_node: HashMap::new(),
            entry_point: None,
            dimension: None,
            params,
            rng,
        }
    }

    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of live (non-removed) nodes.
    pub fn len(&self) -> usize {
        self.id_to_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_node.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_node.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.id_to_node.keys().map(|s| s.as_str())
    }

    /// Neighbor IDs of `id` at `level`, for graph-invariant tests.
    pub fn neighbors_at(&self, id: &str, level: usize) -> Vec<String> {
        let Some(&node_id) = self.id_to_node.get(id) else {
            return Vec::new();
        };
        let Some(node) = self.get_node(node_id) else {
            return Vec::new();
        };
        if level >= node.neighbors.len() {
            return Vec::new();
        }
        node.neighbors[level]
            .iter()
            .filter_map(|&n| self.get_node(n).map(|n| n.id.clone()))
            .collect()
    }

    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.id_to_node
            .get(id)
            .and_then(|&n| self.get_node(n))
            .map(|n| n.level)
    }

    fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(|n| n.as_ref())
    }

    /// Insert or, if `id` already exists, overwrite its vector in place.
    ///
    /// Reinsertion deliberately does not touch the graph: only the stored
    /// vector is replaced, matching the source behavior this is ported
    /// from. A node whose vector moves substantially keeps edges computed
    /// against its old position until it is removed and re-added.
    pub fn add_item(&mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let id = id.into();
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

        let normalized = normalize(&vector).unwrap_or(vector);

        if let Some(&existing) = self.id_to_node.get(&id) {
            if let Some(node) = self.nodes[existing.0 as usize].as_mut() {
                node.vector = normalized;
            }
            return Ok(());
        }

        let level = rng::sample_level(&mut self.rng, self.params.m, self.params.m_max0, self.params.ml);
        let new_id = NodeId(self.nodes.len() as u32);
        let node = Node::new(id.clone(), normalized.clone(), level);

        let Some(entry_point) = self.entry_point else {
            self.nodes.push(Some(node));
            self.id_to_node.insert(id, new_id);
            self.entry_point = Some(new_id);
            return Ok(());
        };

        let entry_level = self.get_node(entry_point).map(|n| n.level).unwrap_or(0);

        let mut current = entry_point;
        if entry_level > level {
            for lvl in (level + 1..=entry_level).rev() {
                current = self.greedy_closest(&normalized, current, lvl);
            }
        }

        self.nodes.push(Some(node));
        self.id_to_node.insert(id, new_id);

        for lvl in (0..=level.min(entry_level)).rev() {
            let candidates = self.search_layer(&normalized, current, self.params.ef_construction, lvl);
            let cap = if lvl == 0 { self.params.m_max0 } else { self.params.m };
            let selected: Vec<NodeId> = candidates.iter().take(cap).map(|e| e.node).collect();
            if let Some(&closest) = selected.first() {
                current = closest;
            }

            for &neighbor in &selected {
                if let Some(n) = self.nodes[new_id.0 as usize].as_mut() {
                    n.link(lvl, neighbor);
                }
                if let Some(n) = self.nodes[neighbor.0 as usize].as_mut() {
                    if lvl < n.neighbors.len() {
                        n.link(lvl, new_id);
                    }
                }
                self.prune_if_needed(neighbor, lvl);
            }
        }

        if level > entry_level {
            self.entry_point = Some(new_id);
        }

        Ok(())
    }

    /// Remove `id` from the graph, unlinking it from every neighbor at
    /// every level it participated in. Does not attempt to repair any
    /// partition the removal creates.
    pub fn remove_item(&mut self, id: &str) -> Result<()> {
        let node_id = self
            .id_to_node
            .remove(id)
            .ok_or_else(|| VecStreamError::NotFound(id.to_string()))?;

        let level = self.get_node(node_id).map(|n| n.level).unwrap_or(0);
        for lvl in 0..=level {
            let neighbors = self
                .get_node(node_id)
                .map(|n| n.neighbors[lvl].clone())
                .unwrap_or_default();
            for n in neighbors {
                if let Some(neighbor_node) = self.nodes[n.0 as usize].as_mut() {
                    neighbor_node.unlink(lvl, node_id);
                }
            }
        }
        self.nodes[node_id.0 as usize] = None;

        if self.entry_point == Some(node_id) {
            self.entry_point = self
                .nodes
                .iter()
                .enumerate()
                .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n.level)))
                .max_by_key(|&(_, lvl)| lvl)
                .map(|(id, _)| id);
        }

        Ok(())
    }

    /// Approximate top-`k` search. `ef_search` defaults to
    /// `ef_construction` when `None`, and is always widened to at least `k`.
    /// An empty graph returns `[]`.
    pub fn search(&self, query: &[f32], k: usize, ef_search: Option<usize>) -> Vec<(String, f32)> {
        let Some(entry_point) = self.entry_point else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let normalized_query = normalize(query).unwrap_or_else(|| query.to_vec());
        let entry_level = self.get_node(entry_point).map(|n| n.level).unwrap_or(0);

        let mut current = entry_point;
        for lvl in (1..=entry_level).rev() {
            current = self.greedy_closest(&normalized_query, current, lvl);
        }

        let ef = ef_search.unwrap_or(self.params.ef_construction).max(k);
        let results = self.search_layer(&normalized_query, current, ef, 0);

        results
            .into_iter()
            .take(k)
            .filter_map(|e| self.get_node(e.node).map(|n| (n.id.clone(), 1.0 - e.distance)))
            .collect()
    }

    /// Greedy single-step refinement at `level`: the best node found by an
    /// `ef=1` expansion from `entry`.
    fn greedy_closest(&self, query: &[f32], entry: NodeId, level: usize) -> NodeId {
        self.search_layer(query, entry, 1, level)
            .first()
            .map(|e| e.node)
            .unwrap_or(entry)
    }

    /// Standard best-first expansion at a single layer: a min-heap of
    /// candidates to expand and a bounded max-heap of the `ef` best results
    /// found so far. Expansion stops once the best candidate remaining is
    /// worse than the current worst kept result and the result set is full.
    fn search_layer(&self, query: &[f32], entry: NodeId, ef: usize, level: usize) -> Vec<HeapEntry> {
        let mut visited = HashSet::new();
        visited.insert(entry);

        let Some(entry_node) = self.get_node(entry) else {
            return Vec::new();
        };
        let entry_dist = normalized_cosine_distance(query, &entry_node.vector);

        let mut candidates: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
        candidates.push(Reverse(HeapEntry::new(entry_dist, entry)));

        let mut best: BinaryHeap<HeapEntry> = BinaryHeap::new();
        best.push(HeapEntry::new(entry_dist, entry));

        while let Some(Reverse(current)) = candidates.pop() {
            let worst_kept = best.peek().map(|e| e.distance).unwrap_or(f32::INFINITY);
            if best.len() >= ef && current.distance > worst_kept {
                break;
            }

            let Some(node) = self.get_node(current.node) else {
                continue;
            };
            if level >= node.neighbors.len() {
                continue;
            }

            for &neighbor_id in &node.neighbors[level] {
                if !visited.insert(neighbor_id) {
                    continue;
                }
                let Some(neighbor_node) = self.get_node(neighbor_id) else {
                    continue;
                };
                let d = normalized_cosine_distance(query, &neighbor_node.vector);
                let worst_kept = best.peek().map(|e| e.distance).unwrap_or(f32::INFINITY);
                if best.len() < ef || d < worst_kept {
                    candidates.push(Reverse(HeapEntry::new(d, neighbor_id)));
                    best.push(HeapEntry::new(d, neighbor_id));
                    if best.len() > ef {
                        best.pop();
                    }
                }
            }
        }

        best.into_sorted_vec()
    }

    /// After linking `neighbor` to a new node at `level`, re-select its
    /// closest `cap` neighbors if it now exceeds the degree cap, dropping
    /// the reciprocal edge on anything pruned away so the graph stays
    /// symmetric.
    fn prune_if_needed(&mut self, neighbor: NodeId, level: usize) {
        let cap = if level == 0 { self.params.m_max0 } else { self.params.m };

        let Some(neighbor_node) = self.get_node(neighbor) else {
            return;
        };
        if level >= neighbor_node.neighbors.len() || neighbor_node.neighbors[level].len() <= cap {
            return;
        }
        let neighbor_vector = neighbor_node.vector.clone();
        let current_edges = neighbor_node.neighbors[level].clone();

        let mut scored: Vec<(f32, NodeId)> = current_edges
            .iter()
            .filter_map(|&n| {
                self.get_node(n)
                    .map(|n_node| (normalized_cosine_distance(&neighbor_vector, &n_node.vector), n))
            })
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(cap);
        let kept: Vec<NodeId> = scored.into_iter().map(|(_, n)| n).collect();

        for &edge in &current_edges {
            if !kept.contains(&edge) {
                if let Some(other) = self.nodes[edge.0 as usize].as_mut() {
                    other.unlink(level, neighbor);
                }
            }
        }
        if let Some(n) = self.nodes[neighbor.0 as usize].as_mut() {
            n.set_neighbors(level, kept);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(v: Vec<f32>) -> Vec<f32> {
        normalize(&v).unwrap_or(v)
    }

    #[test]
    fn exact_hit_on_inserted_vector() {
        let mut index = HnswIndex::new(HnswParams::default());
        index.add_item("a", vec![1.0, 0.0, 0.0]).unwrap();
        index.add_item("b", vec![0.0, 1.0, 0.0]).unwrap();
        index.add_item("c", vec![0.0, 0.0, 1.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 1, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
        assert!((results[0].1 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_graph_search_returns_empty() {
        let index = HnswIndex::new(HnswParams::default());
        assert!(index.search(&[1.0, 0.0], 5, None).is_empty());
    }

    #[test]
    fn dimension_mismatch_on_insert_fails() {
        let mut index = HnswIndex::new(HnswParams::default());
        index.add_item("a", vec![1.0, 0.0]).unwrap();
        let err = index.add_item("b", vec![1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, VecStreamError::InvalidDimension { expected: 2, actual: 3 }));
    }

    #[test]
    fn remove_absent_is_not_found() {
        let mut index = HnswIndex::new(HnswParams::default());
        assert!(matches!(index.remove_item("ghost"), Err(VecStreamError::NotFound(_))));
    }

    #[test]
    fn reinsert_does_not_relink() {
        let mut index = HnswIndex::new(HnswParams::default());
        index.add_item("a", vec![1.0, 0.0]).unwrap();
        index.add_item("b", vec![0.9, 0.1]).unwrap();
        let edges_before = index.neighbors_at("a", 0);

        // Move "a" to the opposite side of the space; edges are untouched.
        index.add_item("a", vec![-1.0, 0.0]).unwrap();
        let edges_after = index.neighbors_at("a", 0);
        assert_eq!(edges_before, edges_after);

        // The stored vector itself did change.
        let results = index.search(&[-1.0, 0.0], 1, None);
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn remove_drops_reciprocal_edges() {
        let mut index = HnswIndex::new(HnswParams::default());
        for i in 0..20 {
            let angle = i as f32 * 0.1;
            index.add_item(format!("v{i}"), unit(vec![angle.cos(), angle.sin()])).unwrap();
        }
        index.remove_item("v5").unwrap();
        for other in index.ids().map(String::from).collect::<Vec<_>>() {
            assert!(!index.neighbors_at(&other, 0).contains(&"v5".to_string()));
        }
        let results = index.search(&unit(vec![0.5_f32.cos(), 0.5_f32.sin()]), 19, None);
        assert!(!results.iter().any(|(id, _)| id == "v5"));
    }

    #[test]
    fn edges_are_symmetric_at_every_level() {
        let mut index = HnswIndex::new(HnswParams::default());
        for i in 0..60 {
            let angle = i as f32 * 0.2;
            index.add_item(format!("v{i}"), unit(vec![angle.cos(), angle.sin(), (angle * 0.3).sin()])).unwrap();
        }
        for id in index.ids().map(String::from).collect::<Vec<_>>() {
            let level = index.level_of(&id).unwrap();
            for lvl in 0..=level {
                for neighbor in index.neighbors_at(&id, lvl) {
                    assert!(
                        index.neighbors_at(&neighbor, lvl).contains(&id),
                        "{id} -> {neighbor} at level {lvl} is not reciprocated"
                    );
                }
            }
        }
    }

    #[test]
    fn degree_caps_are_respected() {
        let mut index = HnswIndex::new(HnswParams::default());
        for i in 0..200 {
            let angle = i as f32 * 0.05;
            index.add_item(format!("v{i}"), unit(vec![angle.cos(), angle.sin()])).unwrap();
        }
        for id in index.ids().map(String::from).collect::<Vec<_>>() {
            let level = index.level_of(&id).unwrap();
            assert!(index.neighbors_at(&id, 0).len() <= index.params().m_max0);
            for lvl in 1..=level {
                assert!(index.neighbors_at(&id, lvl).len() <= index.params().m);
            }
        }
    }

    #[test]
    fn reproducible_with_same_seed() {
        let mut a = HnswIndex::new(HnswParams { seed: 99, ..HnswParams::default() });
        let mut b = HnswIndex::new(HnswParams { seed: 99, ..HnswParams::default() });
        for i in 0..30 {
            let angle = i as f32 * 0.2;
            let v = unit(vec![angle.cos(), angle.sin()]);
            a.add_item(format!("v{i}"), v.clone()).unwrap();
            b.add_item(format!("v{i}"), v).unwrap();
        }
        for i in 0..30 {
            assert_eq!(a.level_of(&format!("v{i}")), b.level_of(&format!("v{i}")));
        }
    }
}
