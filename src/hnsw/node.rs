//! Arena storage for HNSW nodes.
//!
//! Nodes are addressed by a dense `u32` handle ([`NodeId`]) rather than by
//! their string ID. The string ID only lives at the [`super::HnswIndex`]
//! boundary (the `id -> NodeId` map), so the hot insertion/search paths never
//! hash or clone strings. Neighbor sets are sorted `Vec<NodeId>` per level,
//! not hash sets — small, cache-friendly, and cheap to prune.

/// A handle into the node arena. Stable for the lifetime of the node (never
/// reused after removal, so a stale handle simply resolves to a tombstone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A single graph node: its external ID, its (already normalized) vector,
/// the top level it participates in, and one sorted neighbor list per level.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub vector: Vec<f32>,
    pub level: usize,
    pub neighbors: Vec<Vec<NodeId>>,
}

impl Node {
    pub fn new(id: String, vector: Vec<f32>, level: usize) -> Self {
        Node {
            id,
            vector,
            level,
            neighbors: vec![Vec::new(); level + 1],
        }
    }

    /// Insert `neighbor` into this node's neighbor list at `level`, keeping
    /// it sorted and free of duplicates.
    pub fn link(&mut self, level: usize, neighbor: NodeId) {
        let list = &mut self.neighbors[level];
        if let Err(pos) = list.binary_search(&neighbor) {
            list.insert(pos, neighbor);
        }
    }

    /// Remove `neighbor` from this node's neighbor list at `level`, if present.
    pub fn unlink(&mut self, level: usize, neighbor: NodeId) {
        if let Ok(pos) = self.neighbors[level].binary_search(&neighbor) {
            self.neighbors[level].remove(pos);
        }
    }

    /// Replace this node's neighbor list at `level` outright (used after
    /// pruning to its closest `cap` members).
    pub fn set_neighbors(&mut self, level: usize, mut neighbors: Vec<NodeId>) {
        neighbors.sort_unstable();
        neighbors.dedup();
        self.neighbors[level] = neighbors;
    }
}
