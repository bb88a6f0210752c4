//! Bounded embedding cache with FIFO eviction
//!
//! Eviction is strictly insertion-ordered: reads never promote an entry.
//! That keeps the cache auditable and lets reads stay lock-free on the
//! entry map while a single mutex serializes insert/evict.

use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::DashMap;
use taproot_core::NodeId;

use crate::embedding::{NodeEmbedding, similarity};

/// Shared, bounded cache of the most recently inserted node embeddings.
pub struct EmbeddingCache {
    entries: DashMap<NodeId, NodeEmbedding>,
    /// Insertion order; guarded so insert and evict stay consistent.
    order: Mutex<VecDeque<NodeId>>,
    max_entries: usize,
}

impl EmbeddingCache {
    /// `max_entries` of zero is clamped to one.
    pub fn new(max_entries: usize) -> Self {
        EmbeddingCache {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Inserts an embedding, returning the id evicted to make room, if any.
    ///
    /// Re-inserting an existing id replaces the value in place and keeps
    /// its original position in the eviction order.
    pub fn insert(&self, embedding: NodeEmbedding) -> Option<NodeId> {
        let id = embedding.node_id;
        let mut order = self.order.lock().expect("embedding cache order poisoned");

        if self.entries.insert(id, embedding).is_some() {
            return None;
        }
        order.push_back(id);

        if order.len() > self.max_entries {
            let evicted = order.pop_front().expect("non-empty order queue");
            self.entries.remove(&evicted);
            tracing::trace!(%evicted, "embedding evicted");
            return Some(evicted);
        }
        None
    }

    /// Lock-free read; entries are value types, so a racing eviction only
    /// means the clone was taken just in time.
    pub fn get(&self, node_id: NodeId) -> Option<NodeEmbedding> {
        self.entries.get(&node_id).map(|e| e.value().clone())
    }

    pub fn remove(&self, node_id: NodeId) -> Option<NodeEmbedding> {
        let mut order = self.order.lock().expect("embedding cache order poisoned");
        order.retain(|id| *id != node_id);
        self.entries.remove(&node_id).map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scans every cached embedding against `query`, returning the top `k`
    /// by descending score; ties break on ascending node id. Mismatched
    /// dimensions score zero and therefore rank last.
    pub fn find_similar(&self, query: &[f32], k: usize) -> Vec<(NodeId, f32)> {
        let mut scored: Vec<(NodeId, f32)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), similarity(query, &entry.value().vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }
}
