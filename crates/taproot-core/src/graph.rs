//! Dependence graph over petgraph::StableDiGraph with stable public ids

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{Dfs, EdgeRef, Reversed};

use crate::error::GraphError;
use crate::model::{
    DependEdge, DependKind, EdgeMetadata, NeighborDirection, NodeId, SymbolNode,
};

/// The program dependence graph: a directed multigraph over code symbols
/// with typed edges for calls, data flow, inheritance, and imports.
///
/// Public [`NodeId`]s are assigned monotonically and never reused, even
/// after removal; petgraph's recycled internal indices never leak out.
/// Parallel edges of the same kind between the same ordered pair collapse
/// into one edge, merging metadata (`call_count` adds, everything else is
/// last-writer-wins).
pub struct DependenceGraph {
    inner: StableDiGraph<SymbolNode, DependEdge>,
    ids: HashMap<NodeId, NodeIndex>,
    next_id: u64,
    symbol_index: HashMap<String, HashSet<NodeId>>,
    file_index: HashMap<String, HashSet<NodeId>>,
}

impl std::fmt::Debug for DependenceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependenceGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl DependenceGraph {
    pub fn new() -> Self {
        DependenceGraph {
            inner: StableDiGraph::new(),
            ids: HashMap::new(),
            next_id: 0,
            symbol_index: HashMap::new(),
            file_index: HashMap::new(),
        }
    }

    /// Adds a node, updating both derived indices. Returns the assigned id.
    ///
    /// The graph does not deduplicate: callers that want idempotent ingest
    /// deduplicate by `content_hash` before inserting.
    pub fn add_node(&mut self, mut node: SymbolNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let now = chrono::Utc::now().timestamp();
        if node.created_at == 0 {
            node.created_at = now;
        }
        if node.updated_at == 0 {
            node.updated_at = now;
        }
        node.id = id;

        self.symbol_index
            .entry(node.symbol_name.clone())
            .or_default()
            .insert(id);
        self.file_index
            .entry(node.file_path.clone())
            .or_default()
            .insert(id);

        let idx = self.inner.add_node(node);
        self.ids.insert(id, idx);
        id
    }

    /// Replaces the node behind `id` (re-extraction), keeping the id and
    /// bumping `updated_at`. Index entries follow the new name and path.
    pub fn replace_node(&mut self, id: NodeId, mut node: SymbolNode) -> Result<(), GraphError> {
        let idx = *self.ids.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        let old = &self.inner[idx];

        if old.symbol_name != node.symbol_name {
            if let Some(set) = self.symbol_index.get_mut(&old.symbol_name) {
                set.remove(&id);
                if set.is_empty() {
                    self.symbol_index.remove(&old.symbol_name);
                }
            }
            self.symbol_index
                .entry(node.symbol_name.clone())
                .or_default()
                .insert(id);
        }
        if old.file_path != node.file_path {
            if let Some(set) = self.file_index.get_mut(&old.file_path) {
                set.remove(&id);
                if set.is_empty() {
                    self.file_index.remove(&old.file_path);
                }
            }
            self.file_index
                .entry(node.file_path.clone())
                .or_default()
                .insert(id);
        }

        node.id = id;
        node.created_at = old.created_at;
        node.updated_at = chrono::Utc::now().timestamp();
        self.inner[idx] = node;
        Ok(())
    }

    /// Adds a directed typed edge. Fails with `DanglingEndpoint` when either
    /// endpoint is missing, leaving the graph unchanged.
    ///
    /// A parallel edge of the same kind between the same ordered pair merges
    /// into the existing one: `call_count` adds, other metadata is
    /// last-writer-wins.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: DependKind,
        metadata: EdgeMetadata,
    ) -> Result<(), GraphError> {
        let (src_idx, dst_idx) = self.endpoints(source, target)?;

        let existing = self
            .inner
            .edges_connecting(src_idx, dst_idx)
            .find(|e| e.weight().kind == kind)
            .map(|e| e.id());
        match existing {
            Some(edge_idx) => {
                self.inner[edge_idx].metadata.merge(metadata);
            }
            None => {
                self.inner
                    .add_edge(src_idx, dst_idx, DependEdge::with_metadata(kind, metadata));
            }
        }
        Ok(())
    }

    fn endpoints(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> Result<(NodeIndex, NodeIndex), GraphError> {
        match (self.ids.get(&source), self.ids.get(&target)) {
            (Some(&s), Some(&t)) => Ok((s, t)),
            _ => Err(GraphError::DanglingEndpoint { src: source, target }),
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&SymbolNode> {
        self.ids.get(&id).map(|&idx| &self.inner[idx])
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut SymbolNode> {
        self.ids.get(&id).map(|&idx| &mut self.inner[idx])
    }

    /// Looks up the edge on the composite key `(source, target, kind)`.
    pub fn get_edge(
        &self,
        source: NodeId,
        target: NodeId,
        kind: DependKind,
    ) -> Option<&DependEdge> {
        let (src_idx, dst_idx) = self.endpoints(source, target).ok()?;
        self.inner
            .edges_connecting(src_idx, dst_idx)
            .map(|e| e.weight())
            .find(|e| e.kind == kind)
    }

    /// All live nodes carrying `symbol_name`.
    pub fn find_by_symbol(&self, symbol_name: &str) -> HashSet<NodeId> {
        self.symbol_index
            .get(symbol_name)
            .cloned()
            .unwrap_or_default()
    }

    /// All live nodes located in `file_path`.
    pub fn nodes_in_file(&self, file_path: &str) -> HashSet<NodeId> {
        self.file_index.get(file_path).cloned().unwrap_or_default()
    }

    /// Adjacent node ids in the requested direction. `Both` deduplicates.
    pub fn neighbors(&self, id: NodeId, direction: NeighborDirection) -> Vec<NodeId> {
        let Some(&idx) = self.ids.get(&id) else {
            return Vec::new();
        };
        let adjacent = |dir: Direction| {
            self.inner
                .neighbors_directed(idx, dir)
                .map(|n| self.inner[n].id)
        };
        match direction {
            NeighborDirection::Out => adjacent(Direction::Outgoing).collect(),
            NeighborDirection::In => adjacent(Direction::Incoming).collect(),
            NeighborDirection::Both => {
                let mut seen = HashSet::new();
                adjacent(Direction::Outgoing)
                    .chain(adjacent(Direction::Incoming))
                    .filter(|n| seen.insert(*n))
                    .collect()
            }
        }
    }

    /// Removes a node, cascading to incident edges and index entries.
    /// The id is retired and never reassigned.
    pub fn remove_node(&mut self, id: NodeId) -> Option<SymbolNode> {
        let idx = self.ids.remove(&id)?;
        let node = self.inner.remove_node(idx)?;
        if let Some(set) = self.symbol_index.get_mut(&node.symbol_name) {
            set.remove(&id);
            if set.is_empty() {
                self.symbol_index.remove(&node.symbol_name);
            }
        }
        if let Some(set) = self.file_index.get_mut(&node.file_path) {
            set.remove(&id);
            if set.is_empty() {
                self.file_index.remove(&node.file_path);
            }
        }
        Some(node)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterates over all nodes in insertion order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &SymbolNode> {
        self.inner.node_indices().map(|idx| &self.inner[idx])
    }

    /// Iterates over all edges as `(source, target, edge)`.
    pub fn all_edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &DependEdge)> {
        self.inner.edge_indices().filter_map(|idx| {
            let (source, target) = self.inner.edge_endpoints(idx)?;
            Some((
                self.inner[source].id,
                self.inner[target].id,
                &self.inner[idx],
            ))
        })
    }

    // ── Impact analysis ─────────────────────────────────────

    /// All nodes transitively reachable from `id` via outgoing edges,
    /// excluding `id` itself. Cycles are handled by the DFS visited set.
    pub fn forward_impact(&self, id: NodeId) -> HashSet<NodeId> {
        let Some(&start) = self.ids.get(&id) else {
            return HashSet::new();
        };
        let mut impact = HashSet::new();
        let mut dfs = Dfs::new(&self.inner, start);
        while let Some(nx) = dfs.next(&self.inner) {
            if nx != start {
                impact.insert(self.inner[nx].id);
            }
        }
        impact
    }

    /// All nodes that can reach `id`: the forward impact on the reversed
    /// graph.
    pub fn backward_impact(&self, id: NodeId) -> HashSet<NodeId> {
        let Some(&start) = self.ids.get(&id) else {
            return HashSet::new();
        };
        let reversed = Reversed(&self.inner);
        let mut impact = HashSet::new();
        let mut dfs = Dfs::new(reversed, start);
        while let Some(nx) = dfs.next(reversed) {
            if nx != start {
                impact.insert(self.inner[nx].id);
            }
        }
        impact
    }

    // ── Bulk edge builders ──────────────────────────────────

    /// Adds a batch of `Call` edges. Validates every endpoint before
    /// inserting anything, so a bad pair leaves the graph unchanged.
    pub fn add_call_graph_edges(
        &mut self,
        calls: &[(NodeId, NodeId)],
    ) -> Result<(), GraphError> {
        self.check_pairs(calls.iter().copied())?;
        for &(caller, callee) in calls {
            self.add_edge(caller, callee, DependKind::Call, EdgeMetadata::default())?;
        }
        Ok(())
    }

    /// Adds a batch of `DataDependency` edges, recording the shared
    /// variable or type name on each.
    pub fn add_data_flow_edges(
        &mut self,
        flows: &[(NodeId, NodeId, String)],
    ) -> Result<(), GraphError> {
        self.check_pairs(flows.iter().map(|(a, b, _)| (*a, *b)))?;
        for (from, to, variable) in flows {
            let metadata = EdgeMetadata {
                variable_name: Some(variable.clone()),
                ..EdgeMetadata::default()
            };
            self.add_edge(*from, *to, DependKind::DataDependency, metadata)?;
        }
        Ok(())
    }

    /// Adds a batch of `Inheritance` edges (child -> parent).
    pub fn add_inheritance_edges(
        &mut self,
        inheritances: &[(NodeId, NodeId)],
    ) -> Result<(), GraphError> {
        self.check_pairs(inheritances.iter().copied())?;
        for &(child, parent) in inheritances {
            self.add_edge(child, parent, DependKind::Inheritance, EdgeMetadata::default())?;
        }
        Ok(())
    }

    fn check_pairs(
        &self,
        pairs: impl Iterator<Item = (NodeId, NodeId)>,
    ) -> Result<(), GraphError> {
        for (source, target) in pairs {
            self.endpoints(source, target)?;
        }
        Ok(())
    }
}

impl Default for DependenceGraph {
    fn default() -> Self {
        Self::new()
    }
}
