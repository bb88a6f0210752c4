//! Canonical byte format for the dependence graph
//!
//! The snapshot captures node records in insertion order plus edge records
//! keyed by node id. Derived indices are not stored; decoding rebuilds them.
//! Decoding reassigns node ids and remaps incident edges, so round-tripped
//! graphs are isomorphic rather than id-identical.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::DependenceGraph;
use crate::model::{DependEdge, NodeId, SymbolNode};

/// One serialized edge: endpoints refer to node ids as they were at
/// encoding time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub edge: DependEdge,
}

/// The serializable form of a [`DependenceGraph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<SymbolNode>,
    pub edges: Vec<SnapshotEdge>,
}

impl GraphSnapshot {
    pub fn from_graph(graph: &DependenceGraph) -> Self {
        GraphSnapshot {
            nodes: graph.all_nodes().cloned().collect(),
            edges: graph
                .all_edges()
                .map(|(source, target, edge)| SnapshotEdge {
                    source,
                    target,
                    edge: edge.clone(),
                })
                .collect(),
        }
    }

    /// Rebuilds a graph, reassigning ids and remapping edges. Fails with
    /// `CorruptGraph` when an edge references a node not in the snapshot.
    pub fn into_graph(self) -> Result<DependenceGraph, GraphError> {
        let mut graph = DependenceGraph::new();
        let mut remap = std::collections::HashMap::with_capacity(self.nodes.len());
        for node in self.nodes {
            let old_id = node.id;
            let new_id = graph.add_node(node);
            remap.insert(old_id, new_id);
        }
        for record in self.edges {
            let source = *remap.get(&record.source).ok_or_else(|| {
                GraphError::CorruptGraph(format!("edge source {} missing", record.source))
            })?;
            let target = *remap.get(&record.target).ok_or_else(|| {
                GraphError::CorruptGraph(format!("edge target {} missing", record.target))
            })?;
            graph.add_edge(source, target, record.edge.kind, record.edge.metadata)?;
        }
        Ok(graph)
    }
}

impl DependenceGraph {
    /// Encodes the graph into its canonical byte format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GraphError> {
        bincode::serialize(&GraphSnapshot::from_graph(self))
            .map_err(|e| GraphError::CorruptGraph(e.to_string()))
    }

    /// Decodes a graph from its canonical byte format, rebuilding both
    /// derived indices. Any dangling edge reference fails the whole decode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
        let snapshot: GraphSnapshot =
            bincode::deserialize(bytes).map_err(|e| GraphError::CorruptGraph(e.to_string()))?;
        snapshot.into_graph()
    }
}
