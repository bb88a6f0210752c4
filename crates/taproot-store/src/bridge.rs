//! Round-trip between the in-memory dependence graph and the store
//!
//! Saving replaces a project's rows wholesale inside one transaction, so
//! the latest save wins on reload and a failed save leaves the previous
//! state intact. Loading reconstructs the graph, remapping database ids
//! onto fresh node ids and rebuilding both derived indices.

use std::collections::HashMap;

use rusqlite::params;
use taproot_core::{
    ByteRange, CancelToken, ContentHash, DependKind, DependenceGraph, EdgeMetadata, NodeId,
    SymbolNode,
};
use taproot_embed::{blob_to_vector, vector_to_blob};

use crate::error::StoreError;
use crate::store::{Store, insert_edge_tx, insert_node_tx};
use crate::records::{EdgeRecord, NodeRecord};

impl Store {
    /// Persists every live node and edge of `graph` under `project_id`,
    /// replacing whatever the project held before. Atomic per project:
    /// on error or cancellation the previous state stays visible.
    ///
    /// Durability is relaxed to the configured bulk level for the duration
    /// and restored afterwards.
    pub fn save_graph(
        &mut self,
        project_id: &str,
        graph: &DependenceGraph,
        cancel: Option<&CancelToken>,
    ) -> Result<(), StoreError> {
        self.begin_bulk()?;
        let result = self.save_graph_inner(project_id, graph, cancel);
        let restored = self.end_bulk();
        result?;
        restored
    }

    fn save_graph_inner(
        &mut self,
        project_id: &str,
        graph: &DependenceGraph,
        cancel: Option<&CancelToken>,
    ) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "DELETE FROM intel_edges WHERE caller_id IN
                 (SELECT id FROM intel_nodes WHERE project_id = ?1)
             OR callee_id IN
                 (SELECT id FROM intel_nodes WHERE project_id = ?1)",
            params![project_id],
        )?;
        tx.execute(
            "DELETE FROM intel_nodes WHERE project_id = ?1",
            params![project_id],
        )?;

        let mut id_map: HashMap<NodeId, i64> = HashMap::new();
        for node in graph.all_nodes() {
            if let Some(token) = cancel {
                token.checkpoint()?;
            }
            let record = NodeRecord {
                id: None,
                project_id: project_id.to_string(),
                file_path: node.file_path.clone(),
                symbol_name: node.symbol_name.clone(),
                qualified_name: node.qualified_name.clone(),
                kind: node.kind,
                signature: node.signature.clone(),
                byte_start: node.byte_range.start,
                byte_end: node.byte_range.end,
                complexity: node.complexity,
                content_hash: node.content_hash.to_hex(),
                embedding: node.embedding.as_deref().map(vector_to_blob),
                created_at: node.created_at,
                updated_at: now,
            };
            let db_id = insert_node_tx(&tx, &record)?;
            id_map.insert(node.id, db_id);
        }

        for (source, target, edge) in graph.all_edges() {
            if let Some(token) = cancel {
                token.checkpoint()?;
            }
            let record = EdgeRecord {
                caller_id: id_map[&source],
                callee_id: id_map[&target],
                kind: edge.kind,
                metadata: edge.metadata.clone(),
            };
            insert_edge_tx(&tx, &record)?;
        }

        tx.commit()?;
        tracing::info!(
            project_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph saved"
        );
        Ok(())
    }

    /// Reconstructs a project's graph, rebuilding the symbol and file
    /// indices. Fails with `CorruptStore` on any dangling edge endpoint or
    /// unreadable enum tag.
    pub fn load_graph(
        &self,
        project_id: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<DependenceGraph, StoreError> {
        let mut graph = DependenceGraph::new();
        let mut id_map: HashMap<i64, NodeId> = HashMap::new();

        for record in self.nodes_in_project(project_id)? {
            if let Some(token) = cancel {
                token.checkpoint()?;
            }
            let db_id = record.id.expect("loaded row has id");
            let content_hash = ContentHash::from_hex(&record.content_hash).ok_or_else(|| {
                StoreError::CorruptStore(format!(
                    "bad content hash on node {db_id}: {}",
                    record.content_hash
                ))
            })?;
            let node = SymbolNode {
                id: NodeId::default(),
                project_id: record.project_id,
                file_path: record.file_path,
                symbol_name: record.symbol_name,
                qualified_name: record.qualified_name,
                kind: record.kind,
                signature: record.signature,
                byte_range: ByteRange::new(record.byte_start, record.byte_end),
                complexity: record.complexity,
                content_hash,
                embedding: record.embedding.as_deref().and_then(blob_to_vector),
                created_at: record.created_at,
                updated_at: record.updated_at,
            };
            id_map.insert(db_id, graph.add_node(node));
        }

        let mut stmt = self.conn().prepare_cached(
            "SELECT e.caller_id, e.callee_id, e.edge_type, e.metadata
             FROM intel_edges e
             JOIN intel_nodes n ON e.caller_id = n.id
             WHERE n.project_id = ?1
             ORDER BY e.caller_id, e.callee_id",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        for row in rows {
            if let Some(token) = cancel {
                token.checkpoint()?;
            }
            let (caller_id, callee_id, kind_tag, metadata_json) = row?;
            let source = *id_map.get(&caller_id).ok_or_else(|| {
                StoreError::CorruptStore(format!("edge caller {caller_id} not in project"))
            })?;
            let target = *id_map.get(&callee_id).ok_or_else(|| {
                StoreError::CorruptStore(format!("edge callee {callee_id} not in project"))
            })?;
            let kind = DependKind::from_str_name(&kind_tag).ok_or_else(|| {
                StoreError::CorruptStore(format!("unknown edge type: {kind_tag}"))
            })?;
            let metadata: EdgeMetadata = match metadata_json.as_deref() {
                Some(json) => serde_json::from_str(json)?,
                None => EdgeMetadata::default(),
            };
            graph.add_edge(source, target, kind, metadata)?;
        }

        tracing::debug!(
            project_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        Ok(graph)
    }

    /// Blake3 checksum over the project's node content hashes, sorted.
    /// The sidecar snapshot is authoritative only while its recorded
    /// checksum matches this value.
    pub fn nodes_checksum(&self, project_id: &str) -> Result<String, StoreError> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT content_hash FROM intel_nodes
             WHERE project_id = ?1 ORDER BY content_hash",
        )?;
        let rows = stmt.query_map(params![project_id], |row| row.get::<_, String>(0))?;
        let mut hasher = blake3::Hasher::new();
        for row in rows {
            hasher.update(row?.as_bytes());
        }
        Ok(hasher.finalize().to_hex().to_string())
    }
}
