//! Sidecar snapshot for fast cold starts
//!
//! One `.taproot/graph.bin` per project root: the canonical graph snapshot
//! plus the blake3 checksum of the store's node hashes at save time. On
//! load, a checksum mismatch means the store moved on without us — the
//! sidecar is silently ignored and the caller falls back to a store load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taproot_core::{DependenceGraph, GraphSnapshot};

use crate::error::EngineError;

/// Sidecar directory under the project root.
pub const SIDECAR_DIR: &str = ".taproot";

/// Graph snapshot file inside the sidecar directory.
pub const GRAPH_SNAPSHOT: &str = "graph.bin";

#[derive(Serialize, Deserialize)]
struct SidecarFile {
    /// `Store::nodes_checksum` at save time.
    nodes_checksum: String,
    graph: GraphSnapshot,
}

pub fn sidecar_dir(root: &Path) -> PathBuf {
    root.join(SIDECAR_DIR)
}

pub fn snapshot_path(root: &Path) -> PathBuf {
    root.join(SIDECAR_DIR).join(GRAPH_SNAPSHOT)
}

fn ensure_sidecar_dir(root: &Path) -> std::io::Result<()> {
    let dir = sidecar_dir(root);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Writes the sidecar snapshot, stamping it with the store checksum that
/// makes it authoritative on the next cold start.
pub fn save_snapshot(
    graph: &DependenceGraph,
    nodes_checksum: &str,
    root: &Path,
) -> Result<(), EngineError> {
    ensure_sidecar_dir(root)?;
    let file = SidecarFile {
        nodes_checksum: nodes_checksum.to_string(),
        graph: GraphSnapshot::from_graph(graph),
    };
    let bytes = bincode::serialize(&file).map_err(|e| EngineError::CorruptSnapshot(e.to_string()))?;
    let path = snapshot_path(root);
    std::fs::write(&path, bytes)?;
    tracing::debug!(path = %path.display(), "sidecar snapshot saved");
    Ok(())
}

/// Loads the sidecar snapshot if it exists *and* its recorded checksum
/// matches `expected_checksum`. A stale checksum returns `Ok(None)`; a
/// present but undecodable file is an error.
pub fn load_snapshot(
    root: &Path,
    expected_checksum: &str,
) -> Result<Option<DependenceGraph>, EngineError> {
    let path = snapshot_path(root);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path)?;
    let file: SidecarFile =
        bincode::deserialize(&bytes).map_err(|e| EngineError::CorruptSnapshot(e.to_string()))?;
    if file.nodes_checksum != expected_checksum {
        tracing::debug!(path = %path.display(), "sidecar checksum stale, ignoring");
        return Ok(None);
    }
    let graph = file.graph.into_graph()?;
    tracing::debug!(
        path = %path.display(),
        nodes = graph.node_count(),
        "graph restored from sidecar"
    );
    Ok(Some(graph))
}

/// Removes the sidecar directory.
pub fn clear_snapshot(root: &Path) -> std::io::Result<()> {
    let dir = sidecar_dir(root);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    Ok(())
}
