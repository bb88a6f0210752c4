//! Lifts parsed signatures into graph nodes and coarse edges
//!
//! Only two edge families can be synthesized from signatures alone:
//!
//! - `DataDependency`, between functions sharing a parameter type. This is
//!   heuristic and may overconnect.
//! - `Inheritance`, from qualified-name class clusters (`A::m1`, `A::m2`)
//!   and, across classes, from method-name overlap above a threshold.
//!
//! `Call` edges are *not* derivable from signatures; they come from an
//! AST-level extractor supplied externally, and their absence is not an
//! error.

use std::collections::{BTreeMap, HashSet};

use taproot_core::{
    ContentHash, DependKind, DependenceGraph, EdgeMetadata, GraphError, MetaValue, NodeId,
    SymbolKind, SymbolNode,
};

use crate::signature::SignatureInfo;

/// Extraction knobs.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Minimum shared-method-name ratio before two classes are linked with
    /// an `Inheritance` edge. Known to produce false positives; see the
    /// module docs.
    pub method_overlap_threshold: f32,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        ExtractorOptions {
            method_overlap_threshold: 0.5,
        }
    }
}

/// A per-file extraction problem. Problems never abort the batch; the
/// offending signature is skipped and reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNote {
    pub file_path: String,
    pub message: String,
}

/// What one extraction run produced.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Ids of nodes inserted by this run, in input order.
    pub node_ids: Vec<NodeId>,
    /// For each entry of `node_ids`, the index of the signature it came
    /// from. Lets callers align per-signature data (e.g. embeddings) with
    /// the lifted nodes even when some signatures were skipped.
    pub source_indices: Vec<usize>,
    /// Signatures skipped as duplicates of already-present nodes.
    pub duplicates: usize,
    pub notes: Vec<IndexNote>,
}

/// Lifts `signatures` into `graph`, deduplicating by
/// `(file_path, name, content_hash)` against nodes already present, then
/// synthesizes the heuristic edge families.
pub fn extract_into(
    graph: &mut DependenceGraph,
    signatures: &[SignatureInfo],
    options: &ExtractorOptions,
) -> Result<ExtractionOutcome, GraphError> {
    let mut outcome = ExtractionOutcome::default();
    let mut lifted: Vec<(NodeId, usize)> = Vec::new();
    let mut seen: HashSet<(String, String, ContentHash)> = HashSet::new();

    for (index, sig) in signatures.iter().enumerate() {
        if sig.symbol_name.is_empty() {
            outcome.notes.push(IndexNote {
                file_path: sig.file_path.clone(),
                message: "signature with empty symbol name".to_string(),
            });
            continue;
        }
        if sig.byte_range.end < sig.byte_range.start {
            outcome.notes.push(IndexNote {
                file_path: sig.file_path.clone(),
                message: format!(
                    "inverted byte range on `{}`: [{}, {})",
                    sig.symbol_name, sig.byte_range.start, sig.byte_range.end
                ),
            });
            continue;
        }

        let name = sig
            .qualified_name
            .clone()
            .unwrap_or_else(|| sig.symbol_name.clone());
        let key = (sig.file_path.clone(), name, sig.content_hash);
        let already_present = graph.nodes_in_file(&sig.file_path).iter().any(|id| {
            graph
                .get_node(*id)
                .is_some_and(|n| n.content_hash == sig.content_hash && n.display_name() == key.1)
        });
        if already_present || !seen.insert(key) {
            outcome.duplicates += 1;
            continue;
        }

        let id = graph.add_node(SymbolNode {
            id: NodeId::default(),
            project_id: sig.project_id.clone(),
            file_path: sig.file_path.clone(),
            symbol_name: sig.symbol_name.clone(),
            qualified_name: sig.qualified_name.clone(),
            kind: sig.kind,
            signature: sig.signature.clone(),
            byte_range: sig.byte_range,
            complexity: sig.complexity,
            content_hash: sig.content_hash,
            embedding: None,
            created_at: 0,
            updated_at: 0,
        });
        lifted.push((id, index));
        outcome.node_ids.push(id);
        outcome.source_indices.push(index);
    }

    synthesize_data_edges(graph, signatures, &lifted)?;
    synthesize_inheritance_edges(graph, signatures, &lifted, options)?;

    tracing::debug!(
        lifted = outcome.node_ids.len(),
        duplicates = outcome.duplicates,
        notes = outcome.notes.len(),
        "signature extraction finished"
    );
    Ok(outcome)
}

/// Links callables that share at least one parameter type, earlier
/// signature to later, recording the shared type name.
fn synthesize_data_edges(
    graph: &mut DependenceGraph,
    signatures: &[SignatureInfo],
    lifted: &[(NodeId, usize)],
) -> Result<(), GraphError> {
    let callables: Vec<(NodeId, &SignatureInfo)> = lifted
        .iter()
        .map(|&(id, index)| (id, &signatures[index]))
        .filter(|(_, sig)| matches!(sig.kind, SymbolKind::Function | SymbolKind::Method))
        .filter(|(_, sig)| !sig.parameter_types.is_empty())
        .collect();

    let mut flows = Vec::new();
    for (i, (from, from_sig)) in callables.iter().enumerate() {
        let from_types: HashSet<&String> = from_sig.parameter_types.iter().collect();
        for (to, to_sig) in callables.iter().skip(i + 1) {
            if let Some(shared) = to_sig
                .parameter_types
                .iter()
                .find(|t| from_types.contains(t))
            {
                flows.push((*from, *to, shared.clone()));
            }
        }
    }
    graph.add_data_flow_edges(&flows)
}

/// Clusters methods by the class prefix of their qualified names, links
/// each method to its class node, and links classes whose method-name
/// overlap clears the configured threshold.
fn synthesize_inheritance_edges(
    graph: &mut DependenceGraph,
    signatures: &[SignatureInfo],
    lifted: &[(NodeId, usize)],
    options: &ExtractorOptions,
) -> Result<(), GraphError> {
    // class name -> class node, in lift order
    let mut classes: BTreeMap<&str, NodeId> = BTreeMap::new();
    for &(id, index) in lifted {
        let sig = &signatures[index];
        if sig.kind == SymbolKind::Class {
            classes.entry(sig.symbol_name.as_str()).or_insert(id);
        }
    }

    // class name -> member methods
    let mut clusters: BTreeMap<&str, Vec<(NodeId, &str)>> = BTreeMap::new();
    for &(id, index) in lifted {
        let sig = &signatures[index];
        if sig.kind != SymbolKind::Method {
            continue;
        }
        let Some(qualified) = sig.qualified_name.as_deref() else {
            continue;
        };
        let Some((class_name, method_name)) = qualified.rsplit_once("::") else {
            continue;
        };
        clusters
            .entry(class_name)
            .or_default()
            .push((id, method_name));
    }

    let mut membership = Vec::new();
    for (class_name, members) in &clusters {
        if let Some(&class_id) = classes.get(class_name) {
            for &(method_id, _) in members {
                membership.push((method_id, class_id));
            }
        }
    }
    graph.add_inheritance_edges(&membership)?;

    // Cross-class: overlap of method names relative to the smaller class.
    let named: Vec<(&str, HashSet<&str>)> = clusters
        .iter()
        .map(|(class, members)| (*class, members.iter().map(|&(_, m)| m).collect()))
        .collect();
    for (i, (class_a, methods_a)) in named.iter().enumerate() {
        for (class_b, methods_b) in named.iter().skip(i + 1) {
            let smaller = methods_a.len().min(methods_b.len());
            if smaller == 0 {
                continue;
            }
            let shared = methods_a.intersection(methods_b).count();
            let overlap = shared as f32 / smaller as f32;
            if overlap < options.method_overlap_threshold {
                continue;
            }
            if let (Some(&a), Some(&b)) = (classes.get(class_a), classes.get(class_b)) {
                let metadata = EdgeMetadata {
                    extra: [(
                        "method_overlap".to_string(),
                        MetaValue::Float(overlap as f64),
                    )]
                    .into_iter()
                    .collect(),
                    ..EdgeMetadata::default()
                };
                graph.add_edge(b, a, DependKind::Inheritance, metadata)?;
            }
        }
    }
    Ok(())
}
