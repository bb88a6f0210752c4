//! Unit tests for signature lifting and the edge heuristics

use taproot_core::{
    ByteRange, DependKind, DependenceGraph, MetaValue, NeighborDirection, SymbolKind,
};

use crate::extractor::{ExtractorOptions, extract_into};
use crate::hash::content_hash;
use crate::signature::SignatureInfo;

fn sig(name: &str, kind: SymbolKind, params: &[&str]) -> SignatureInfo {
    SignatureInfo {
        project_id: "proj".into(),
        file_path: "src/lib.rs".into(),
        symbol_name: name.rsplit("::").next().unwrap().to_string(),
        qualified_name: name.contains("::").then(|| name.to_string()),
        kind,
        signature: format!("fn {name}()"),
        byte_range: ByteRange::new(0, 80),
        complexity: 1,
        content_hash: content_hash(name),
        parameter_types: params.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn lifts_signatures_into_nodes() {
    let mut graph = DependenceGraph::new();
    let outcome = extract_into(
        &mut graph,
        &[
            sig("alpha", SymbolKind::Function, &[]),
            sig("beta", SymbolKind::Function, &[]),
        ],
        &ExtractorOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.node_ids.len(), 2);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.find_by_symbol("alpha").len(), 1);
    assert!(outcome.notes.is_empty());
}

#[test]
fn reingest_with_unchanged_hash_is_deduplicated() {
    let mut graph = DependenceGraph::new();
    let batch = [sig("alpha", SymbolKind::Function, &[])];
    extract_into(&mut graph, &batch, &ExtractorOptions::default()).unwrap();
    let outcome = extract_into(&mut graph, &batch, &ExtractorOptions::default()).unwrap();

    assert_eq!(outcome.duplicates, 1);
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn changed_hash_produces_a_second_node() {
    let mut graph = DependenceGraph::new();
    let mut v1 = sig("alpha", SymbolKind::Function, &[]);
    extract_into(
        &mut graph,
        std::slice::from_ref(&v1),
        &ExtractorOptions::default(),
    )
    .unwrap();

    v1.content_hash = content_hash("alpha-v2");
    let outcome = extract_into(&mut graph, &[v1], &ExtractorOptions::default()).unwrap();

    // the graph preserves both; the store resolves identity later
    assert_eq!(outcome.duplicates, 0);
    assert_eq!(graph.node_count(), 2);
}

#[test]
fn bad_signatures_are_noted_not_fatal() {
    let mut graph = DependenceGraph::new();
    let mut inverted = sig("weird", SymbolKind::Function, &[]);
    inverted.byte_range = ByteRange::new(50, 10);
    let mut unnamed = sig("x", SymbolKind::Function, &[]);
    unnamed.symbol_name.clear();

    let outcome = extract_into(
        &mut graph,
        &[
            inverted,
            unnamed,
            sig("fine", SymbolKind::Function, &[]),
        ],
        &ExtractorOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.notes.len(), 2);
    assert_eq!(outcome.node_ids.len(), 1);
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn shared_parameter_types_create_data_edges() {
    let mut graph = DependenceGraph::new();
    let outcome = extract_into(
        &mut graph,
        &[
            sig("reader", SymbolKind::Function, &["Config", "Path"]),
            sig("writer", SymbolKind::Function, &["Config"]),
            sig("loner", SymbolKind::Function, &["Widget"]),
        ],
        &ExtractorOptions::default(),
    )
    .unwrap();

    let reader = outcome.node_ids[0];
    let writer = outcome.node_ids[1];
    let loner = outcome.node_ids[2];

    let edge = graph
        .get_edge(reader, writer, DependKind::DataDependency)
        .unwrap();
    assert_eq!(edge.metadata.variable_name.as_deref(), Some("Config"));
    assert!(graph.neighbors(loner, NeighborDirection::Both).is_empty());
}

#[test]
fn no_call_edges_from_signatures_alone() {
    let mut graph = DependenceGraph::new();
    extract_into(
        &mut graph,
        &[
            sig("caller", SymbolKind::Function, &["A"]),
            sig("callee", SymbolKind::Function, &["A"]),
        ],
        &ExtractorOptions::default(),
    )
    .unwrap();

    assert!(
        graph
            .all_edges()
            .all(|(_, _, edge)| edge.kind != DependKind::Call)
    );
}

#[test]
fn methods_link_to_their_class_node() {
    let mut graph = DependenceGraph::new();
    let outcome = extract_into(
        &mut graph,
        &[
            sig("Parser", SymbolKind::Class, &[]),
            sig("Parser::parse", SymbolKind::Method, &[]),
            sig("Parser::reset", SymbolKind::Method, &[]),
        ],
        &ExtractorOptions::default(),
    )
    .unwrap();

    let class = outcome.node_ids[0];
    let parse = outcome.node_ids[1];
    assert!(graph.get_edge(parse, class, DependKind::Inheritance).is_some());
    assert_eq!(graph.neighbors(class, NeighborDirection::In).len(), 2);
}

#[test]
fn method_overlap_links_classes_above_threshold() {
    let mut graph = DependenceGraph::new();
    let outcome = extract_into(
        &mut graph,
        &[
            sig("Reader", SymbolKind::Class, &[]),
            sig("Writer", SymbolKind::Class, &[]),
            sig("Reader::open", SymbolKind::Method, &[]),
            sig("Reader::close", SymbolKind::Method, &[]),
            sig("Writer::open", SymbolKind::Method, &[]),
            sig("Writer::close", SymbolKind::Method, &[]),
        ],
        &ExtractorOptions::default(),
    )
    .unwrap();

    let reader = outcome.node_ids[0];
    let writer = outcome.node_ids[1];
    let edge = graph
        .get_edge(writer, reader, DependKind::Inheritance)
        .unwrap();
    assert_eq!(
        edge.metadata.extra["method_overlap"],
        MetaValue::Float(1.0)
    );
}

#[test]
fn low_overlap_does_not_link_classes() {
    let mut graph = DependenceGraph::new();
    let outcome = extract_into(
        &mut graph,
        &[
            sig("Reader", SymbolKind::Class, &[]),
            sig("Writer", SymbolKind::Class, &[]),
            sig("Reader::open", SymbolKind::Method, &[]),
            sig("Reader::seek", SymbolKind::Method, &[]),
            sig("Writer::open", SymbolKind::Method, &[]),
            sig("Writer::flush", SymbolKind::Method, &[]),
            sig("Writer::sync", SymbolKind::Method, &[]),
        ],
        &ExtractorOptions {
            method_overlap_threshold: 0.8,
        },
    )
    .unwrap();

    let reader = outcome.node_ids[0];
    let writer = outcome.node_ids[1];
    assert!(graph.get_edge(writer, reader, DependKind::Inheritance).is_none());
}
