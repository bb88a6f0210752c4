//! Unit tests for similarity and the FIFO cache

use taproot_core::NodeId;

use crate::cache::EmbeddingCache;
use crate::embedding::*;
use crate::error::EmbedError;

fn emb(id: u64, vector: Vec<f32>) -> NodeEmbedding {
    NodeEmbedding::new(NodeId(id), vector, "test-model")
}

#[test]
fn similarity_of_vector_with_itself_is_one() {
    let v = vec![0.3, -1.2, 4.0];
    assert!((similarity(&v, &v) - 1.0).abs() < 1e-6);
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    let a = vec![1.0, 2.0, 3.0];
    let b = vec![-2.0, 0.5, 1.0];
    let ab = similarity(&a, &b);
    let ba = similarity(&b, &a);
    assert!((ab - ba).abs() < 1e-6);
    assert!(ab.abs() <= 1.0 + 1e-6);
}

#[test]
fn similarity_edge_cases_score_zero() {
    // zero vector
    assert_eq!(similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 0.0);
    // orthogonal vectors
    assert_eq!(similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), 0.0);
    // dimension mismatch
    assert_eq!(similarity(&[1.0; 768], &[1.0; 512]), 0.0);
    // empty vectors
    assert_eq!(similarity(&[], &[]), 0.0);
}

#[test]
fn scaling_does_not_change_similarity() {
    let v = vec![0.5, -2.0, 3.5];
    let doubled: Vec<f32> = v.iter().map(|x| x * 2.0).collect();
    assert!((similarity(&v, &doubled) - 1.0).abs() < 1e-6);
}

#[test]
fn checked_similarity_surfaces_mismatch() {
    let err = similarity_checked(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(
        err,
        EmbedError::DimensionMismatch {
            expected: 2,
            got: 3
        }
    ));
    assert!(similarity_checked(&[1.0, 0.0], &[1.0, 0.0]).is_ok());
}

#[test]
fn blob_round_trip_is_bitwise() {
    let v = vec![0.1f32, -2.5, f32::MIN_POSITIVE, 1e30];
    let blob = vector_to_blob(&v);
    assert_eq!(blob.len(), 16);
    assert_eq!(blob_to_vector(&blob), Some(v));
    // truncated blob decodes to no embedding
    assert_eq!(blob_to_vector(&blob[..7]), None);
}

#[test]
fn cache_evicts_in_insertion_order() {
    let cache = EmbeddingCache::new(2);
    assert_eq!(cache.insert(emb(1, vec![1.0])), None);
    assert_eq!(cache.insert(emb(2, vec![1.0])), None);
    // third insert evicts the oldest entry
    assert_eq!(cache.insert(emb(3, vec![1.0])), Some(NodeId(1)));

    assert!(cache.get(NodeId(1)).is_none());
    assert!(cache.get(NodeId(2)).is_some());
    assert!(cache.get(NodeId(3)).is_some());
    assert_eq!(cache.len(), 2);
}

#[test]
fn reads_do_not_promote() {
    let cache = EmbeddingCache::new(2);
    cache.insert(emb(1, vec![1.0]));
    cache.insert(emb(2, vec![1.0]));
    // touching 1 must not save it from FIFO eviction
    let _ = cache.get(NodeId(1));
    assert_eq!(cache.insert(emb(3, vec![1.0])), Some(NodeId(1)));
}

#[test]
fn reinsert_replaces_value_and_keeps_position() {
    let cache = EmbeddingCache::new(2);
    cache.insert(emb(1, vec![1.0]));
    cache.insert(emb(2, vec![1.0]));
    assert_eq!(cache.insert(emb(1, vec![9.0])), None);
    assert_eq!(cache.get(NodeId(1)).unwrap().vector, vec![9.0]);
    // 1 is still the oldest entry
    assert_eq!(cache.insert(emb(3, vec![1.0])), Some(NodeId(1)));
}

#[test]
fn find_similar_ranks_by_score_then_id() {
    let cache = EmbeddingCache::new(16);
    cache.insert(emb(1, vec![1.0, 0.0]));
    cache.insert(emb(2, vec![0.0, 1.0]));
    cache.insert(emb(3, vec![1.0, 0.0]));
    cache.insert(emb(4, vec![1.0, 1.0]));

    let hits = cache.find_similar(&[1.0, 0.0], 3);
    // 1 and 3 tie at 1.0; the smaller id ranks first
    assert_eq!(hits[0].0, NodeId(1));
    assert_eq!(hits[1].0, NodeId(3));
    assert_eq!(hits[2].0, NodeId(4));
}

#[test]
fn find_similar_scores_mismatched_dimensions_zero() {
    let cache = EmbeddingCache::new(16);
    cache.insert(emb(1, vec![1.0, 0.0, 0.0]));
    cache.insert(emb(2, vec![1.0, 0.0]));

    let hits = cache.find_similar(&[1.0, 0.0], 2);
    assert_eq!(hits[0], (NodeId(2), 1.0));
    assert_eq!(hits[1].1, 0.0);
}

#[test]
fn remove_drops_entry_and_order_slot() {
    let cache = EmbeddingCache::new(2);
    cache.insert(emb(1, vec![1.0]));
    cache.insert(emb(2, vec![1.0]));
    assert!(cache.remove(NodeId(1)).is_some());
    assert_eq!(cache.len(), 1);
    // slot freed: no eviction needed for the next insert
    assert_eq!(cache.insert(emb(3, vec![1.0])), None);
}
