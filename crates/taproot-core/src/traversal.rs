//! Gravity-based context expansion under a token budget
//!
//! Candidates are ranked by a relevance score that grows with semantic
//! similarity and structural complexity and decays with graph distance
//! from the seeds. Expansion admits nodes greedily until the estimated
//! token cost of the admitted set would exceed the budget.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::cancel::CancelToken;
use crate::error::GraphError;
use crate::graph::DependenceGraph;
use crate::model::{NeighborDirection, NodeId};

/// Tunable weights for the relevance formula
/// `(s * weight_semantic + c * weight_complexity) / max(d, 1) ^ distance_decay`.
#[derive(Debug, Clone, Copy)]
pub struct GravityWeights {
    pub weight_semantic: f32,
    pub weight_complexity: f32,
    pub distance_decay: f32,
}

impl Default for GravityWeights {
    fn default() -> Self {
        GravityWeights {
            weight_semantic: 1.0,
            weight_complexity: 0.1,
            distance_decay: 1.0,
        }
    }
}

/// Why a node shows up in the rejected set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Admitting the node would have pushed the total cost over budget.
    /// The node was not admitted.
    Budget,
    /// A seed with no incident edges: it stays admitted but contributed
    /// nothing to expand through.
    NoNeighbors,
}

/// The result of one expansion run.
#[derive(Debug, Clone)]
pub struct ExpandedContext {
    /// Admitted nodes in admission order (seeds first).
    pub admitted: Vec<NodeId>,
    /// Estimated token cost of the admitted set.
    pub spent_tokens: u64,
    /// Budget left over after admission stopped.
    pub residual_budget: u64,
    pub rejected: Vec<(NodeId, RejectReason)>,
    /// True when at least one candidate was turned away for budget.
    /// Informational, not an error.
    pub budget_exceeded: bool,
}

struct Candidate {
    relevance: f32,
    id: NodeId,
    distance: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Max-heap on relevance; equal relevance pops the smaller node id first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.relevance
            .total_cmp(&other.relevance)
            .then_with(|| other.id.cmp(&self.id))
    }
}

fn relevance(similarity: f32, complexity: u32, distance: u32, weights: &GravityWeights) -> f32 {
    let mass =
        similarity * weights.weight_semantic + complexity as f32 * weights.weight_complexity;
    // max(d, 1) keeps the denominator >= 1, so the division cannot produce
    // NaN or inflate the score for d = 0.
    let denom = (distance.max(1) as f32).powf(weights.distance_decay);
    mass / denom
}

/// Expands a relevance-ranked context around `seeds`, admitting nodes until
/// the next admission would exceed `token_budget`.
///
/// `similarity` carries precomputed per-node semantic scores in `[0, 1]`
/// against the query embedding; missing entries score 0. Seeds enter at
/// distance zero and are always admitted, with their cost counted.
/// Expansion walks both edge directions. Candidates that would overflow
/// the budget are recorded and skipped while the rest of the queue keeps
/// draining, so a cheaper candidate behind an expensive one still gets in.
pub fn expand(
    graph: &DependenceGraph,
    seeds: &[NodeId],
    similarity: &HashMap<NodeId, f32>,
    weights: &GravityWeights,
    token_budget: u64,
    cancel: Option<&CancelToken>,
) -> Result<ExpandedContext, GraphError> {
    let score = |id: NodeId| similarity.get(&id).copied().unwrap_or(0.0);
    let cost = |id: NodeId| {
        graph
            .get_node(id)
            .map(|n| n.byte_range.token_cost())
            .unwrap_or(0)
    };

    let mut admitted = Vec::new();
    let mut rejected = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut spent: u64 = 0;
    let mut budget_exceeded = false;

    for &seed in seeds {
        if graph.get_node(seed).is_none() {
            return Err(GraphError::NodeNotFound(seed));
        }
        if !visited.insert(seed) {
            continue;
        }
        spent += cost(seed);
        admitted.push(seed);
    }

    for &seed in &admitted.clone() {
        let neighbors = graph.neighbors(seed, NeighborDirection::Both);
        if neighbors.is_empty() {
            rejected.push((seed, RejectReason::NoNeighbors));
            continue;
        }
        for neighbor in neighbors {
            if visited.insert(neighbor) {
                let node = graph.get_node(neighbor).expect("neighbor of live node");
                queue.push(Candidate {
                    relevance: relevance(score(neighbor), node.complexity, 1, weights),
                    id: neighbor,
                    distance: 1,
                });
            }
        }
    }

    while let Some(candidate) = queue.pop() {
        if let Some(token) = cancel {
            token.checkpoint()?;
        }
        let node_cost = cost(candidate.id);
        if spent + node_cost > token_budget {
            rejected.push((candidate.id, RejectReason::Budget));
            budget_exceeded = true;
            continue;
        }
        spent += node_cost;
        admitted.push(candidate.id);

        let next_distance = candidate.distance + 1;
        for neighbor in graph.neighbors(candidate.id, NeighborDirection::Both) {
            if visited.insert(neighbor) {
                let node = graph.get_node(neighbor).expect("neighbor of live node");
                queue.push(Candidate {
                    relevance: relevance(score(neighbor), node.complexity, next_distance, weights),
                    id: neighbor,
                    distance: next_distance,
                });
            }
        }
    }

    tracing::debug!(
        admitted = admitted.len(),
        rejected = rejected.len(),
        spent_tokens = spent,
        budget_exceeded,
        "context expansion finished"
    );

    Ok(ExpandedContext {
        residual_budget: token_budget.saturating_sub(spent),
        spent_tokens: spent,
        admitted,
        rejected,
        budget_exceeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ByteRange, ContentHash, EdgeMetadata, DependKind, SymbolKind, SymbolNode};

    fn node(name: &str, byte_len: u64, complexity: u32) -> SymbolNode {
        SymbolNode {
            id: NodeId::default(),
            project_id: "p".into(),
            file_path: "lib.rs".into(),
            symbol_name: name.into(),
            qualified_name: None,
            kind: SymbolKind::Function,
            signature: format!("fn {name}()"),
            byte_range: ByteRange::new(0, byte_len),
            complexity,
            content_hash: ContentHash::default(),
            embedding: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Seed of cost 10 plus five cost-500 neighbors against a budget of
    /// 1200: the two most relevant neighbors fit, the rest are turned away.
    #[test]
    fn budget_cuts_off_expansion() {
        let mut graph = DependenceGraph::new();
        let seed = graph.add_node(node("seed", 40, 0));
        let mut similarity = HashMap::new();
        similarity.insert(seed, 1.0);

        let mut neighbors = Vec::new();
        for (name, sim) in [("n1", 5.0), ("n2", 4.0), ("n3", 3.0), ("n4", 2.0), ("n5", 1.0)] {
            let id = graph.add_node(node(name, 2000, 0));
            graph
                .add_edge(seed, id, DependKind::Call, EdgeMetadata::default())
                .unwrap();
            similarity.insert(id, sim);
            neighbors.push(id);
        }

        let result = expand(
            &graph,
            &[seed],
            &similarity,
            &GravityWeights::default(),
            1200,
            None,
        )
        .unwrap();

        assert_eq!(result.admitted, vec![seed, neighbors[0], neighbors[1]]);
        assert_eq!(result.spent_tokens, 1010);
        assert_eq!(result.residual_budget, 190);
        assert!(result.budget_exceeded);
        assert!(
            result
                .rejected
                .contains(&(neighbors[2], RejectReason::Budget))
        );
    }

    #[test]
    fn cheaper_candidate_behind_expensive_one_still_admitted() {
        let mut graph = DependenceGraph::new();
        let seed = graph.add_node(node("seed", 0, 0));
        let big = graph.add_node(node("big", 4000, 0));
        let small = graph.add_node(node("small", 40, 0));
        graph
            .add_edge(seed, big, DependKind::Call, EdgeMetadata::default())
            .unwrap();
        graph
            .add_edge(seed, small, DependKind::Call, EdgeMetadata::default())
            .unwrap();

        let mut similarity = HashMap::new();
        similarity.insert(big, 1.0);
        similarity.insert(small, 0.1);

        let result = expand(
            &graph,
            &[seed],
            &similarity,
            &GravityWeights::default(),
            100,
            None,
        )
        .unwrap();

        assert!(result.admitted.contains(&small));
        assert!(result.rejected.contains(&(big, RejectReason::Budget)));
        assert!(result.budget_exceeded);
    }

    #[test]
    fn isolated_seed_reports_no_neighbors() {
        let mut graph = DependenceGraph::new();
        let seed = graph.add_node(node("alone", 8, 0));
        let result = expand(
            &graph,
            &[seed],
            &HashMap::new(),
            &GravityWeights::default(),
            100,
            None,
        )
        .unwrap();

        assert_eq!(result.admitted, vec![seed]);
        assert_eq!(result.rejected, vec![(seed, RejectReason::NoNeighbors)]);
        assert!(!result.budget_exceeded);
    }

    #[test]
    fn relevance_ties_break_on_ascending_id() {
        let mut graph = DependenceGraph::new();
        let seed = graph.add_node(node("seed", 0, 0));
        let a = graph.add_node(node("a", 4, 1));
        let b = graph.add_node(node("b", 4, 1));
        graph
            .add_edge(seed, b, DependKind::Call, EdgeMetadata::default())
            .unwrap();
        graph
            .add_edge(seed, a, DependKind::Call, EdgeMetadata::default())
            .unwrap();

        let result = expand(
            &graph,
            &[seed],
            &HashMap::new(),
            &GravityWeights::default(),
            100,
            None,
        )
        .unwrap();

        assert_eq!(result.admitted, vec![seed, a, b]);
    }

    #[test]
    fn cancellation_is_a_clean_error() {
        let mut graph = DependenceGraph::new();
        let seed = graph.add_node(node("seed", 0, 0));
        let other = graph.add_node(node("other", 4, 0));
        graph
            .add_edge(seed, other, DependKind::Call, EdgeMetadata::default())
            .unwrap();

        let token = CancelToken::new();
        token.cancel();
        let err = expand(
            &graph,
            &[seed],
            &HashMap::new(),
            &GravityWeights::default(),
            100,
            Some(&token),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::Cancelled));
    }

    #[test]
    fn missing_seed_is_an_error() {
        let graph = DependenceGraph::new();
        let err = expand(
            &graph,
            &[NodeId(7)],
            &HashMap::new(),
            &GravityWeights::default(),
            100,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(NodeId(7))));
    }
}
