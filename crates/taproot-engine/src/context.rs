//! `CoreContext`: the caller-facing surface of the intelligence core
//!
//! Owns the per-project graphs with their embedding caches, the store
//! pool, and the configuration. There is no global state; everything
//! hangs off this value.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tokio::sync::RwLock;

use taproot_core::{
    CancelToken, DependenceGraph, ExpandedContext, NodeId, expand,
};
use taproot_embed::{Embedder, EmbeddingCache, NodeEmbedding};
use taproot_indexer::{ExtractorOptions, IndexNote, SignatureInfo, extract_into};
use taproot_store::{ComplexityHistogram, Hotspot, StorePool, analytics};

use crate::config::CoreConfig;
use crate::error::EngineError;
use crate::snapshot;

/// Seeds taken from the top semantic hits when `analyze` runs a query.
const ANALYZE_SEEDS: usize = 5;

/// Model id recorded for embeddings supplied by the caller rather than
/// produced through an [`taproot_embed::Embedder`].
const EXTERNAL_MODEL: &str = "external";

/// Summary of one `index_project` run.
#[derive(Debug)]
pub struct IndexReport {
    /// Nodes inserted, in input order.
    pub node_ids: Vec<NodeId>,
    /// Signatures skipped because an identical node was already present.
    pub duplicates: usize,
    /// Per-file extraction problems; the pipeline continued past them.
    pub notes: Vec<IndexNote>,
}

/// Project-level counters and distributions.
#[derive(Debug)]
pub struct Diagnostics {
    pub node_count: u64,
    pub edge_count: u64,
    pub node_types: BTreeMap<String, u64>,
    pub edge_types: BTreeMap<String, u64>,
    pub complexity: ComplexityHistogram,
    pub hotspots: Vec<Hotspot>,
}

/// One project's in-memory state: the graph and its embedding cache.
///
/// Node ids are stable only within one graph instance, so every project
/// carries its own cache; a shared one would let equal ids from different
/// projects overwrite each other's vectors.
struct ProjectState {
    graph: DependenceGraph,
    embeddings: EmbeddingCache,
}

impl ProjectState {
    fn new(cache_size: usize) -> Self {
        ProjectState {
            graph: DependenceGraph::new(),
            embeddings: EmbeddingCache::new(cache_size),
        }
    }
}

/// The intelligence core. Graph mutations are serialized behind the write
/// lock; traversal and similarity scans are pure reads.
pub struct CoreContext {
    config: CoreConfig,
    pool: StorePool,
    projects: RwLock<HashMap<String, ProjectState>>,
    extractor: ExtractorOptions,
}

impl CoreContext {
    /// Opens the core over the database at `db_path`.
    pub fn open(db_path: &str, config: CoreConfig) -> Result<Self, EngineError> {
        let pool = StorePool::open(db_path, config.store.clone(), config.store_readers)?;
        Ok(CoreContext {
            config,
            pool,
            projects: RwLock::new(HashMap::new()),
            extractor: ExtractorOptions::default(),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Ingests parsed signatures into the project graph, attaches any
    /// caller-supplied embeddings (aligned with `signatures` by index),
    /// and persists the result. Per-file extraction problems are returned
    /// in the report; they never abort the batch.
    pub async fn index_project(
        &self,
        project_id: &str,
        signatures: &[SignatureInfo],
        embeddings: Option<&[Vec<f32>]>,
        cancel: Option<&CancelToken>,
    ) -> Result<IndexReport, EngineError> {
        if let Some(vectors) = embeddings {
            if vectors.len() != signatures.len() {
                return Err(EngineError::MismatchedEmbeddings {
                    expected: signatures.len(),
                    got: vectors.len(),
                });
            }
        }

        let mut projects = self.projects.write().await;
        let state = projects
            .entry(project_id.to_string())
            .or_insert_with(|| ProjectState::new(self.config.embedding.cache_size));

        let outcome = extract_into(&mut state.graph, signatures, &self.extractor)?;
        if let Some(vectors) = embeddings {
            for (&node_id, &source) in outcome.node_ids.iter().zip(&outcome.source_indices) {
                let vector = &vectors[source];
                if vector.len() != self.config.embedding.dimension {
                    tracing::warn!(
                        %node_id,
                        got = vector.len(),
                        expected = self.config.embedding.dimension,
                        "embedding dimension differs from configured default"
                    );
                }
                if let Some(node) = state.graph.get_node_mut(node_id) {
                    node.embedding = Some(vector.clone());
                }
                state
                    .embeddings
                    .insert(NodeEmbedding::new(node_id, vector.clone(), EXTERNAL_MODEL));
            }
        }

        if let Err(err) = self.pool.writer().save_graph(project_id, &state.graph, cancel) {
            // Keep memory consistent with the store: undo this run's nodes
            // (their ids are retired, not reused) and their cache entries.
            for &node_id in &outcome.node_ids {
                state.graph.remove_node(node_id);
                state.embeddings.remove(node_id);
            }
            return Err(err.into());
        }

        tracing::info!(
            project_id,
            lifted = outcome.node_ids.len(),
            duplicates = outcome.duplicates,
            notes = outcome.notes.len(),
            "project indexed"
        );
        Ok(IndexReport {
            node_ids: outcome.node_ids,
            duplicates: outcome.duplicates,
            notes: outcome.notes,
        })
    }

    /// Ingests signatures, generating an embedding for each signature text
    /// through the embedder boundary. Backend failures surface as
    /// [`taproot_embed::EmbedError::Unavailable`] before anything mutates.
    pub async fn index_project_with_embedder(
        &self,
        project_id: &str,
        signatures: &[SignatureInfo],
        embedder: &dyn Embedder,
        cancel: Option<&CancelToken>,
    ) -> Result<IndexReport, EngineError> {
        let texts: Vec<String> = signatures.iter().map(|s| s.signature.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        self.index_project(project_id, signatures, Some(&vectors), cancel)
            .await
    }

    /// Loads a project graph from durable storage into memory, preferring
    /// the sidecar snapshot under `sidecar_root` when its checksum still
    /// matches the store. Hydrates the project's embedding cache from node
    /// embeddings.
    pub async fn load_project(
        &self,
        project_id: &str,
        sidecar_root: Option<&Path>,
        cancel: Option<&CancelToken>,
    ) -> Result<(), EngineError> {
        let graph = {
            let writer = self.pool.writer();
            let from_sidecar = match sidecar_root {
                Some(root) => {
                    let checksum = writer.nodes_checksum(project_id)?;
                    snapshot::load_snapshot(root, &checksum)?
                }
                None => None,
            };
            match from_sidecar {
                Some(graph) => graph,
                None => writer.load_graph(project_id, cancel)?,
            }
        };

        let mut state = ProjectState::new(self.config.embedding.cache_size);
        state.graph = graph;
        for node in state.graph.all_nodes() {
            if let Some(vector) = &node.embedding {
                state
                    .embeddings
                    .insert(NodeEmbedding::new(node.id, vector.clone(), EXTERNAL_MODEL));
            }
        }

        self.projects
            .write()
            .await
            .insert(project_id.to_string(), state);
        Ok(())
    }

    /// Writes the project's sidecar snapshot for the next cold start.
    pub async fn save_sidecar(
        &self,
        project_id: &str,
        root: &Path,
    ) -> Result<(), EngineError> {
        let projects = self.projects.read().await;
        let state = projects
            .get(project_id)
            .ok_or_else(|| EngineError::ProjectNotLoaded(project_id.to_string()))?;
        let checksum = self.pool.writer().nodes_checksum(project_id)?;
        snapshot::save_snapshot(&state.graph, &checksum, root)
    }

    /// Top-`k` semantic hits for `query` among the project's cached
    /// embeddings, ranked by descending cosine similarity.
    pub async fn search(
        &self,
        project_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(NodeId, f32)>, EngineError> {
        let projects = self.projects.read().await;
        let state = projects
            .get(project_id)
            .ok_or_else(|| EngineError::ProjectNotLoaded(project_id.to_string()))?;

        let mut hits = state
            .embeddings
            .find_similar(query, state.embeddings.len());
        hits.retain(|(id, _)| state.graph.get_node(*id).is_some());
        hits.truncate(k);
        Ok(hits)
    }

    /// Expands a token-budgeted context around the top semantic hits for
    /// `query`. The budget defaults to the configured value.
    pub async fn analyze(
        &self,
        project_id: &str,
        query: &[f32],
        token_budget: Option<u64>,
        cancel: Option<&CancelToken>,
    ) -> Result<ExpandedContext, EngineError> {
        let projects = self.projects.read().await;
        let state = projects
            .get(project_id)
            .ok_or_else(|| EngineError::ProjectNotLoaded(project_id.to_string()))?;

        let mut hits = state
            .embeddings
            .find_similar(query, state.embeddings.len());
        hits.retain(|(id, _)| state.graph.get_node(*id).is_some());

        // Negative cosine scores carry no gravity.
        let similarity: HashMap<NodeId, f32> =
            hits.iter().map(|&(id, s)| (id, s.max(0.0))).collect();
        let seeds: Vec<NodeId> = hits.iter().take(ANALYZE_SEEDS).map(|&(id, _)| id).collect();

        let budget = token_budget.unwrap_or(self.config.token_budget_default);
        let expanded = expand(
            &state.graph,
            &seeds,
            &similarity,
            &self.config.traversal,
            budget,
            cancel,
        )?;
        Ok(expanded)
    }

    /// Expands a token-budgeted context around one known node. With no
    /// query embedding in play, relevance is driven by complexity and
    /// distance alone.
    pub async fn context(
        &self,
        project_id: &str,
        node_id: NodeId,
        token_budget: Option<u64>,
        cancel: Option<&CancelToken>,
    ) -> Result<ExpandedContext, EngineError> {
        let projects = self.projects.read().await;
        let state = projects
            .get(project_id)
            .ok_or_else(|| EngineError::ProjectNotLoaded(project_id.to_string()))?;

        let budget = token_budget.unwrap_or(self.config.token_budget_default);
        let expanded = expand(
            &state.graph,
            &[node_id],
            &HashMap::new(),
            &self.config.traversal,
            budget,
            cancel,
        )?;
        Ok(expanded)
    }

    /// Project-level counters, distributions, and hotspots, served from a
    /// reader connection.
    pub async fn diagnostics(&self, project_id: &str) -> Result<Diagnostics, EngineError> {
        let reader = self.pool.reader();
        let (node_count, edge_count) = analytics::project_counts(&reader, project_id)?;
        Ok(Diagnostics {
            node_count,
            edge_count,
            node_types: analytics::node_type_counts(&reader, project_id)?,
            edge_types: analytics::edge_type_counts(&reader, project_id)?,
            complexity: analytics::complexity_histogram(&reader, project_id)?,
            hotspots: analytics::hotspots(&reader, project_id, 2, 10)?,
        })
    }

    /// Read access to a loaded project graph, for impact analysis and
    /// other pure queries.
    pub async fn with_graph<R>(
        &self,
        project_id: &str,
        f: impl FnOnce(&DependenceGraph) -> R,
    ) -> Result<R, EngineError> {
        let projects = self.projects.read().await;
        let state = projects
            .get(project_id)
            .ok_or_else(|| EngineError::ProjectNotLoaded(project_id.to_string()))?;
        Ok(f(&state.graph))
    }
}
