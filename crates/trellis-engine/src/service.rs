//! Relationship recompute service.
//!
//! Glues the three collaborators of a recomputation together: the tag list
//! read from the store (a read failure is fatal), one of the two
//! calculators, and the edge upserts. Writes are insert-or-replace keyed by
//! the canonical pair, so a recomputation fully supersedes prior edges for
//! the recomputed pairs; a write failure aborts the invocation but edges
//! already written remain valid.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use trellis_core::{
    EmbeddingBackend, RecomputeSummary, RelationshipEdge, RelationshipRepository, Result,
    SimilarityJudge, TagRepository,
};

use crate::exact::{ExactPathConfig, ExactRelationshipCalculator};
use crate::fast::{FastPathConfig, FastRelationshipCalculator};

/// Recomputes and persists tag relationship edges on either path.
pub struct RelationshipService {
    tags: Arc<dyn TagRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    exact: ExactRelationshipCalculator,
    fast: FastRelationshipCalculator,
}

impl RelationshipService {
    /// Create a service with default path configurations.
    pub fn new(
        tags: Arc<dyn TagRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        judge: Arc<dyn SimilarityJudge>,
        embedder: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self::with_configs(
            tags,
            relationships,
            judge,
            embedder,
            ExactPathConfig::default(),
            FastPathConfig::default(),
        )
    }

    /// Create a service with custom path configurations.
    pub fn with_configs(
        tags: Arc<dyn TagRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        judge: Arc<dyn SimilarityJudge>,
        embedder: Arc<dyn EmbeddingBackend>,
        exact_config: ExactPathConfig,
        fast_config: FastPathConfig,
    ) -> Self {
        Self {
            tags,
            relationships,
            exact: ExactRelationshipCalculator::with_config(judge, exact_config),
            fast: FastRelationshipCalculator::with_config(embedder, fast_config),
        }
    }

    /// Recompute relationships on the exact (LLM-judged) path and store the
    /// resulting edges.
    #[instrument(skip(self), fields(subsystem = "engine", component = "relationship_service", op = "recompute_exact"))]
    pub async fn recompute_exact(&self) -> Result<RecomputeSummary> {
        let tags = self.tags.list().await?;
        let edges = self.exact.calculate(&tags).await?;
        self.persist(edges).await
    }

    /// Recompute relationships on the fast (embedding) path and store the
    /// resulting edges.
    #[instrument(skip(self), fields(subsystem = "engine", component = "relationship_service", op = "recompute_fast"))]
    pub async fn recompute_fast(&self) -> Result<RecomputeSummary> {
        let tags = self.tags.list().await?;
        let edges = self.fast.calculate(&tags).await?;
        self.persist(edges).await
    }

    async fn persist(&self, edges: Vec<RelationshipEdge>) -> Result<RecomputeSummary> {
        let start = Instant::now();

        for edge in &edges {
            self.relationships.upsert(edge).await?;
        }

        info!(
            edge_count = edges.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Relationship edges stored"
        );
        Ok(RecomputeSummary {
            count: edges.len(),
            edges,
        })
    }
}
