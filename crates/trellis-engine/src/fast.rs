//! Fast tag relationship path: embedding nearest-neighbor discovery.
//!
//! One batch embedding call covers every tag name, then an ephemeral
//! vector index answers each tag's top-(n-1) neighbor list. Costs O(n)
//! embedding inputs plus an O(n²) in-memory scan, versus the exact path's
//! O(n²) language-model round trips, trading judge-quality nuance for
//! throughput. Both paths emit the same canonical edge shape into the same
//! store.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use trellis_core::{
    defaults, EmbeddingBackend, Error, RelationshipEdge, Result, Tag,
};

use crate::index::VectorIndex;

/// Configuration for the fast relationship path.
#[derive(Debug, Clone)]
pub struct FastPathConfig {
    /// Edges at or below this similarity are discarded. Higher than the
    /// exact path's floor: short-phrase cosine similarity compresses
    /// toward 1.0, so weak neighbors still score fairly high.
    pub min_similarity: f32,
}

impl Default for FastPathConfig {
    fn default() -> Self {
        Self {
            min_similarity: defaults::FAST_MIN_SIMILARITY,
        }
    }
}

impl FastPathConfig {
    /// Set the minimum similarity floor.
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }
}

/// Calculates tag relationships from embedding nearest neighbors.
pub struct FastRelationshipCalculator {
    embedder: Arc<dyn EmbeddingBackend>,
    config: FastPathConfig,
}

impl FastRelationshipCalculator {
    /// Create a calculator with default configuration.
    pub fn new(embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self::with_config(embedder, FastPathConfig::default())
    }

    /// Create a calculator with custom configuration.
    pub fn with_config(embedder: Arc<dyn EmbeddingBackend>, config: FastPathConfig) -> Self {
        Self { embedder, config }
    }

    /// Embed all tag names in one batch, then emit the thresholded,
    /// deduplicated edge set from each tag's neighbor list.
    ///
    /// Tag sets of size <= 1 short-circuit to an empty edge set without an
    /// embedding call. A failed or partial embedding batch is fatal: a
    /// misaligned vector set would pair similarities with the wrong tags.
    #[instrument(skip(self, tags), fields(subsystem = "engine", component = "fast_path", op = "calculate", tag_count = tags.len()))]
    pub async fn calculate(&self, tags: &[Tag]) -> Result<Vec<RelationshipEdge>> {
        if tags.len() <= 1 {
            return Ok(Vec::new());
        }

        let start = Instant::now();

        let names: Vec<String> = tags.iter().map(|t| t.name.clone()).collect();
        let vectors = self.embedder.embed_texts(&names).await?;
        if vectors.len() != tags.len() {
            return Err(Error::Embedding(format!(
                "Expected {} tag vectors, got {}",
                tags.len(),
                vectors.len()
            )));
        }

        let ids: Vec<_> = tags.iter().map(|t| t.id).collect();
        let index = VectorIndex::build(ids, vectors)?;

        let mut edges = Vec::new();
        for tag in tags {
            for neighbor in index.neighbors(tag.id, tags.len() - 1)? {
                let similarity = 1.0 - neighbor.distance;

                // Emit each unordered pair from its lower-id endpoint only.
                if similarity > self.config.min_similarity && tag.id < neighbor.id {
                    if let Some(edge) = RelationshipEdge::try_new(tag.id, neighbor.id, similarity)
                    {
                        edges.push(edge);
                    }
                }
            }
        }

        debug!(
            input_count = tags.len(),
            "Neighbor lists scanned for edge emission"
        );
        info!(
            edge_count = edges.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fast relationship path complete"
        );
        Ok(edges)
    }
}
