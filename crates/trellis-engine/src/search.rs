//! Semantic note search over ephemeral per-query embeddings.
//!
//! The corpus and the query are embedded together in a single batch call
//! (corpus first, query last) to keep the whole search at one network
//! round trip, then the corpus vectors are indexed and ranked against the
//! query vector. Nothing survives the call: vectors and index are rebuilt
//! from scratch every time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use trellis_core::{
    defaults, EmbeddingBackend, Error, NoteWithTags, Result, ScoredNote,
};

use crate::index::VectorIndex;

/// Configuration for semantic note search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum neighbors requested from the index.
    pub limit: usize,
    /// Results at or below this normalized similarity are excluded.
    pub min_similarity: f32,
    /// Fixed calibration constant for distance normalization.
    pub max_distance: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: defaults::SEARCH_LIMIT,
            min_similarity: defaults::SEARCH_MIN_SIMILARITY,
            max_distance: defaults::MAX_DISTANCE,
        }
    }
}

impl SearchConfig {
    /// Set the neighbor limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the minimum similarity floor.
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }
}

/// Ranks a note snapshot against a free-text query by embedding similarity.
pub struct SemanticNoteSearch {
    embedder: Arc<dyn EmbeddingBackend>,
    config: SearchConfig,
}

impl SemanticNoteSearch {
    /// Create a search engine with default configuration.
    pub fn new(embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self::with_config(embedder, SearchConfig::default())
    }

    /// Create a search engine with custom configuration.
    pub fn with_config(embedder: Arc<dyn EmbeddingBackend>, config: SearchConfig) -> Self {
        Self { embedder, config }
    }

    /// Search the note snapshot for the query, strongest match first.
    ///
    /// A blank query is a validation error, rejected before any embedding
    /// call. An empty corpus short-circuits to an empty result list, also
    /// without an embedding call.
    #[instrument(skip(self, query, notes), fields(subsystem = "engine", component = "search", op = "search", corpus_size = notes.len()))]
    pub async fn search(&self, query: &str, notes: &[NoteWithTags]) -> Result<Vec<ScoredNote>> {
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        if notes.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();

        // Corpus first, query last: one batch, one round trip.
        let mut texts: Vec<String> = notes.iter().map(|n| n.embedding_text()).collect();
        texts.push(query.to_string());

        let mut vectors = self.embedder.embed_texts(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        let query_vector = vectors
            .pop()
            .ok_or_else(|| Error::Internal("Embedding batch came back empty".to_string()))?;

        let ids: Vec<_> = notes.iter().map(|n| n.id).collect();
        let index = VectorIndex::build(ids, vectors)?;

        let k = self.config.limit.min(notes.len());
        let hits = index.query(query_vector.as_slice(), k)?;

        let by_id: HashMap<Uuid, &NoteWithTags> = notes.iter().map(|n| (n.id, n)).collect();

        let mut results: Vec<ScoredNote> = hits
            .into_iter()
            .filter_map(|neighbor| {
                let similarity = 1.0 - neighbor.distance / self.config.max_distance;
                if similarity > self.config.min_similarity {
                    by_id.get(&neighbor.id).map(|note| ScoredNote {
                        note: (*note).clone(),
                        similarity,
                    })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(candidate_count = k, "Ranked search candidates");
        info!(
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Semantic search complete"
        );
        Ok(results)
    }
}
