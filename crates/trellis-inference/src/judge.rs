//! Prompted pairwise similarity judge.
//!
//! Scores the conceptual similarity of two tag names by asking a language
//! model for a single number, instead of deriving similarity from
//! embeddings. One judge call per pair makes this O(n²) in round trips,
//! which is why the exact relationship path rations and paces its calls.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use trellis_core::{GenerationBackend, Result, SimilarityJudge};

/// System prompt pinning the judge to bare numeric output.
const SIMILARITY_SYSTEM_PROMPT: &str = "Rate the conceptual similarity between two tags \
    on a scale of 0.0 to 1.0. Return only the number, no other text.";

/// Parse a judge response into a similarity score.
///
/// Malformed or non-numeric output maps to 0.0 rather than an error, and
/// out-of-range values are clamped into [0,1]. A filtered-out pair costs
/// one inaccurate score; a propagated parse failure would cost the batch.
pub fn parse_similarity_score(raw: &str) -> f32 {
    match raw.trim().parse::<f32>() {
        Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Similarity judge backed by any generation model.
pub struct LlmSimilarityJudge {
    backend: Arc<dyn GenerationBackend>,
}

impl LlmSimilarityJudge {
    /// Create a judge over the given generation backend.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SimilarityJudge for LlmSimilarityJudge {
    #[instrument(skip(self), fields(subsystem = "inference", component = "judge", op = "score_pair"))]
    async fn score_pair(&self, a: &str, b: &str) -> Result<f32> {
        let prompt = format!("Rate similarity between \"{}\" and \"{}\"", a, b);
        let raw = self
            .backend
            .generate_with_system(SIMILARITY_SYSTEM_PROMPT, &prompt)
            .await?;
        Ok(parse_similarity_score(&raw))
    }
}
