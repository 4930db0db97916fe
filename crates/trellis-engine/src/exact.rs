//! Exact tag relationship path: direct LLM-judged pair scoring.
//!
//! Every unordered tag pair costs one judge round trip, so the path is
//! O(n²) in language-model calls. Two guardrails keep it usable: a hard
//! ceiling on the input tag count, and batched pacing so a burst of pairs
//! does not trip upstream rate limits. Batches run strictly sequentially;
//! only the calls within one batch are awaited concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use trellis_core::{defaults, Error, RelationshipEdge, Result, SimilarityJudge, Tag};

/// Configuration for the exact relationship path.
#[derive(Debug, Clone)]
pub struct ExactPathConfig {
    /// Reject inputs with more tags than this before any judge call.
    pub max_tags: usize,
    /// Pairs scored per batch; batches are processed sequentially.
    pub batch_size: usize,
    /// Delay before each judge call, for rate-limit pacing.
    pub pair_delay: Duration,
    /// Edges at or below this similarity are discarded.
    pub min_similarity: f32,
}

impl Default for ExactPathConfig {
    fn default() -> Self {
        Self {
            max_tags: defaults::MAX_EXACT_TAGS,
            batch_size: defaults::EXACT_BATCH_SIZE,
            pair_delay: Duration::from_millis(defaults::EXACT_PAIR_DELAY_MS),
            min_similarity: defaults::EXACT_MIN_SIMILARITY,
        }
    }
}

impl ExactPathConfig {
    /// Set the maximum accepted tag count.
    pub fn with_max_tags(mut self, max_tags: usize) -> Self {
        self.max_tags = max_tags;
        self
    }

    /// Set the per-call pacing delay.
    pub fn with_pair_delay(mut self, delay: Duration) -> Self {
        self.pair_delay = delay;
        self
    }

    /// Set the minimum similarity floor.
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }
}

/// Calculates tag relationships by judging every unordered pair.
pub struct ExactRelationshipCalculator {
    judge: Arc<dyn SimilarityJudge>,
    config: ExactPathConfig,
}

impl ExactRelationshipCalculator {
    /// Create a calculator with default configuration.
    pub fn new(judge: Arc<dyn SimilarityJudge>) -> Self {
        Self::with_config(judge, ExactPathConfig::default())
    }

    /// Create a calculator with custom configuration.
    pub fn with_config(judge: Arc<dyn SimilarityJudge>, config: ExactPathConfig) -> Self {
        Self { judge, config }
    }

    /// Score every unordered pair among `tags` and return the thresholded,
    /// canonical edge set.
    ///
    /// Fails with `Error::TooManyTags` before any judge call when the input
    /// exceeds the configured ceiling. Tag sets of size <= 1 short-circuit
    /// to an empty edge set, also without judge calls.
    #[instrument(skip(self, tags), fields(subsystem = "engine", component = "exact_path", op = "calculate", tag_count = tags.len()))]
    pub async fn calculate(&self, tags: &[Tag]) -> Result<Vec<RelationshipEdge>> {
        if tags.len() > self.config.max_tags {
            return Err(Error::TooManyTags {
                count: tags.len(),
                limit: self.config.max_tags,
            });
        }
        if tags.len() <= 1 {
            return Ok(Vec::new());
        }

        let start = Instant::now();

        let mut pairs = Vec::new();
        for i in 0..tags.len() {
            for j in (i + 1)..tags.len() {
                pairs.push((&tags[i], &tags[j]));
            }
        }
        let pair_count = pairs.len();

        debug!(
            pair_count,
            batch_size = self.config.batch_size,
            "Scoring tag pairs in batches"
        );

        let mut edges = Vec::new();
        for (batch_index, batch) in pairs.chunks(self.config.batch_size).enumerate() {
            let scores =
                join_all(batch.iter().map(|(a, b)| self.score_with_default(a, b))).await;

            for ((a, b), similarity) in batch.iter().zip(scores) {
                if similarity > self.config.min_similarity {
                    if let Some(edge) = RelationshipEdge::try_new(a.id, b.id, similarity) {
                        edges.push(edge);
                    }
                }
            }

            debug!(
                batch = batch_index + 1,
                batches = pair_count.div_ceil(self.config.batch_size),
                "Processed pair batch"
            );
        }

        info!(
            pair_count,
            edge_count = edges.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Exact relationship path complete"
        );
        Ok(edges)
    }

    /// Score one pair, degrading any judge failure to similarity 0 so a
    /// single bad call never aborts the batch.
    async fn score_with_default(&self, a: &Tag, b: &Tag) -> f32 {
        tokio::time::sleep(self.config.pair_delay).await;

        match self.judge.score_pair(&a.name, &b.name).await {
            Ok(score) => score,
            Err(e) => {
                warn!(
                    tag1 = %a.name,
                    tag2 = %b.name,
                    error = %e,
                    "Judge call failed, defaulting pair similarity to 0"
                );
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trellis_inference::mock::MockJudge;
    use uuid::Uuid;

    fn tag(name: &str) -> Tag {
        Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at_utc: Utc::now(),
        }
    }

    fn fast_config() -> ExactPathConfig {
        ExactPathConfig::default().with_pair_delay(Duration::ZERO)
    }

    fn calculator(judge: &MockJudge) -> ExactRelationshipCalculator {
        ExactRelationshipCalculator::with_config(Arc::new(judge.clone()), fast_config())
    }

    #[tokio::test]
    async fn test_empty_and_singleton_make_no_judge_calls() {
        let judge = MockJudge::new();
        let calc = calculator(&judge);

        assert!(calc.calculate(&[]).await.unwrap().is_empty());
        assert!(calc.calculate(&[tag("solo")]).await.unwrap().is_empty());
        assert_eq!(judge.call_count(), 0);
    }

    #[tokio::test]
    async fn test_too_many_tags_rejected_without_judge_calls() {
        let judge = MockJudge::new();
        let calc = calculator(&judge);

        let tags: Vec<Tag> = (0..51).map(|i| tag(&format!("t{}", i))).collect();
        let result = calc.calculate(&tags).await;

        assert!(matches!(
            result,
            Err(Error::TooManyTags {
                count: 51,
                limit: 50
            })
        ));
        assert_eq!(judge.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fifty_tags_is_accepted() {
        let judge = MockJudge::new();
        let calc = calculator(&judge);

        let tags: Vec<Tag> = (0..50).map(|i| tag(&format!("t{}", i))).collect();
        assert!(calc.calculate(&tags).await.is_ok());
        assert_eq!(judge.call_count(), 50 * 49 / 2);
    }

    #[tokio::test]
    async fn test_each_pair_scored_exactly_once() {
        let judge = MockJudge::new();
        let calc = calculator(&judge);

        let tags: Vec<Tag> = (0..7).map(|i| tag(&format!("t{}", i))).collect();
        calc.calculate(&tags).await.unwrap();

        let pairs = judge.judged_pairs();
        assert_eq!(pairs.len(), 7 * 6 / 2);

        // No duplicates, no self-pairs.
        let mut seen = std::collections::HashSet::new();
        for (a, b) in pairs {
            assert_ne!(a, b);
            assert!(seen.insert((a, b)));
        }
    }

    #[tokio::test]
    async fn test_threshold_filters_weak_pairs() {
        let judge = MockJudge::new()
            .with_score("a", "b", 0.10)
            .with_score("a", "c", 0.11)
            .with_score("b", "c", 0.05);
        let calc = calculator(&judge);

        let edges = calc.calculate(&[tag("a"), tag("b"), tag("c")]).await.unwrap();

        // Exactly one edge survives: 0.10 is not > 0.1.
        assert_eq!(edges.len(), 1);
        assert!((edges[0].similarity - 0.11).abs() < 1e-6);
        assert!(edges.iter().all(|e| e.similarity > 0.1));
    }

    #[tokio::test]
    async fn test_concrete_scenario_cooking_baking_finance() {
        let judge = MockJudge::new()
            .with_score("cooking", "baking", 0.8)
            .with_score("cooking", "finance", 0.05)
            .with_score("baking", "finance", 0.05);
        let calc = calculator(&judge);

        let cooking = tag("cooking");
        let baking = tag("baking");
        let finance = tag("finance");
        let edges = calc
            .calculate(&[cooking.clone(), baking.clone(), finance.clone()])
            .await
            .unwrap();

        assert_eq!(edges.len(), 1);
        let expected = RelationshipEdge::try_new(cooking.id, baking.id, 0.8).unwrap();
        assert_eq!(edges[0], expected);
    }

    #[tokio::test]
    async fn test_single_judge_failure_degrades_not_aborts() {
        // Five tags, one failing pair; the rest score above threshold.
        let judge = MockJudge::new()
            .with_default_score(0.5)
            .with_failure("t1", "t3");
        let calc = calculator(&judge);

        let tags: Vec<Tag> = (0..5).map(|i| tag(&format!("t{}", i))).collect();
        let edges = calc.calculate(&tags).await.unwrap();

        // 10 pairs, the failing one degraded to 0 and filtered out.
        assert_eq!(judge.call_count(), 10);
        assert_eq!(edges.len(), 9);
    }

    #[tokio::test]
    async fn test_edges_are_canonical() {
        let judge = MockJudge::new().with_default_score(0.9);
        let calc = calculator(&judge);

        let tags: Vec<Tag> = (0..4).map(|i| tag(&format!("t{}", i))).collect();
        let edges = calc.calculate(&tags).await.unwrap();

        for edge in &edges {
            assert!(edge.tag1_id < edge.tag2_id);
        }
    }
}
