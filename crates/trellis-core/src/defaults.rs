//! Centralized default constants for the trellis system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining their
//! own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding model name.
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Default embedding vector dimension for text-embedding-3-small.
pub const EMBED_DIMENSION: usize = 1536;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default OpenAI-compatible API base URL. Any endpoint speaking the same
/// wire format works here, including a local Ollama server's `/v1`.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model name (tag suggestion, similarity judging).
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// RELATIONSHIP DISCOVERY
// =============================================================================

/// Maximum tag count accepted by the exact (LLM-judged) relationship path.
/// Pair count grows quadratically; 50 tags already means 1225 judge calls.
pub const MAX_EXACT_TAGS: usize = 50;

/// Number of pair comparisons processed per batch on the exact path.
pub const EXACT_BATCH_SIZE: usize = 5;

/// Delay in milliseconds before each judge call within a batch, to stay
/// under upstream rate limits.
pub const EXACT_PAIR_DELAY_MS: u64 = 100;

/// Minimum similarity for an exact-path edge to be kept. Lower than the
/// fast path's floor since the judge is noisier at low similarity.
pub const EXACT_MIN_SIMILARITY: f32 = 0.1;

/// Minimum similarity for a fast-path (embedding) edge to be kept.
/// Embedding cosine similarity for short phrases compresses near 1.0, so
/// the floor sits higher than the exact path's.
pub const FAST_MIN_SIMILARITY: f32 = 0.3;

/// Minimum stored similarity served by the relationship read endpoint.
pub const RELATIONSHIP_READ_FLOOR: f32 = 0.3;

// =============================================================================
// SEARCH
// =============================================================================

/// Maximum number of neighbors requested per search query.
pub const SEARCH_LIMIT: usize = 10;

/// Minimum normalized similarity for a search hit to be returned.
pub const SEARCH_MIN_SIMILARITY: f32 = 0.2;

/// Fixed calibration constant for normalizing index distances into
/// similarities on the search path: `similarity = 1 - distance / MAX_DISTANCE`.
/// This is a documented normalization, not a learned parameter.
pub const MAX_DISTANCE: f32 = 2.0;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3001;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_ordering() {
        // The exact path keeps noisier low-similarity judgments; the fast
        // path and the read endpoint both sit at the stricter floor.
        assert!(EXACT_MIN_SIMILARITY < SEARCH_MIN_SIMILARITY);
        assert!(SEARCH_MIN_SIMILARITY < FAST_MIN_SIMILARITY);
        assert_eq!(FAST_MIN_SIMILARITY, RELATIONSHIP_READ_FLOOR);
    }

    #[test]
    fn test_exact_path_defaults() {
        assert_eq!(MAX_EXACT_TAGS, 50);
        assert_eq!(EXACT_BATCH_SIZE, 5);
        assert_eq!(EXACT_PAIR_DELAY_MS, 100);
    }

    #[test]
    fn test_embedding_defaults() {
        assert_eq!(EMBED_MODEL, "text-embedding-3-small");
        assert_eq!(EMBED_DIMENSION, 1536);
    }

    #[test]
    fn test_max_distance_is_cosine_range() {
        // Cosine distance spans [0, 2]; the calibration constant covers it.
        assert_eq!(MAX_DISTANCE, 2.0);
    }
}
