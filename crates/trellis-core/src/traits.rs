//! Core traits for trellis abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. Provider and store
//! clients are explicitly constructed and injected into each component;
//! there is no process-wide singleton state anywhere in the system.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// Repository for note storage and retrieval.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note, returning its id.
    async fn insert(&self, title: &str, content: &str) -> Result<Uuid>;

    /// List all notes with their tag names, most recently updated first.
    async fn list_with_tags(&self) -> Result<Vec<NoteWithTags>>;

    /// List notes carrying the given tag name. Unknown tags yield an
    /// empty list, not an error.
    async fn find_by_tag(&self, tag_name: &str) -> Result<Vec<NoteWithTags>>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for tag operations.
///
/// Tags are created lazily: `ensure` and `add_to_note` insert the tag row
/// on first use and are idempotent on the unique name.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Get or create a tag by name, returning the stored record.
    async fn ensure(&self, name: &str) -> Result<Tag>;

    /// List all tags.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Attach a tag to a note, creating the tag if needed.
    async fn add_to_note(&self, note_id: Uuid, tag_name: &str) -> Result<()>;

    /// Get all tag names for a note.
    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<String>>;
}

// =============================================================================
// RELATIONSHIP REPOSITORY TRAITS
// =============================================================================

/// Repository for tag relationship edges.
///
/// Writes are insert-or-replace keyed by the canonical unordered pair, so
/// recomputation fully supersedes prior edges for the recomputed pairs and
/// concurrent recomputations converge (last write wins per edge).
#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    /// Insert or replace the edge for its canonical pair.
    async fn upsert(&self, edge: &RelationshipEdge) -> Result<()>;

    /// List stored edges with similarity above the floor, joined with tag
    /// names, strongest first.
    async fn list(&self, min_similarity: f32) -> Result<Vec<TagRelationship>>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Length-preserving and order-preserving: returns one vector per input
    /// text, in input order, or fails as a unit. Never partial results.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Combined inference backend supporting both embedding and generation.
#[async_trait]
pub trait InferenceBackend: EmbeddingBackend + GenerationBackend {
    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}

/// Judge capability: score the conceptual similarity of two text snippets
/// directly with a language model, as opposed to deriving similarity from
/// embeddings.
///
/// Implementations clamp scores into [0,1] and map malformed model output
/// to 0.0; only transport-level failures surface as `Err`, and callers
/// degrade those to 0.0 rather than aborting a batch.
#[async_trait]
pub trait SimilarityJudge: Send + Sync {
    /// Score the similarity of two texts in [0,1].
    async fn score_pair(&self, a: &str, b: &str) -> Result<f32>;
}
