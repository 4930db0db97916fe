//! Core data models for trellis.
//!
//! These types are shared across all trellis crates and represent the core
//! domain entities: tags, notes, relationship edges, and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

// =============================================================================
// TAG TYPES
// =============================================================================

/// A tag attached to notes.
///
/// Identity is name-uniqueness; the id is a stable surrogate key assigned
/// when the tag is first created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note together with the names of its tags, as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteWithTags {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl NoteWithTags {
    /// The text fed to the embedding model for this note:
    /// title, content, and tag names joined by single spaces.
    pub fn embedding_text(&self) -> String {
        format!("{} {} {}", self.title, self.content, self.tags.join(" "))
    }
}

// =============================================================================
// RELATIONSHIP TYPES
// =============================================================================

/// An undirected similarity edge between two tags.
///
/// The pair is canonical: `tag1_id` always sorts before `tag2_id`, so an
/// unordered pair is represented exactly once and (A,B)/(B,A) collapse to
/// the same edge. Self-edges are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RelationshipEdge {
    pub tag1_id: Uuid,
    pub tag2_id: Uuid,
    pub similarity: f32,
}

impl RelationshipEdge {
    /// Build a canonical edge from an unordered id pair.
    ///
    /// Returns `None` when both ids are equal (self-edges are forbidden).
    pub fn try_new(a: Uuid, b: Uuid, similarity: f32) -> Option<Self> {
        if a == b {
            return None;
        }
        let (tag1_id, tag2_id) = if a < b { (a, b) } else { (b, a) };
        Some(Self {
            tag1_id,
            tag2_id,
            similarity,
        })
    }
}

/// A stored relationship joined with tag names, as served by read queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TagRelationship {
    pub tag1: String,
    pub tag2: String,
    pub similarity: f32,
}

/// Outcome of a relationship recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecomputeSummary {
    /// Number of edges written to the store.
    pub count: usize,
    /// The edges themselves, canonical and deduplicated.
    pub edges: Vec<RelationshipEdge>,
}

// =============================================================================
// SEARCH TYPES
// =============================================================================

/// A note scored against one search query.
///
/// Exists only for the lifetime of a single search call; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScoredNote {
    pub note: NoteWithTags,
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, content: &str, tags: &[&str]) -> NoteWithTags {
        NoteWithTags {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_embedding_text_composition() {
        let n = note("Sourdough", "Starter needs feeding", &["baking", "bread"]);
        assert_eq!(
            n.embedding_text(),
            "Sourdough Starter needs feeding baking bread"
        );
    }

    #[test]
    fn test_embedding_text_without_tags() {
        let n = note("Untitled", "body", &[]);
        assert_eq!(n.embedding_text(), "Untitled body ");
    }

    #[test]
    fn test_edge_canonical_ordering() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let forward = RelationshipEdge::try_new(a, b, 0.8).unwrap();
        let reverse = RelationshipEdge::try_new(b, a, 0.8).unwrap();

        assert_eq!(forward, reverse);
        assert!(forward.tag1_id < forward.tag2_id);
    }

    #[test]
    fn test_edge_rejects_self_pair() {
        let id = Uuid::new_v4();
        assert!(RelationshipEdge::try_new(id, id, 1.0).is_none());
    }

    #[test]
    fn test_edge_serialization_round_trip() {
        let edge = RelationshipEdge::try_new(Uuid::new_v4(), Uuid::new_v4(), 0.42).unwrap();
        let json = serde_json::to_string(&edge).unwrap();
        let parsed: RelationshipEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, edge);
    }

    #[test]
    fn test_scored_note_is_not_persisted_shape() {
        // ScoredNote wraps the store snapshot plus a derived score; the
        // score has no id of its own.
        let n = note("A", "b", &["t"]);
        let scored = ScoredNote {
            note: n.clone(),
            similarity: 0.7,
        };
        assert_eq!(scored.note.id, n.id);
    }
}
