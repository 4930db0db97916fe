//! # trellis-engine
//!
//! Embedding-based similarity engine for trellis.
//!
//! This crate provides:
//! - An ephemeral vector similarity index, rebuilt per request
//! - The exact (LLM-judged, O(n²)) tag relationship path
//! - The fast (embedding nearest-neighbor, O(n)) tag relationship path
//! - Semantic note search over per-query embeddings
//! - The recompute service gluing store reads, a calculator, and edge writes
//!
//! The two relationship paths are deliberately separate strategies with
//! different thresholds and cost models; they share only the canonical
//! edge-emission contract and the edge store.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trellis_engine::{RelationshipService, SemanticNoteSearch};
//!
//! let service = RelationshipService::new(tags, relationships, judge, embedder);
//! let summary = service.recompute_fast().await?;
//! println!("stored {} edges", summary.count);
//!
//! let search = SemanticNoteSearch::new(embedder);
//! let hits = search.search("sourdough starters", &notes).await?;
//! ```

pub mod exact;
pub mod fast;
pub mod index;
pub mod search;
pub mod service;

// Re-export core types
pub use trellis_core::*;

pub use exact::{ExactPathConfig, ExactRelationshipCalculator};
pub use fast::{FastPathConfig, FastRelationshipCalculator};
pub use index::{cosine_distance, cosine_similarity, normalized_similarity, Neighbor, VectorIndex};
pub use search::{SearchConfig, SemanticNoteSearch};
pub use service::RelationshipService;
