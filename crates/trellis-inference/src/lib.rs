//! # trellis-inference
//!
//! LLM inference backend abstraction for trellis.
//!
//! This crate provides:
//! - An OpenAI-compatible HTTP backend for batch embeddings and generation
//! - The prompted pairwise similarity judge with clamp-and-default parsing
//! - The JSON-array tag extractor used when notes are created
//! - A deterministic mock backend for tests (feature `mock`)
//!
//! Backends are plain constructed objects passed into each component; the
//! crate holds no global client state.
//!
//! # Example
//!
//! ```rust,no_run
//! use trellis_inference::OpenAiBackend;
//! use trellis_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAiBackend::from_env().unwrap();
//!     let texts = vec!["Hello".to_string()];
//!     let embeddings = backend.embed_texts(&texts).await.unwrap();
//!     assert_eq!(embeddings.len(), 1);
//! }
//! ```

pub mod judge;
pub mod openai;
pub mod tagging;

// Mock inference backends for deterministic testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use trellis_core::*;

pub use judge::{parse_similarity_score, LlmSimilarityJudge};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use tagging::{parse_tag_array, TagExtractor};
