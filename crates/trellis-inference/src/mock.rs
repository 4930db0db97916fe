//! Mock inference backends for deterministic testing.
//!
//! These implement the core inference traits with no network access:
//! embeddings are derived from text content (or explicit per-text
//! overrides), judge scores come from a per-pair map, and every call is
//! logged so tests can assert on provider-call counts.
//!
//! ## Usage
//!
//! ```rust
//! use trellis_core::EmbeddingBackend;
//! use trellis_inference::mock::MockEmbeddingBackend;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = MockEmbeddingBackend::new().with_dimension(8);
//! let vectors = backend
//!     .embed_texts(&["test".to_string()])
//!     .await
//!     .unwrap();
//! assert_eq!(vectors[0].as_slice().len(), 8);
//! assert_eq!(backend.batch_count(), 1);
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use trellis_core::{
    EmbeddingBackend, Error, GenerationBackend, Result, SimilarityJudge, Vector,
};

/// Generate a deterministic unit vector from text.
///
/// Character-based hashing: the same text always produces the same
/// embedding, and different texts usually diverge.
pub fn deterministic_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dimension];
    for (i, c) in text.chars().enumerate() {
        let idx = (c as usize + i) % dimension;
        vec[idx] += 0.1;
    }
    normalize(&mut vec);
    vec
}

fn normalize(vec: &mut [f32]) {
    let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        vec.iter_mut().for_each(|x| *x /= magnitude);
    }
}

// =============================================================================
// EMBEDDING BACKEND
// =============================================================================

/// Deterministic embedding backend with call logging.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    dimension: usize,
    overrides: HashMap<String, Vec<f32>>,
    fail: bool,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockEmbeddingBackend {
    /// Create a mock backend with a small default dimension.
    pub fn new() -> Self {
        Self {
            dimension: 8,
            overrides: HashMap::new(),
            fail: false,
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Pin an exact vector for a specific input text.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.overrides.insert(text.into(), vector);
        self
    }

    /// Make every batch call fail (simulates an upstream outage).
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of batch calls made so far.
    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    /// All texts embedded so far, across batches, in call order.
    pub fn embedded_texts(&self) -> Vec<String> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.batches.lock().unwrap().push(texts.to_vec());

        if self.fail {
            return Err(Error::Embedding("simulated embedding failure".to_string()));
        }

        let vectors = texts
            .iter()
            .map(|t| {
                let raw = self
                    .overrides
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| deterministic_embedding(t, self.dimension));
                Vector::from(raw)
            })
            .collect();
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

// =============================================================================
// SIMILARITY JUDGE
// =============================================================================

/// Similarity judge with per-pair score maps and failure injection.
///
/// Pairs are keyed order-insensitively, matching the undirected semantics
/// of relationship edges.
#[derive(Clone)]
pub struct MockJudge {
    scores: HashMap<(String, String), f32>,
    failures: HashSet<(String, String)>,
    default_score: f32,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl MockJudge {
    /// Create a judge that scores every pair 0.0 by default.
    pub fn new() -> Self {
        Self {
            scores: HashMap::new(),
            failures: HashSet::new(),
            default_score: 0.0,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the score for a specific unordered pair.
    pub fn with_score(mut self, a: &str, b: &str, score: f32) -> Self {
        self.scores.insert(pair_key(a, b), score);
        self
    }

    /// Make calls for a specific unordered pair fail.
    pub fn with_failure(mut self, a: &str, b: &str) -> Self {
        self.failures.insert(pair_key(a, b));
        self
    }

    /// Set the score returned for unmapped pairs.
    pub fn with_default_score(mut self, score: f32) -> Self {
        self.default_score = score;
        self
    }

    /// Number of judge calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All judged pairs in call order, canonically keyed.
    pub fn judged_pairs(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockJudge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimilarityJudge for MockJudge {
    async fn score_pair(&self, a: &str, b: &str) -> Result<f32> {
        let key = pair_key(a, b);
        self.calls.lock().unwrap().push(key.clone());

        if self.failures.contains(&key) {
            return Err(Error::Inference("simulated judge failure".to_string()));
        }

        Ok(self.scores.get(&key).copied().unwrap_or(self.default_score))
    }
}

// =============================================================================
// GENERATION BACKEND
// =============================================================================

/// Generation backend returning canned responses.
#[derive(Clone)]
pub struct MockGenerationBackend {
    default_response: String,
    fail: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            default_response: "Mock response".to_string(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the response returned for every prompt.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Make every generation call fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of generation calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());

        if self.fail {
            return Err(Error::Inference("simulated generation failure".to_string()));
        }

        Ok(self.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}
