//! Ephemeral vector similarity index.
//!
//! Rebuilt from scratch on every relationship calculation or search
//! invocation; no persistence and no incremental insert. Brute-force cosine
//! scan: correctness first, and the per-request corpus (one vector per tag
//! or note) stays small enough that an ANN structure buys nothing.

use tracing::debug;
use uuid::Uuid;

use trellis_core::{defaults, Error, Result, Vector};

/// Cosine similarity of two vectors. Zero-magnitude vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a > 0.0 && mag_b > 0.0 {
        dot / (mag_a * mag_b)
    } else {
        0.0
    }
}

/// Cosine distance: `1 - cosine similarity`, spanning [0, 2].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Normalize an index distance into a similarity for the search path:
/// `1 - distance / MAX_DISTANCE`, with the fixed calibration constant.
pub fn normalized_similarity(distance: f32) -> f32 {
    1.0 - distance / defaults::MAX_DISTANCE
}

/// A neighbor returned by an index query, nearest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: Uuid,
    pub distance: f32,
}

/// Brute-force nearest-neighbor index over a batch of id'd vectors.
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<(Uuid, Vector)>,
}

impl VectorIndex {
    /// Build an index over the given ids and vectors.
    ///
    /// The two slices must pair up one-to-one and every vector must share
    /// one dimension.
    pub fn build(ids: Vec<Uuid>, vectors: Vec<Vector>) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(Error::InvalidInput(format!(
                "Index requires one id per vector: {} ids, {} vectors",
                ids.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map(|v| v.as_slice().len()).unwrap_or(0);
        for (id, vector) in ids.iter().zip(vectors.iter()) {
            let len = vector.as_slice().len();
            if len != dimension {
                return Err(Error::InvalidInput(format!(
                    "Vector for {} has dimension {}, expected {}",
                    id, len, dimension
                )));
            }
        }

        debug!(
            subsystem = "engine",
            component = "vector_index",
            op = "build",
            input_count = ids.len(),
            dimension,
            "Built ephemeral vector index"
        );

        Ok(Self {
            dimension,
            entries: ids.into_iter().zip(vectors).collect(),
        })
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension of the indexed vectors (0 for an empty index).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Query the k nearest vectors to an external query vector.
    ///
    /// Results are sorted ascending by cosine distance (nearest first).
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::InvalidInput(format!(
                "Query has dimension {}, index has {}",
                query.len(),
                self.dimension
            )));
        }

        Ok(self.scan(query, k, None))
    }

    /// Query the k nearest neighbors of an indexed vector, excluding itself.
    ///
    /// With `k = len - 1` this yields every other vector: the top-(N-1)
    /// neighbor list. For N <= 1 that list is empty.
    pub fn neighbors(&self, id: Uuid, k: usize) -> Result<Vec<Neighbor>> {
        let vector = self
            .entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::NotFound(format!("Vector {} not in index", id)))?;

        Ok(self.scan(vector.as_slice(), k, Some(id)))
    }

    fn scan(&self, query: &[f32], k: usize, exclude: Option<Uuid>) -> Vec<Neighbor> {
        let mut neighbors: Vec<Neighbor> = self
            .entries
            .iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .map(|(id, vector)| Neighbor {
                id: *id,
                distance: cosine_distance(query, vector.as_slice()),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(k);
        neighbors
    }
}
