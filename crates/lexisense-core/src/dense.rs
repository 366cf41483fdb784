use tracing::{debug, warn};

use crate::embedding::EmbeddingProvider;
use crate::error::LexiError;

const NORM_EPSILON: f32 = 1e-10;

/// Row-aligned embedding matrix with cached L2 norms.
#[derive(Debug, Clone, Default)]
pub struct DenseIndex {
    dimension: usize,
    rows: Vec<Vec<f32>>,
    norms: Vec<f32>,
}

impl DenseIndex {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: Vec::new(),
            norms: Vec::new(),
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends rows; anything not matching the index dimension is stored as zeros.
    pub fn append(&mut self, vectors: Vec<Vec<f32>>) {
        for vector in vectors {
            let row = if vector.len() == self.dimension {
                vector
            } else {
                vec![0.0; self.dimension]
            };
            self.norms.push(l2_norm(&row));
            self.rows.push(row);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.norms.clear();
    }

    /// Cosine similarity of `query` against every row, clamped to `>= 0`.
    #[must_use]
    pub fn similarity(&self, query: &[f32]) -> Vec<f32> {
        if query.len() != self.dimension {
            return vec![0.0; self.rows.len()];
        }
        let query_norm = l2_norm(query) + NORM_EPSILON;
        self.rows
            .iter()
            .zip(&self.norms)
            .map(|(row, norm)| {
                let dot = row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>();
                let cosine = dot / (query_norm * (norm + NORM_EPSILON));
                cosine.max(0.0)
            })
            .collect()
    }
}

/// Embeds `texts`, substituting zero vectors for the whole batch on any
/// provider failure or mis-shaped response.
#[must_use]
pub fn embed_or_zeros(provider: &dyn EmbeddingProvider, texts: &[String]) -> Vec<Vec<f32>> {
    let dimension = provider.dimension();
    if texts.is_empty() {
        return Vec::new();
    }
    let zeros = || vec![vec![0.0f32; dimension]; texts.len()];

    match provider.embed(texts) {
        Ok(rows) if rows.len() == texts.len() && rows.iter().all(|row| row.len() == dimension) => {
            rows
        }
        Ok(rows) => {
            warn!(
                provider = provider.name(),
                expected_rows = texts.len(),
                rows = rows.len(),
                dimension,
                "embedding response has the wrong shape; using zero vectors"
            );
            zeros()
        }
        Err(LexiError::EmbedderNotConfigured) => {
            debug!(
                provider = provider.name(),
                batch = texts.len(),
                "no embedding provider configured; using zero vectors"
            );
            zeros()
        }
        Err(err) => {
            warn!(
                provider = provider.name(),
                code = err.code(),
                error = %err,
                batch = texts.len(),
                "embedding failed; using zero vectors"
            );
            zeros()
        }
    }
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}
