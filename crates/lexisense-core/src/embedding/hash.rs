use crate::error::Result;
use crate::text::tokenize;

use super::EmbeddingProvider;

const BIGRAM_WEIGHT: f32 = 0.8;

/// Deterministic feature-hashing embedder.
///
/// Tokens and adjacent token pairs are hashed into a fixed number of
/// buckets and the vector is L2-normalized. It needs no network and gives
/// stable vectors, which makes it the offline provider of choice.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    #[must_use]
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);
        for token in &tokens {
            accumulate_feature(&mut vec, token, 1.0);
        }
        for pair in tokens.windows(2) {
            let feature = format!("bi:{}_{}", pair[0], pair[1]);
            accumulate_feature(&mut vec, &feature, BIGRAM_WEIGHT);
        }
        normalize_vector(&mut vec);
        vec
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

fn accumulate_feature(vec: &mut [f32], feature: &str, weight: f32) {
    let hash = blake3::hash(feature.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    let bucket = u64::from_le_bytes(head) % vec.len() as u64;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "bucket is reduced modulo the vector length, which is a usize"
    )]
    {
        vec[bucket as usize] += weight;
    }
}

fn normalize_vector(vec: &mut [f32]) {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vec {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn hash_embedding_is_fixed_dimension_and_unit_length() {
        let vec = HashEmbedder::new(64).embed_one("revenue increased by twenty percent");
        assert_eq!(vec.len(), 64);
        let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hash_embedding_is_deterministic() {
        let embedder = HashEmbedder::new(32);
        assert_eq!(embedder.embed_one("same text"), embedder.embed_one("same text"));
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let vec = HashEmbedder::new(16).embed_one("   ");
        assert!(vec.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn shared_vocabulary_scores_higher_than_disjoint_text() {
        let embedder = HashEmbedder::new(256);
        let query = embedder.embed_one("quarterly revenue growth");
        let related = embedder.embed_one("revenue growth was strong this quarterly period");
        let unrelated = embedder.embed_one("the cat sat on a warm mat");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn batch_embed_preserves_order_and_count() {
        let embedder = HashEmbedder::new(16);
        let texts = vec!["a b".to_string(), String::new(), "c".to_string()];
        let rows = embedder.embed(&texts).expect("hash embed");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], embedder.embed_one("a b"));
        assert_eq!(rows[2], embedder.embed_one("c"));
    }
}
