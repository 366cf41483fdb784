use crate::error::Result;

use super::env::{EnvLookup, read_env_usize, read_env_weight};

const ENV_CHUNK_SIZE: &str = "LEXISENSE_CHUNK_SIZE";
const ENV_CHUNK_OVERLAP: &str = "LEXISENSE_CHUNK_OVERLAP";
const ENV_TOP_K: &str = "LEXISENSE_TOP_K";
const ENV_SEMANTIC_WEIGHT: &str = "LEXISENSE_SEMANTIC_WEIGHT";
const ENV_KEYWORD_WEIGHT: &str = "LEXISENSE_KEYWORD_WEIGHT";

pub const DEFAULT_CHUNK_SIZE_WORDS: usize = 600;
pub const DEFAULT_CHUNK_OVERLAP_WORDS: usize = 100;
pub const DEFAULT_TOP_K: usize = 8;
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.6;
pub const DEFAULT_KEYWORD_WEIGHT: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size_words: usize,
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size_words: DEFAULT_CHUNK_SIZE_WORDS,
            overlap_words: DEFAULT_CHUNK_OVERLAP_WORDS,
        }
    }
}

impl ChunkingConfig {
    #[must_use]
    pub(super) fn from_lookup(lookup: EnvLookup<'_>) -> Self {
        let defaults = Self::default();
        Self {
            chunk_size_words: read_env_usize(lookup, ENV_CHUNK_SIZE, defaults.chunk_size_words, 1),
            overlap_words: read_env_usize(lookup, ENV_CHUNK_OVERLAP, defaults.overlap_words, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub semantic_weight: f32,
    pub keyword_weight: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            keyword_weight: DEFAULT_KEYWORD_WEIGHT,
        }
    }
}

impl RetrievalConfig {
    pub(super) fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            top_k: read_env_usize(lookup, ENV_TOP_K, defaults.top_k, 0),
            semantic_weight: read_env_weight(lookup, ENV_SEMANTIC_WEIGHT, defaults.semantic_weight)?,
            keyword_weight: read_env_weight(lookup, ENV_KEYWORD_WEIGHT, defaults.keyword_weight)?,
        })
    }
}
