//! Embedding providers behind one batch interface.
//!
//! Providers are allowed to fail. The dense index turns every failure into
//! zero vectors, so nothing here ever needs to succeed for ranking to work.

use std::sync::Arc;

use crate::error::{LexiError, Result};

mod hash;
mod http;

pub use hash::HashEmbedder;
pub use http::{AttemptOutcome, HttpEmbedder, RetryPolicy, parse_embedding_response, run_with_retry};

pub const EMBEDDER_ENV: &str = "LEXISENSE_EMBEDDER";
pub const EMBEDDER_ENDPOINT_ENV: &str = "LEXISENSE_EMBEDDER_ENDPOINT";
pub const EMBEDDER_TOKEN_ENV: &str = "LEXISENSE_EMBEDDER_TOKEN";
pub const EMBEDDER_LEGACY_TOKEN_ENV: &str = "HUGGINGFACE_TOKEN";
pub const EMBEDDER_DIM_ENV: &str = "LEXISENSE_EMBEDDER_DIM";
pub const EMBEDDER_TIMEOUT_MS_ENV: &str = "LEXISENSE_EMBEDDER_TIMEOUT_MS";
pub const EMBEDDER_MAX_ATTEMPTS_ENV: &str = "LEXISENSE_EMBEDDER_MAX_ATTEMPTS";
pub const EMBEDDER_RETRY_BACKOFF_MS_ENV: &str = "LEXISENSE_EMBEDDER_RETRY_BACKOFF_MS";

pub const DEFAULT_EMBEDDER_ENDPOINT: &str = "https://api-inference.huggingface.co/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDER_DIM: usize = 384;
pub const DEFAULT_EMBEDDER_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_EMBEDDER_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_EMBEDDER_RETRY_BACKOFF_MS: u64 = 1_500;

/// Batch embedding capability: `texts.len()` rows of `dimension()` floats.
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmbedderKind {
    #[default]
    None,
    Hash,
    Http,
}

impl EmbedderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hash => "hash",
            Self::Http => "http",
        }
    }

    /// An unset kind means "remote if a token is configured, otherwise none".
    pub fn resolve(raw: Option<&str>, has_token: bool) -> Result<Self> {
        let normalized = raw.map(|value| value.trim().to_ascii_lowercase());
        match normalized.as_deref() {
            None | Some("") => Ok(if has_token { Self::Http } else { Self::None }),
            Some("none" | "off" | "disabled") => Ok(Self::None),
            Some("hash" | "deterministic") => Ok(Self::Hash),
            Some("http" | "huggingface" | "remote") => Ok(Self::Http),
            Some(other) => Err(LexiError::Validation(format!(
                "invalid {EMBEDDER_ENV}: {other} (expected none|hash|http)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedderConfig {
    pub kind: EmbedderKind,
    pub endpoint: String,
    pub api_token: Option<String>,
    pub dimension: usize,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::None,
            endpoint: DEFAULT_EMBEDDER_ENDPOINT.to_string(),
            api_token: None,
            dimension: DEFAULT_EMBEDDER_DIM,
            timeout_ms: DEFAULT_EMBEDDER_TIMEOUT_MS,
            max_attempts: DEFAULT_EMBEDDER_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_EMBEDDER_RETRY_BACKOFF_MS,
        }
    }
}

/// Stand-in for a missing provider; every call reports it is unconfigured.
#[derive(Debug, Clone, Copy)]
pub struct NullEmbedder {
    dimension: usize,
}

impl NullEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingProvider for NullEmbedder {
    fn name(&self) -> &str {
        "none"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Err(LexiError::EmbedderNotConfigured)
    }
}

pub fn build_embedder(config: &EmbedderConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.kind {
        EmbedderKind::None => Arc::new(NullEmbedder::new(config.dimension)),
        EmbedderKind::Hash => Arc::new(HashEmbedder::new(config.dimension)),
        EmbedderKind::Http => Arc::new(HttpEmbedder::new(config)?),
    };
    Ok(provider)
}
