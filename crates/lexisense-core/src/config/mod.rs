use crate::embedding::{
    DEFAULT_EMBEDDER_DIM, DEFAULT_EMBEDDER_ENDPOINT, DEFAULT_EMBEDDER_MAX_ATTEMPTS,
    DEFAULT_EMBEDDER_RETRY_BACKOFF_MS, DEFAULT_EMBEDDER_TIMEOUT_MS, EMBEDDER_DIM_ENV,
    EMBEDDER_ENDPOINT_ENV, EMBEDDER_ENV, EMBEDDER_LEGACY_TOKEN_ENV, EMBEDDER_MAX_ATTEMPTS_ENV,
    EMBEDDER_RETRY_BACKOFF_MS_ENV, EMBEDDER_TIMEOUT_MS_ENV, EMBEDDER_TOKEN_ENV, EmbedderConfig,
    EmbedderKind,
};
use crate::error::Result;

mod env;
mod retrieval;
mod session;

use self::env::{EnvLookup, read_env_u32, read_env_u64, read_env_usize, read_non_empty_env};

pub use retrieval::{
    ChunkingConfig, DEFAULT_CHUNK_OVERLAP_WORDS, DEFAULT_CHUNK_SIZE_WORDS, DEFAULT_KEYWORD_WEIGHT,
    DEFAULT_SEMANTIC_WEIGHT, DEFAULT_TOP_K, RetrievalConfig,
};
pub use session::{DEFAULT_SESSION_IDLE_TIMEOUT_MINUTES, SessionConfig};

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbedderConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            chunking: ChunkingConfig::from_lookup(lookup),
            retrieval: RetrievalConfig::from_lookup(lookup)?,
            embedding: EmbedderConfig::from_lookup(lookup)?,
            session: SessionConfig::from_lookup(lookup),
        })
    }
}

impl EmbedderConfig {
    fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let api_token = read_non_empty_env(lookup, EMBEDDER_TOKEN_ENV)
            .or_else(|| read_non_empty_env(lookup, EMBEDDER_LEGACY_TOKEN_ENV));
        let kind = EmbedderKind::resolve(
            read_non_empty_env(lookup, EMBEDDER_ENV).as_deref(),
            api_token.is_some(),
        )?;
        Ok(Self {
            kind,
            endpoint: read_non_empty_env(lookup, EMBEDDER_ENDPOINT_ENV)
                .unwrap_or_else(|| DEFAULT_EMBEDDER_ENDPOINT.to_string()),
            api_token,
            dimension: read_env_usize(lookup, EMBEDDER_DIM_ENV, DEFAULT_EMBEDDER_DIM, 1),
            timeout_ms: read_env_u64(lookup, EMBEDDER_TIMEOUT_MS_ENV, DEFAULT_EMBEDDER_TIMEOUT_MS),
            max_attempts: read_env_u32(
                lookup,
                EMBEDDER_MAX_ATTEMPTS_ENV,
                DEFAULT_EMBEDDER_MAX_ATTEMPTS,
                1,
            ),
            retry_backoff_ms: read_env_u64(
                lookup,
                EMBEDDER_RETRY_BACKOFF_MS_ENV,
                DEFAULT_EMBEDDER_RETRY_BACKOFF_MS,
            ),
        })
    }
}
