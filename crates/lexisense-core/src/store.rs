use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::chunker::Chunker;
use crate::config::{AppConfig, RetrievalConfig};
use crate::dense::{DenseIndex, embed_or_zeros};
use crate::embedding::{EmbeddingProvider, build_embedder};
use crate::error::{LexiError, Result};
use crate::models::{Chunk, FileSummary, RankOptions, RankedChunk, StoreStats};
use crate::ranker::fuse_scores;
use crate::sparse::Bm25Index;

/// The three structures that must always describe the same corpus.
#[derive(Debug)]
struct StoreState {
    chunks: Vec<Chunk>,
    sparse: Bm25Index,
    dense: DenseIndex,
}

impl StoreState {
    fn new(dimension: usize) -> Self {
        Self {
            chunks: Vec::new(),
            sparse: Bm25Index::default(),
            dense: DenseIndex::new(dimension),
        }
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            chunks: self.chunks.len(),
            dense_rows: self.dense.len(),
            sparse_corpus_size: self.sparse.corpus_size(),
        }
    }
}

/// Chunks plus sparse and dense indices for one isolated session.
///
/// Readers and writers share one lock, so a reader never sees the three
/// structures at different sizes. Embedding calls happen before the lock is
/// taken.
pub struct SessionStore {
    provider: Arc<dyn EmbeddingProvider>,
    chunker: Chunker,
    defaults: RetrievalConfig,
    state: RwLock<StoreState>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("provider", &self.provider.name())
            .field("chunker", &self.chunker)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &AppConfig) -> Self {
        let dimension = provider.dimension();
        Self {
            provider,
            chunker: Chunker::from(&config.chunking),
            defaults: config.retrieval,
            state: RwLock::new(StoreState::new(dimension)),
        }
    }

    /// Builds the configured embedding provider and an empty store around it.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = build_embedder(&config.embedding)?;
        Ok(Self::new(provider, config))
    }

    #[must_use]
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(provider, &AppConfig::default())
    }

    #[must_use]
    pub const fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Appends `chunks`, refits the sparse index over the whole corpus and
    /// returns how many chunks were added.
    pub fn add(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts = chunks
            .iter()
            .map(|chunk| chunk.content().to_string())
            .collect::<Vec<_>>();
        let vectors = embed_or_zeros(self.provider.as_ref(), &texts);
        let added = chunks.len();

        let mut state = self.write_state()?;
        let state = &mut *state;
        state.chunks.extend(chunks);
        state.dense.append(vectors);
        let corpus = state.chunks.iter().map(Chunk::content).collect::<Vec<_>>();
        state.sparse = Bm25Index::fit(&corpus);
        debug_assert!(state.stats().is_consistent(), "store structures out of step");

        debug!(
            added,
            total = state.chunks.len(),
            provider = self.provider.name(),
            "session store updated"
        );
        Ok(added)
    }

    /// Chunks `text` with the store's chunking settings and adds the result.
    pub fn add_document(&self, text: &str, filename: &str, file_type: &str) -> Result<usize> {
        self.add(self.chunker.chunk(text, filename, file_type))
    }

    /// Ranks stored chunks against `query`.
    ///
    /// A blank query, `top_k == 0` or an empty store give an empty result
    /// without contacting the embedding provider.
    pub fn rank(&self, query: &str, options: &RankOptions) -> Result<Vec<RankedChunk>> {
        if query.trim().is_empty() || options.top_k == 0 || self.read_state()?.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = if options.semantic_weight > 0.0 {
            embed_or_zeros(self.provider.as_ref(), &[query.to_string()])
                .pop()
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let state = self.read_state()?;
        let dense = state.dense.similarity(&query_vector);
        let sparse = state.sparse.score(query);
        let ranked = fuse_scores(&dense, &sparse, &state.chunks, options)
            .into_iter()
            .map(|(idx, score)| RankedChunk {
                chunk: state.chunks[idx].clone(),
                score,
            })
            .collect::<Vec<_>>();

        debug!(
            results = ranked.len(),
            top_k = options.top_k,
            file_filter = options.file_filter.as_deref(),
            corpus = state.chunks.len(),
            "ranked session chunks"
        );
        Ok(ranked)
    }

    /// `rank` with the store's configured `top_k` and weights.
    pub fn search(&self, query: &str, file_filter: Option<&str>) -> Result<Vec<RankedChunk>> {
        let mut options = RankOptions::from(&self.defaults);
        options.file_filter = file_filter.map(ToString::to_string);
        self.rank(query, &options)
    }

    /// Distinct source filenames in first-insertion order.
    pub fn list_files(&self) -> Result<Vec<String>> {
        Ok(self
            .file_summaries()?
            .into_iter()
            .map(|summary| summary.filename)
            .collect())
    }

    pub fn file_summaries(&self) -> Result<Vec<FileSummary>> {
        let state = self.read_state()?;
        let mut summaries = Vec::<FileSummary>::new();
        for chunk in &state.chunks {
            let words = chunk.word_count();
            if let Some(summary) = summaries
                .iter_mut()
                .find(|summary| summary.filename == chunk.source_filename())
            {
                summary.chunk_count += 1;
                summary.word_count += words;
            } else {
                summaries.push(FileSummary {
                    filename: chunk.source_filename().to_string(),
                    file_type: chunk.source_file_type().to_string(),
                    chunk_count: 1,
                    word_count: words,
                });
            }
        }
        Ok(summaries)
    }

    pub fn chunks_for(&self, filename: &str) -> Result<Vec<Chunk>> {
        Ok(self
            .read_state()?
            .chunks
            .iter()
            .filter(|chunk| chunk.source_filename() == filename)
            .cloned()
            .collect())
    }

    pub fn total_chunks(&self) -> Result<usize> {
        Ok(self.read_state()?.chunks.len())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        Ok(self.read_state()?.stats())
    }

    /// Drops every chunk and both indices.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.write_state()?;
        let dimension = state.dense.dimension();
        *state = StoreState::new(dimension);
        debug!("session store cleared");
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| LexiError::lock_poisoned("session store"))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| LexiError::lock_poisoned("session store"))
    }
}
