use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::RetrievalConfig;
use crate::text::word_count;

/// A bounded slice of one document's text.
///
/// Only the chunker constructs chunks; after that they are read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    content: String,
    chunk_index: usize,
    source_filename: String,
    source_file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_info: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
}

impl Chunk {
    pub(crate) fn new(
        content: String,
        chunk_index: usize,
        source_filename: &str,
        source_file_type: &str,
        page_info: Option<String>,
    ) -> Self {
        Self {
            content,
            chunk_index,
            source_filename: source_filename.to_string(),
            source_file_type: source_file_type.to_string(),
            page_info,
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches an opaque metadata entry before the chunk is handed to a store.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    #[must_use]
    pub fn source_filename(&self) -> &str {
        &self.source_filename
    }

    #[must_use]
    pub fn source_file_type(&self) -> &str {
        &self.source_file_type
    }

    #[must_use]
    pub fn page_info(&self) -> Option<&str> {
        self.page_info.as_deref()
    }

    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankOptions {
    pub top_k: usize,
    pub semantic_weight: f32,
    pub keyword_weight: f32,
    /// Restricts results to chunks from this source filename.
    pub file_filter: Option<String>,
}

impl RankOptions {
    #[must_use]
    pub fn with_file_filter(mut self, filename: impl Into<String>) -> Self {
        self.file_filter = Some(filename.into());
        self
    }
}

impl Default for RankOptions {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for RankOptions {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            semantic_weight: config.semantic_weight,
            keyword_weight: config.keyword_weight,
            file_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub filename: String,
    pub file_type: String,
    pub chunk_count: usize,
    pub word_count: usize,
}

/// Sizes of the three structures a session store keeps in lock-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub chunks: usize,
    pub dense_rows: usize,
    pub sparse_corpus_size: usize,
}

impl StoreStats {
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.chunks == self.dense_rows && self.chunks == self.sparse_corpus_size
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub total_chunks: usize,
    pub files: Vec<FileSummary>,
}
