use anyhow::{Context, Result};
use lexisense_core::{
    AppConfig, Chunker, FileSummary, RankOptions, RankedChunk, SessionStore, truncate_text,
};
use serde::Serialize;
use tracing::info;

use crate::cli::{ChunkArgs, Commands, FilesArgs, SearchArgs};

mod support;

#[cfg(test)]
mod tests;

use self::support::{infer_file_type, ingest_documents, print_json, read_text, source_filename};

const SNIPPET_CHARS: usize = 240;

#[derive(Debug, Serialize)]
struct SearchHit {
    filename: String,
    chunk_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_info: Option<String>,
    score: f32,
    snippet: String,
}

impl From<&RankedChunk> for SearchHit {
    fn from(hit: &RankedChunk) -> Self {
        Self {
            filename: hit.chunk.source_filename().to_string(),
            chunk_index: hit.chunk.chunk_index(),
            page_info: hit.chunk.page_info().map(ToString::to_string),
            score: hit.score,
            snippet: truncate_text(hit.chunk.content(), SNIPPET_CHARS),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: String,
    provider: String,
    results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
struct FilesOutput {
    total_chunks: usize,
    files: Vec<FileSummary>,
}

pub(crate) fn run(command: Commands) -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    match command {
        Commands::Chunk(args) => run_chunk(&config, &args),
        Commands::Search(args) => run_search(&config, &args),
        Commands::Files(args) => run_files(&config, &args),
    }
}

fn run_chunk(config: &AppConfig, args: &ChunkArgs) -> Result<()> {
    let chunker = chunker_for(config, args);
    let text = read_text(&args.path)?;
    let file_type = args
        .file_type
        .clone()
        .unwrap_or_else(|| infer_file_type(&args.path));
    let chunks = chunker.chunk(&text, &source_filename(&args.path), &file_type);
    print_json(&chunks)
}

fn run_search(config: &AppConfig, args: &SearchArgs) -> Result<()> {
    let store = SessionStore::from_config(config).context("failed to build session store")?;
    let added = ingest_documents(&store, &args.docs)?;
    info!(documents = args.docs.len(), chunks = added, "documents loaded");

    let options = rank_options_for(config, args);
    let ranked = store.rank(&args.query, &options)?;
    print_json(&SearchOutput {
        query: args.query.clone(),
        provider: store.provider_name().to_string(),
        results: ranked.iter().map(SearchHit::from).collect(),
    })
}

fn run_files(config: &AppConfig, args: &FilesArgs) -> Result<()> {
    let store = SessionStore::from_config(config).context("failed to build session store")?;
    ingest_documents(&store, &args.docs)?;
    print_json(&FilesOutput {
        total_chunks: store.total_chunks()?,
        files: store.file_summaries()?,
    })
}

fn chunker_for(config: &AppConfig, args: &ChunkArgs) -> Chunker {
    Chunker::new(
        args.chunk_size.unwrap_or(config.chunking.chunk_size_words),
        args.overlap.unwrap_or(config.chunking.overlap_words),
    )
}

fn rank_options_for(config: &AppConfig, args: &SearchArgs) -> RankOptions {
    let mut options = RankOptions::from(&config.retrieval);
    if let Some(top_k) = args.top_k {
        options.top_k = top_k;
    }
    if let Some(weight) = args.semantic_weight {
        options.semantic_weight = weight;
    }
    if let Some(weight) = args.keyword_weight {
        options.keyword_weight = weight;
    }
    options.file_filter = args.file_filter.clone();
    options
}
