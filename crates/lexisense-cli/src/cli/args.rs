use std::path::PathBuf;

use clap::Args;

use super::parsers::{parse_min_one_usize, parse_non_negative_f32};

#[derive(Debug, Args)]
pub struct ChunkArgs {
    /// UTF-8 text file to split.
    pub path: PathBuf,
    /// Word budget per chunk (defaults to `LEXISENSE_CHUNK_SIZE` or 600).
    #[arg(long, value_parser = parse_min_one_usize)]
    pub chunk_size: Option<usize>,
    /// Words of trailing context carried into the next chunk.
    #[arg(long)]
    pub overlap: Option<usize>,
    /// Source type recorded on each chunk. Defaults to the file extension.
    #[arg(long)]
    pub file_type: Option<String>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
    /// Documents to load into the transient session (repeatable).
    #[arg(long = "doc", value_name = "PATH", required = true)]
    pub docs: Vec<PathBuf>,
    #[arg(long, value_parser = parse_min_one_usize)]
    pub top_k: Option<usize>,
    #[arg(long, value_parser = parse_non_negative_f32)]
    pub semantic_weight: Option<f32>,
    #[arg(long, value_parser = parse_non_negative_f32)]
    pub keyword_weight: Option<f32>,
    /// Only rank chunks from this source filename.
    #[arg(long = "file", value_name = "NAME")]
    pub file_filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct FilesArgs {
    #[arg(long = "doc", value_name = "PATH", required = true)]
    pub docs: Vec<PathBuf>,
}
