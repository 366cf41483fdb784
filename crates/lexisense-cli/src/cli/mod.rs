use clap::{Parser, Subcommand};

mod args;
mod parsers;


pub use args::{ChunkArgs, FilesArgs, SearchArgs};

#[derive(Debug, Parser)]
#[command(name = "lexisense")]
#[command(about = "Chunk documents and run hybrid retrieval over them", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split one document and print its chunks.
    Chunk(ChunkArgs),
    /// Load documents into a transient session and rank chunks for a query.
    Search(SearchArgs),
    /// Load documents and print per-file summaries.
    Files(FilesArgs),
}
