// Public fallible APIs in this crate share one concrete error contract (`LexiError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod chunker;
pub mod config;
pub mod dense;
pub mod embedding;
pub mod error;
pub mod models;
pub mod ranker;
pub mod registry;
pub mod sparse;
pub mod store;
pub(crate) mod text;

pub use chunker::Chunker;
pub use config::AppConfig;
pub use embedding::{EmbeddingProvider, build_embedder};
pub use error::{LexiError, Result};
pub use models::{Chunk, FileSummary, RankOptions, RankedChunk, SessionInfo, StoreStats};
pub use registry::{ExpiryPolicy, IdleTimeout, NeverExpire, SessionRegistry, StoreFactory};
pub use store::SessionStore;
pub use text::truncate_text;
