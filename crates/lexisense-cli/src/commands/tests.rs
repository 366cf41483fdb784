use std::fs;
use std::path::{Path, PathBuf};

use lexisense_core::embedding::NullEmbedder;
use lexisense_core::{AppConfig, SessionStore};
use tempfile::tempdir;

use super::support::{infer_file_type, ingest_documents, source_filename};
use super::{chunker_for, rank_options_for};
use crate::cli::{ChunkArgs, SearchArgs};

#[test]
fn file_type_comes_from_lowercased_extension() {
    assert_eq!(infer_file_type(Path::new("Report.PDF")), "pdf");
    assert_eq!(infer_file_type(Path::new("notes")), "txt");
    assert_eq!(source_filename(Path::new("/tmp/deck/slides.pptx")), "slides.pptx");
}

#[test]
fn chunk_flags_override_configured_budgets() {
    let config = AppConfig::default();
    let args = ChunkArgs {
        path: PathBuf::from("a.txt"),
        chunk_size: Some(50),
        overlap: None,
        file_type: None,
    };
    let chunker = chunker_for(&config, &args);
    assert_eq!(chunker.chunk_size_words(), 50);
    assert_eq!(chunker.overlap_words(), config.chunking.overlap_words);
}

#[test]
fn search_flags_override_configured_ranking() {
    let config = AppConfig::default();
    let args = SearchArgs {
        query: "q".to_string(),
        docs: vec![PathBuf::from("a.txt")],
        top_k: Some(2),
        semantic_weight: None,
        keyword_weight: Some(1.0),
        file_filter: Some("a.txt".to_string()),
    };
    let options = rank_options_for(&config, &args);
    assert_eq!(options.top_k, 2);
    assert!((options.semantic_weight - config.retrieval.semantic_weight).abs() < f32::EPSILON);
    assert!((options.keyword_weight - 1.0).abs() < f32::EPSILON);
    assert_eq!(options.file_filter.as_deref(), Some("a.txt"));
}

#[test]
fn ingest_documents_labels_chunks_by_file_name() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("q3.md");
    fs::write(&path, "Revenue increased.\n\nCosts were flat.").expect("write doc");

    let store = SessionStore::with_provider(std::sync::Arc::new(NullEmbedder::new(4)));
    let added = ingest_documents(&store, &[path]).expect("ingest");
    assert_eq!(added, 1);
    let files = store.file_summaries().expect("summaries");
    assert_eq!(files[0].filename, "q3.md");
    assert_eq!(files[0].file_type, "md");
}

#[test]
fn ingest_documents_reports_missing_files() {
    let temp = tempdir().expect("tempdir");
    let store = SessionStore::with_provider(std::sync::Arc::new(NullEmbedder::new(4)));
    let err = ingest_documents(&store, &[temp.path().join("missing.txt")]).expect_err("missing");
    assert!(err.to_string().contains("missing.txt"));
}
