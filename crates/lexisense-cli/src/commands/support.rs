use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lexisense_core::SessionStore;

pub(super) const DEFAULT_FILE_TYPE: &str = "txt";

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Source label recorded on chunks: the bare file name.
pub(super) fn source_filename(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Lowercased extension, or `txt` when there is none.
pub(super) fn infer_file_type(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string())
}

pub(super) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {} as UTF-8 text", path.display()))
}

/// Reads, chunks and adds every document; returns the number of chunks added.
pub(super) fn ingest_documents(store: &SessionStore, paths: &[PathBuf]) -> Result<usize> {
    let mut added = 0;
    for path in paths {
        let text = read_text(path)?;
        added += store
            .add_document(&text, &source_filename(path), &infer_file_type(path))
            .with_context(|| format!("failed to add {}", path.display()))?;
    }
    Ok(added)
}
