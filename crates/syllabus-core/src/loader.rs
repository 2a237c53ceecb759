//! Corpus loading: walks a directory and extracts plain text from each
//! supported file. One [`Document`] per file; per-file failures are logged
//! and skipped.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::Document;

const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    /// Files that could not be read, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Files that were read but held no text.
    pub empty: Vec<PathBuf>,
}

/// Load every supported file under `data_dir`, in path order.
///
/// A missing directory is created and yields no documents.
pub fn load_documents(data_dir: &Path) -> Result<LoadReport> {
    if !data_dir.exists() {
        fs::create_dir_all(data_dir).map_err(|e| Error::SourceRead {
            path: data_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        info!(dir = %data_dir.display(), "created missing data directory; place your PDFs there");
        return Ok(LoadReport::default());
    }

    info!(dir = %data_dir.display(), "scanning for documents");
    let (files, unreadable) = list_source_files(data_dir);
    let mut report = LoadReport { skipped: unreadable, ..LoadReport::default() };
    for path in files {
        match read_text(&path) {
            Ok(text) if text.trim().is_empty() => report.empty.push(path),
            Ok(text) => {
                info!(file = %path.display(), chars = text.chars().count(), "read document");
                report.documents.push(Document::new(text, path.to_string_lossy()));
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                report.skipped.push((path, e.to_string()));
            }
        }
    }
    Ok(report)
}

/// Extract text from one file, dispatching on its extension.
pub fn read_text(path: &Path) -> Result<String> {
    let source_err = |reason: String| Error::SourceRead { path: path.display().to_string(), reason };
    match extension(path).as_deref() {
        Some("pdf") => {
            // pdf-extract can panic on malformed input; treat that like any other read failure.
            let extracted = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path)))
                .map_err(|_| source_err("pdf parser panicked".into()))?;
            extracted.map_err(|e| source_err(e.to_string()))
        }
        Some("txt") => {
            let bytes = fs::read(path).map_err(|e| source_err(e.to_string()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Err(source_err("unsupported file type".into())),
    }
}

/// Supported files under `root`, sorted. Entries the walk cannot read are
/// returned separately so they are reported like any other skipped source.
fn list_source_files(root: &Path) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
    let mut files = Vec::new();
    let mut unreadable = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        match entry {
            Ok(e) if e.file_type().is_file() => {
                let path = e.into_path();
                if extension(&path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str())) {
                    files.push(path);
                }
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                warn!(path = %path.display(), error = %e, "skipping unreadable directory entry");
                unreadable.push((path, e.to_string()));
            }
        }
    }
    files.sort();
    (files, unreadable)
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase)
}
