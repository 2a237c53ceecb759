//! Startup shared by the binaries: `.env` loading, logging and settings.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use syllabus_core::config::{Config, Settings};
use syllabus_core::types::UpsertOutcome;
use syllabus_rag::IngestReport;

/// Log to stderr so answers on stdout stay clean. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Read `.env` if present, then build and validate settings.
pub fn load_settings() -> anyhow::Result<(Settings, PathBuf)> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
    let settings = Config::load().and_then(|c| c.settings()).context("Error loading config")?;
    let base = std::env::current_dir().context("cannot determine working directory")?;
    Ok((settings, base))
}

/// One line describing what startup ingestion did.
pub fn ingest_summary(report: &IngestReport) -> String {
    match report.outcome {
        Some(UpsertOutcome::Indexed { chunks }) => {
            format!("Loaded {} documents ({chunks} chunks indexed)", report.documents)
        }
        Some(UpsertOutcome::Skipped { existing }) => {
            format!("Documents already in DB ({existing} chunks); skipping indexing.")
        }
        Some(UpsertOutcome::Empty) => "Documents produced no text to index.".to_string(),
        None => "No documents found to process.".to_string(),
    }
}
