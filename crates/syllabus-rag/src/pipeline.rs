//! Startup and ingestion.
//!
//! `initialize` reaches the ready state or fails; the credential is checked
//! before any model is loaded. `ingest` runs at most once per process,
//! before serving starts. [`ingest_corpus`] indexes without a generator, for
//! tools that never answer questions.

use std::path::{Path, PathBuf};

use tracing::info;

use syllabus_core::chunker::{chunk_documents, RecursiveSplitter};
use syllabus_core::config::Settings;
use syllabus_core::loader::load_documents;
use syllabus_core::traits::{Embedder, Generator, VectorIndex};
use syllabus_core::types::UpsertOutcome;
use syllabus_core::Result;
use syllabus_embed::get_default_embedder;
use syllabus_vector::LanceVectorIndex;

use crate::assistant::RagAssistant;
use crate::llm::build_generator;

pub type DefaultIndex = LanceVectorIndex<Box<dyn Embedder>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub skipped_files: usize,
    /// `None` when no documents were found.
    pub outcome: Option<UpsertOutcome>,
}

pub struct Pipeline<I: VectorIndex, G: Generator> {
    assistant: RagAssistant<I, G>,
    data_dir: PathBuf,
    force_reindex: bool,
}

impl Pipeline<DefaultIndex, Box<dyn Generator>> {
    /// Build generator, embedder and index from settings. Relative paths
    /// resolve against `base`.
    pub fn initialize(settings: &Settings, base: &Path) -> Result<Self> {
        let generator = build_generator(&settings.llm)?;
        let index = open_index(settings, base)?;
        let splitter = RecursiveSplitter::from_settings(&settings.chunking)?;
        let assistant = RagAssistant::new(index, generator, splitter).with_top_n(settings.retrieval.top_n);
        info!("RAG assistant initialized");
        Ok(Self::from_parts(assistant, settings.data_dir(base), settings.index.force_reindex))
    }
}

impl<I: VectorIndex, G: Generator> Pipeline<I, G> {
    pub fn from_parts(assistant: RagAssistant<I, G>, data_dir: PathBuf, force_reindex: bool) -> Self {
        Self { assistant, data_dir, force_reindex }
    }

    pub fn set_force_reindex(&mut self, force: bool) { self.force_reindex = force; }
    pub fn assistant(&self) -> &RagAssistant<I, G> { &self.assistant }
    pub fn data_dir(&self) -> &Path { &self.data_dir }

    /// Load the corpus and index it. Finding no documents is not an error.
    pub fn ingest(&self) -> Result<IngestReport> {
        ingest_into(self.assistant.index(), self.assistant.splitter(), &self.data_dir, self.force_reindex)
    }
}

/// Open the configured collection with the configured embedder.
pub fn open_index(settings: &Settings, base: &Path) -> Result<DefaultIndex> {
    let embedder = get_default_embedder(&settings.embedding)?;
    Ok(LanceVectorIndex::open(&settings.db_dir(base), &settings.index.collection, embedder)?
        .with_batch_size(settings.index.batch_size)
        .with_progress(true))
}

/// Index the configured corpus without touching the generation provider.
pub fn ingest_corpus(settings: &Settings, base: &Path) -> Result<IngestReport> {
    let index = open_index(settings, base)?;
    let splitter = RecursiveSplitter::from_settings(&settings.chunking)?;
    ingest_into(&index, &splitter, &settings.data_dir(base), settings.index.force_reindex)
}

pub fn ingest_into<I: VectorIndex>(
    index: &I,
    splitter: &RecursiveSplitter,
    data_dir: &Path,
    force_reindex: bool,
) -> Result<IngestReport> {
    let loaded = load_documents(data_dir)?;
    let mut report = IngestReport {
        documents: loaded.documents.len(),
        skipped_files: loaded.skipped.len(),
        outcome: None,
    };
    if loaded.documents.is_empty() {
        info!(dir = %data_dir.display(), "no documents found to process");
        return Ok(report);
    }
    if force_reindex {
        index.reset()?;
    }
    let chunks = chunk_documents(&loaded.documents, splitter);
    info!(documents = loaded.documents.len(), chunks = chunks.len(), "split documents");
    report.outcome = Some(index.upsert(&chunks)?);
    Ok(report)
}
