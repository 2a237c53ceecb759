use tracing::{debug, info};

use syllabus_core::chunker::{chunk_documents, RecursiveSplitter};
use syllabus_core::traits::{Generator, VectorIndex};
use syllabus_core::types::{Document, QueryResult, UpsertOutcome};
use syllabus_core::Result;

use crate::prompt::{build_context, render_prompt};

pub const DEFAULT_TOP_N: usize = 3;

/// Retrieve-then-generate over one collection.
pub struct RagAssistant<I: VectorIndex, G: Generator> {
    index: I,
    generator: G,
    splitter: RecursiveSplitter,
    top_n: usize,
}

impl<I: VectorIndex, G: Generator> RagAssistant<I, G> {
    pub fn new(index: I, generator: G, splitter: RecursiveSplitter) -> Self {
        Self { index, generator, splitter, top_n: DEFAULT_TOP_N }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn index(&self) -> &I { &self.index }
    pub fn splitter(&self) -> &RecursiveSplitter { &self.splitter }

    /// Chunk and index documents. A populated collection is left untouched.
    pub fn add_documents(&self, documents: &[Document]) -> Result<UpsertOutcome> {
        let chunks = chunk_documents(documents, &self.splitter);
        info!(documents = documents.len(), chunks = chunks.len(), "split documents");
        self.index.upsert(&chunks)
    }

    pub fn retrieve(&self, question: &str, top_n: usize) -> Result<QueryResult> {
        self.index.query(question, top_n)
    }

    pub fn answer(&self, question: &str) -> Result<String> {
        self.answer_with(question, self.top_n)
    }

    pub fn answer_with(&self, question: &str, top_n: usize) -> Result<String> {
        let hits = self.retrieve(question, top_n)?;
        debug!(hits = hits.len(), ids = ?hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), "retrieved context");
        let prompt = render_prompt(&build_context(&hits), question);
        self.generator.generate(&prompt)
    }
}
