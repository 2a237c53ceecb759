//! Domain types shared by the chunker, the vector index and the assistant.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// Metadata key holding the path of the file a document was read from.
pub const SOURCE_KEY: &str = "source";

/// Plain text extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Meta::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self { content: content.into(), metadata }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A chunk of a source document, ready to be embedded and indexed.
///
/// - `id`: `doc_{doc_index}_chunk_{chunk_index}`, unique across the index
/// - `content`: the text payload of the chunk
/// - `metadata`: copied from the parent document
/// - `doc_index`/`chunk_index`: position within the ingested batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_index: usize,
    pub chunk_index: usize,
    pub content: String,
    pub metadata: Meta,
}

pub fn chunk_id(doc_index: usize, chunk_index: usize) -> ChunkId {
    format!("doc_{doc_index}_chunk_{chunk_index}")
}

/// One nearest-neighbour hit. Lower `distance` means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Meta,
    pub distance: f32,
}

/// Hits ordered by ascending distance, ties broken by ascending id.
pub type QueryResult = Vec<RetrievedChunk>;

/// What an upsert call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Nothing to write.
    Empty,
    /// The collection already held rows; nothing was embedded or written.
    Skipped { existing: usize },
    /// Chunks were embedded and written.
    Indexed { chunks: usize },
}
