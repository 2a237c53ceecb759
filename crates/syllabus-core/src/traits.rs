//! Seams between the pipeline and its capability providers.

use crate::error::Result;
use crate::types::{DocumentChunk, QueryResult, UpsertOutcome};

/// Maps texts to fixed-length vectors. Must be deterministic for a given
/// `model_id`, and the same embedder must serve both ingest and query.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model, e.g. `bert:sentence-transformers/all-MiniLM-L6-v2`.
    fn model_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Produces text for a fully rendered prompt.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Persistent chunk store with nearest-neighbour lookup.
///
/// `query` and `count` take `&self` and implementations are `Sync`, so any
/// number of readers may share one index once ingestion has finished.
pub trait VectorIndex: Send + Sync {
    fn upsert(&self, chunks: &[DocumentChunk]) -> Result<UpsertOutcome>;
    fn query(&self, text: &str, top_n: usize) -> Result<QueryResult>;
    fn count(&self) -> Result<usize>;
    /// Remove every row from the collection.
    fn reset(&self) -> Result<()>;
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn model_id(&self) -> &str { (**self).model_id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { (**self).embed_batch(texts) }
}

impl<T: Generator + ?Sized> Generator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String> { (**self).generate(prompt) }
}

impl<T: VectorIndex + ?Sized> VectorIndex for Box<T> {
    fn upsert(&self, chunks: &[DocumentChunk]) -> Result<UpsertOutcome> { (**self).upsert(chunks) }
    fn query(&self, text: &str, top_n: usize) -> Result<QueryResult> { (**self).query(text, top_n) }
    fn count(&self) -> Result<usize> { (**self).count() }
    fn reset(&self) -> Result<()> { (**self).reset() }
}
