//! Retrieval-augmented answering over the syllabus collection.
//!
//! [`RagAssistant`] retrieves the nearest chunks for a question, renders the
//! counselor prompt and hands it to a [`Generator`](syllabus_core::traits::Generator).
//! [`Pipeline`] wires the configured providers together and runs ingestion;
//! [`session::serve`] is the line-oriented question loop.

pub mod assistant;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod session;

pub use assistant::RagAssistant;
pub use llm::{build_generator, OpenAiCompatGenerator};
pub use pipeline::{ingest_corpus, IngestReport, Pipeline};
pub use prompt::{build_context, render_prompt, NO_CONTEXT_PLACEHOLDER};
