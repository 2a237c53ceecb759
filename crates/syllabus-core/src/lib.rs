//! Shared building blocks for the syllabus assistant: domain types, provider
//! traits, the error taxonomy, configuration, chunking and corpus loading.

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
