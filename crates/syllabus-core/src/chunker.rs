//! Recursive character splitter tuned for syllabus documents.
//!
//! Text is split on the first separator (in priority order) that occurs in
//! it; separators stay attached to the start of the piece that follows them.
//! Pieces shorter than `chunk_size` are merged greedily, and each emitted chunk
//! hands its trailing `chunk_overlap` characters (whole pieces only) to the
//! next one. Pieces that are still too large are split again with the
//! remaining, finer separators; `""` splits into single characters.

use std::collections::VecDeque;

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::{chunk_id, Document, DocumentChunk};

pub const SYLLABUS_SEPARATORS: [&str; 6] = ["\nUNIT ", "\nCourse Title", "\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: SYLLABUS_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        let splitter = Self::new(settings.chunk_size, settings.chunk_overlap)?;
        Ok(match &settings.separators {
            Some(seps) if !seps.is_empty() => splitter.with_separators(seps.clone()),
            _ => splitter,
        })
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map_or("", String::as_str);
        let mut finer: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if finer.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_with(&piece, finer));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;
        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_window(&window) {
                    out.push(chunk);
                }
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece.as_str(), len));
            total += len;
        }
        if let Some(chunk) = join_window(&window) {
            out.push(chunk);
        }
        out
    }
}

/// Split with the default syllabus separators.
pub fn chunk(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>> {
    Ok(RecursiveSplitter::new(chunk_size, chunk_overlap)?.split(text))
}

/// Chunk every document, numbering chunks `doc_{i}_chunk_{j}` in input order.
pub fn chunk_documents(documents: &[Document], splitter: &RecursiveSplitter) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();
    for (doc_index, doc) in documents.iter().enumerate() {
        for (chunk_index, content) in splitter.split(&doc.content).into_iter().enumerate() {
            chunks.push(DocumentChunk {
                id: chunk_id(doc_index, chunk_index),
                doc_index,
                chunk_index,
                content,
                metadata: doc.metadata.clone(),
            });
        }
    }
    chunks
}

fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut parts = text.split(separator);
    let mut out = Vec::new();
    if let Some(first) = parts.next() {
        out.push(first.to_string());
    }
    out.extend(parts.map(|p| format!("{separator}{p}")));
    out.retain(|p| !p.is_empty());
    out
}

fn join_window(window: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn char_len(s: &str) -> usize { s.chars().count() }
