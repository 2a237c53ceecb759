//! LanceDB-backed chunk collection.
//!
//! [`LanceVectorIndex`] owns the connection, the embedder used for both ingest
//! and query, and a private tokio runtime so callers stay synchronous. Writes
//! go through [`VectorIndex::upsert`], which only ever fills an empty
//! collection; reads take `&self` and may run from many threads once
//! ingestion has finished.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use syllabus_core::traits::{Embedder, VectorIndex};
use syllabus_core::types::{DocumentChunk, QueryResult, UpsertOutcome};
use syllabus_core::{Error, Result};

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub const DEFAULT_BATCH_SIZE: usize = 64;

pub struct LanceVectorIndex<E: Embedder> {
	rt: Runtime,
	db_dir: PathBuf,
	db: RwLock<Connection>,
	collection: String,
	embedder: E,
	batch_size: usize,
	show_progress: bool,
}

impl<E: Embedder> LanceVectorIndex<E> {
	/// Open (or create) the database directory; the collection table itself is
	/// created lazily by the first write.
	pub fn open(db_dir: &Path, collection: &str, embedder: E) -> Result<Self> {
		let rt = Runtime::new().map_err(index_err)?;
		std::fs::create_dir_all(db_dir).map_err(index_err)?;
		let uri = db_dir.to_string_lossy().to_string();
		let db = rt.block_on(table::open_db(&uri)).map_err(index_err)?;
		info!(db = %uri, collection, embedder = embedder.model_id(), "vector index opened");
		Ok(Self {
			rt,
			db_dir: db_dir.to_path_buf(),
			db: RwLock::new(db),
			collection: collection.to_string(),
			embedder,
			batch_size: DEFAULT_BATCH_SIZE,
			show_progress: false,
		})
	}

	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.batch_size = batch_size.max(1);
		self
	}

	/// Draw an indicatif bar while embedding batches.
	pub fn with_progress(mut self, show: bool) -> Self {
		self.show_progress = show;
		self
	}

	fn conn(&self) -> Connection {
		self.db.read().unwrap_or_else(PoisonError::into_inner).clone()
	}

	fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let vectors = self.embedder.embed_batch(texts)?;
		if vectors.len() != texts.len() {
			return Err(Error::Embedding(format!("embedder returned {} vectors for {} texts", vectors.len(), texts.len())));
		}
		Ok(vectors)
	}

	fn write_batches(&self, chunks: &[DocumentChunk], dim: usize) -> Result<()> {
		let db = self.conn();
		let pb = self.progress_bar(chunks.len());
		for batch in chunks.chunks(self.batch_size) {
			let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
			let vectors = self.embed(&texts)?;
			let record_batch = writer::chunks_to_record_batch(batch, &vectors, dim).map_err(index_err)?;
			self.rt.block_on(writer::insert_batch(&db, &self.collection, record_batch)).map_err(index_err)?;
			pb.inc(batch.len() as u64);
			debug!(written = batch.len(), "indexed batch");
		}
		pb.finish_with_message("indexed");
		Ok(())
	}

	fn progress_bar(&self, len: usize) -> ProgressBar {
		if !self.show_progress { return ProgressBar::hidden(); }
		let pb = ProgressBar::new(len as u64);
		if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
			pb.set_style(style.progress_chars("#>-"));
		}
		pb
	}
}

impl<E: Embedder> VectorIndex for LanceVectorIndex<E> {
	fn upsert(&self, chunks: &[DocumentChunk]) -> Result<UpsertOutcome> {
		if chunks.is_empty() {
			info!("no content to add");
			return Ok(UpsertOutcome::Empty);
		}
		let existing = self.count()?;
		if existing > 0 {
			info!(existing, collection = %self.collection, "collection already populated; skipping re-embedding");
			return Ok(UpsertOutcome::Skipped { existing });
		}
		let dim = self.embedder.dim();
		if let Some(table_dim) = self.rt.block_on(table::table_vector_dim(&self.conn(), &self.collection)).map_err(index_err)? {
			if table_dim != dim {
				return Err(Error::Index(format!(
					"collection '{}' stores {table_dim}-d vectors but embedder {} produces {dim}-d; reset the collection",
					self.collection, self.embedder.model_id()
				)));
			}
		}

		info!(chunks = chunks.len(), collection = %self.collection, "creating embeddings");
		if let Err(e) = self.write_batches(chunks, dim) {
			// The gate only admits an empty collection, so a partial write is rolled back to empty.
			warn!(error = %e, collection = %self.collection, "indexing failed; discarding partial collection");
			if let Err(reset_err) = self.reset() {
				error!(error = %reset_err, collection = %self.collection, "failed to discard partial collection");
			}
			return Err(e);
		}
		info!(chunks = chunks.len(), collection = %self.collection, "documents added to vector index");
		Ok(UpsertOutcome::Indexed { chunks: chunks.len() })
	}

	fn query(&self, text: &str, top_n: usize) -> Result<QueryResult> {
		if top_n == 0 || self.count()? == 0 {
			return Ok(Vec::new());
		}
		let query_vec = self
			.embed(&[text.to_string()])?
			.pop()
			.ok_or_else(|| Error::Embedding("embedder returned no vector for the query".into()))?;
		let hits = self
			.rt
			.block_on(search::nearest(&self.conn(), &self.collection, query_vec, top_n))
			.with_context(|| format!("searching collection '{}'", self.collection))
			.map_err(index_err)?;
		debug!(hits = hits.len(), top_n, "query complete");
		Ok(hits)
	}

	fn count(&self) -> Result<usize> {
		self.rt.block_on(table::count_rows(&self.conn(), &self.collection)).map_err(index_err)
	}

	fn reset(&self) -> Result<()> {
		info!(collection = %self.collection, "dropping collection");
		let mut db = self.db.write().unwrap_or_else(PoisonError::into_inner);
		self.rt.block_on(table::drop_table(&self.db_dir, &self.collection)).map_err(index_err)?;
		let uri = self.db_dir.to_string_lossy().to_string();
		*db = self.rt.block_on(table::open_db(&uri)).map_err(index_err)?;
		Ok(())
	}
}

fn index_err<E: Display>(e: E) -> Error {
	Error::Index(format!("{e:#}"))
}
