use anyhow::{bail, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::Connection;
use std::sync::Arc;

use syllabus_core::types::DocumentChunk;
use crate::schema::build_chunk_schema;

/// Build one Arrow batch from chunks and their vectors (same order, same length).
pub fn chunks_to_record_batch(chunks: &[DocumentChunk], vectors: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
	if chunks.len() != vectors.len() {
		bail!("{} chunks but {} vectors", chunks.len(), vectors.len());
	}
	if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
		bail!("dim mismatch: got {} expected {}", bad.len(), dim);
	}
	let dim_i32 = i32::try_from(dim)?;
	let schema = build_chunk_schema(dim_i32);
	let mut ids = Vec::with_capacity(chunks.len());
	let mut contents = Vec::with_capacity(chunks.len());
	let mut metadata = Vec::with_capacity(chunks.len());
	for chunk in chunks {
		ids.push(chunk.id.clone());
		contents.push(chunk.content.clone());
		metadata.push(serde_json::to_string(&chunk.metadata)?);
	}
	let vectors = vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
	let record_batch = RecordBatch::try_new(schema, vec![
		Arc::new(StringArray::from(ids)),
		Arc::new(StringArray::from(contents)),
		Arc::new(StringArray::from(metadata)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim_i32)),
	])?;
	Ok(record_batch)
}

/// Append a batch, creating the table on first write.
pub async fn insert_batch(db: &Connection, table_name: &str, batch: RecordBatch) -> Result<()> {
	let schema = batch.schema();
	let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
	if crate::table::table_exists(db, table_name).await? {
		db.open_table(table_name).execute().await?.add(reader).execute().await?;
	} else {
		db.create_table(table_name, reader).execute().await?;
	}
	Ok(())
}
