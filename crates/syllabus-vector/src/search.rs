use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::cmp::Ordering;

use syllabus_core::types::{Meta, RetrievedChunk};
use crate::schema::{CONTENT_COLUMN, DISTANCE_COLUMN, ID_COLUMN, METADATA_COLUMN};

/// Extra candidates fetched beyond `limit` so ties at the cut-off are resolved by id.
const TIE_MARGIN: usize = 8;

/// Exact L2 nearest neighbours of `query_vec`, ascending distance, ties by id.
pub async fn nearest(conn: &Connection, table_name: &str, query_vec: Vec<f32>, limit: usize) -> Result<Vec<RetrievedChunk>> {
	let table = conn.open_table(table_name).execute().await?;
	let mut stream = table
		.vector_search(query_vec)?
		.distance_type(DistanceType::L2)
		.limit(limit + TIE_MARGIN)
		.execute()
		.await?;
	let mut hits = Vec::new();
	while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
		hits.extend(batch_to_hits(&batch)?);
	}
	rank(&mut hits);
	hits.truncate(limit);
	Ok(hits)
}

pub fn rank(hits: &mut [RetrievedChunk]) {
	hits.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
		Ordering::Equal => a.id.cmp(&b.id),
		other => other,
	});
}

fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<RetrievedChunk>> {
	let ids = string_column(batch, ID_COLUMN)?;
	let contents = string_column(batch, CONTENT_COLUMN)?;
	let metadata = string_column(batch, METADATA_COLUMN)?;
	let distances = batch
		.column_by_name(DISTANCE_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| anyhow!("{DISTANCE_COLUMN} column missing from search results"))?;
	let mut hits = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let meta: Meta = if metadata.is_null(i) { Meta::new() } else { serde_json::from_str(metadata.value(i))? };
		hits.push(RetrievedChunk {
			id: ids.value(i).to_string(),
			text: contents.value(i).to_string(),
			metadata: meta,
			distance: distances.value(i),
		});
	}
	Ok(hits)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("{name} column missing from search results"))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(id: &str, distance: f32) -> RetrievedChunk {
		RetrievedChunk { id: id.into(), text: String::new(), metadata: Meta::new(), distance }
	}

	#[test]
	fn rank_orders_by_distance_then_id() {
		let mut hits = vec![hit("doc_0_chunk_2", 0.5), hit("doc_0_chunk_1", 0.1), hit("doc_0_chunk_0", 0.5)];
		rank(&mut hits);
		let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
		assert_eq!(ids, vec!["doc_0_chunk_1", "doc_0_chunk_0", "doc_0_chunk_2"]);
	}
}
