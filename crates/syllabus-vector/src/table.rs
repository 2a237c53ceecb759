//! LanceDB connection and housekeeping helpers.

use anyhow::Result;
use lancedb::{connect, Connection};
use std::path::Path;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Row count of a collection; a collection that was never created counts as empty.
pub async fn count_rows(conn: &Connection, name: &str) -> Result<usize> {
    if !table_exists(conn, name).await? { return Ok(0); }
    let table = conn.open_table(name).execute().await?;
    Ok(table.count_rows(None).await?)
}

/// Remove a collection together with its schema; the next write recreates it.
///
/// Local collections live in `<db_dir>/<name>.lance`. Callers reconnect
/// afterwards so no cached dataset state outlives the directory.
pub async fn drop_table(db_dir: &Path, name: &str) -> Result<bool> {
    let dir = db_dir.join(format!("{name}.lance"));
    if !tokio::fs::try_exists(&dir).await? { return Ok(false); }
    tokio::fs::remove_dir_all(&dir).await?;
    Ok(true)
}

pub async fn table_vector_dim(conn: &Connection, name: &str) -> Result<Option<usize>> {
    if !table_exists(conn, name).await? { return Ok(None); }
    let table = conn.open_table(name).execute().await?;
    let schema = table.schema().await?;
    Ok(crate::schema::vector_dim(&schema))
}
