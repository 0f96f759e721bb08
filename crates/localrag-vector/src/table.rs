//! LanceDB connection and table lifecycle helpers.

use arrow_array::RecordBatchIterator;
use lancedb::database::CreateTableMode;
use lancedb::{connect, Connection, Table};
use std::sync::Arc;

use localrag_core::error::{Error, Result};

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(Error::store)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(Error::store)?;
    Ok(names.iter().any(|n| n == name))
}

/// Create an empty table, replacing any existing table of the same name.
/// A missing table is not an error, so calling this repeatedly is safe.
pub async fn replace_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<Table> {
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter))
        .mode(CreateTableMode::Overwrite)
        .execute()
        .await
        .map_err(Error::store)
}

pub async fn open_table(conn: &Connection, name: &str) -> Result<Table> {
    if !table_exists(conn, name).await? {
        return Err(Error::CollectionNotFound(name.to_string()));
    }
    conn.open_table(name).execute().await.map_err(Error::store)
}
