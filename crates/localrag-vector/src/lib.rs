//! LanceDB-backed document index.
//!
//! `DocumentIndex` owns one connection and one injected embedder. Units are
//! embedded on `add`, queries on `search`, always with the same embedder, so
//! every vector in a collection shares its width.

use lancedb::Connection;
use std::sync::Arc;

use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;
use localrag_core::types::{Match, Query, TextUnit};

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use schema::TextUnitSchema;

/// Handle on a named table of text units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
    dim: usize,
}

impl Collection {
    pub fn name(&self) -> &str { &self.name }
    pub fn dim(&self) -> usize { self.dim }
    pub fn schema(&self) -> TextUnitSchema { TextUnitSchema::new(self.dim) }
}

pub struct DocumentIndex {
    db: Connection,
    embedder: Arc<dyn Embedder>,
}

impl DocumentIndex {
    pub async fn connect(uri: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let db = table::open_db(uri).await?;
        tracing::debug!(uri, dim = embedder.dim(), "connected to vector store");
        Ok(Self { db, embedder })
    }

    /// Schema matching the injected embedder's output width.
    pub fn schema(&self) -> TextUnitSchema {
        TextUnitSchema::new(self.embedder.dim())
    }

    /// Drop-then-create `name`; succeeds whether or not it existed before.
    pub async fn reset_and_create(&self, name: &str, schema: &TextUnitSchema) -> Result<Collection> {
        if schema.dim() != self.embedder.dim() {
            return Err(Error::SchemaMismatch { expected: self.embedder.dim(), actual: schema.dim() });
        }
        let existed = table::table_exists(&self.db, name).await?;
        table::replace_table(&self.db, name, schema.to_arrow()).await?;
        tracing::info!(collection = name, replaced = existed, dim = schema.dim(), "collection reset");
        Ok(Collection { name: name.to_string(), dim: schema.dim() })
    }

    /// Resolve an existing collection and check it fits the embedder.
    pub async fn open(&self, name: &str) -> Result<Collection> {
        let table = table::open_table(&self.db, name).await?;
        let arrow_schema = table.schema().await.map_err(Error::store)?;
        let dim = schema::vector_dim(&arrow_schema)
            .ok_or_else(|| Error::Store(format!("table '{name}' has no vector column")))?;
        if dim != self.embedder.dim() {
            return Err(Error::SchemaMismatch { expected: dim, actual: self.embedder.dim() });
        }
        Ok(Collection { name: name.to_string(), dim })
    }

    /// Embed and append `units`. Units that already carry an embedding keep it;
    /// either way every vector is checked against the collection width before
    /// anything is written.
    pub async fn add(&self, collection: &Collection, units: &[TextUnit]) -> Result<usize> {
        if units.is_empty() {
            return Ok(0);
        }
        let table = table::open_table(&self.db, &collection.name).await?;
        let embedded = self.embed_missing(units).await?;
        let batch = writer::units_to_record_batch(&embedded, &collection.schema())?;
        writer::append(&table, batch).await?;
        tracing::info!(collection = %collection.name, added = embedded.len(), "units indexed");
        Ok(embedded.len())
    }

    /// Run the embedder on the blocking pool; model inference can take seconds.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
            .map_err(Error::embedding)
    }

    async fn embed_missing(&self, units: &[TextUnit]) -> Result<Vec<TextUnit>> {
        let pending: Vec<String> = units.iter().filter(|u| u.embedding.is_none()).map(|u| u.text.clone()).collect();
        let expected = pending.len();
        let mut fresh = self.embed(pending).await?.into_iter();
        if fresh.len() != expected {
            return Err(Error::Embedding(format!("embedder returned {} vectors for {expected} texts", fresh.len())));
        }
        units
            .iter()
            .map(|unit| match &unit.embedding {
                Some(_) => Ok(unit.clone()),
                None => fresh
                    .next()
                    .map(|v| unit.clone().with_embedding(v))
                    .ok_or_else(|| Error::Embedding("embedder returned too few vectors".into())),
            })
            .collect()
    }

    /// Up to `limit` units most similar to `query`, best first.
    /// An empty collection yields an empty vec.
    pub async fn search(&self, collection: &Collection, query: &Query, limit: usize) -> Result<Vec<Match>> {
        if limit == 0 {
            return Err(Error::InvalidArgument("search limit must be >= 1".into()));
        }
        let table = table::open_table(&self.db, &collection.name).await?;
        if table.count_rows(None).await.map_err(Error::store)? == 0 {
            tracing::debug!(collection = %collection.name, "search on empty collection");
            return Ok(Vec::new());
        }
        let query_vec = self
            .embed(vec![query.text.clone()])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding("embedder returned no vector for the query".into()))?;
        if query_vec.len() != collection.dim {
            return Err(Error::SchemaMismatch { expected: collection.dim, actual: query_vec.len() });
        }
        let matches = search::nearest(&table, query_vec, limit).await?;
        tracing::debug!(collection = %collection.name, query = %query.text, hits = matches.len(), "search complete");
        Ok(matches)
    }

    pub async fn count(&self, collection: &Collection) -> Result<usize> {
        let table = table::open_table(&self.db, &collection.name).await?;
        table.count_rows(None).await.map_err(Error::store)
    }
}
