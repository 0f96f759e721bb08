use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::Table;
use std::sync::Arc;

use localrag_core::error::{Error, Result};
use localrag_core::types::TextUnit;

use crate::schema::TextUnitSchema;

/// Convert embedded units into one Arrow batch. Every unit must carry an
/// embedding of exactly `schema.dim()` floats.
pub fn units_to_record_batch(units: &[TextUnit], schema: &TextUnitSchema) -> Result<RecordBatch> {
	let dim = schema.dim();
	let mut texts = Vec::with_capacity(units.len());
	let mut categories = Vec::with_capacity(units.len());
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(units.len());
	for unit in units {
		let embedding = unit.embedding.as_ref().ok_or_else(|| Error::Embedding(format!("unit has no embedding: {:.40}", unit.text)))?;
		if embedding.len() != dim { return Err(Error::SchemaMismatch { expected: dim, actual: embedding.len() }); }
		texts.push(unit.text.as_str());
		categories.push(unit.category.as_str());
		vectors.push(Some(embedding.iter().map(|&x| Some(x)).collect()));
	}
	RecordBatch::try_new(schema.to_arrow(), vec![
		Arc::new(StringArray::from(texts)),
		Arc::new(StringArray::from(categories)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim as i32)),
	]).map_err(Error::store)
}

pub async fn append(table: &Table, batch: RecordBatch) -> Result<()> {
	let schema = batch.schema();
	let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
	table.add(reader).execute().await.map_err(Error::store)?;
	Ok(())
}
