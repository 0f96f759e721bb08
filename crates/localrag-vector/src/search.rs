use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use localrag_core::error::{Error, Result};
use localrag_core::types::{Match, TextUnit};

use crate::schema::{CATEGORY_COLUMN, DISTANCE_COLUMN, TEXT_COLUMN, VECTOR_COLUMN};

/// Nearest rows to `query_vec` under cosine distance, best first, ranked from 1.
pub async fn nearest(table: &Table, query_vec: Vec<f32>, limit: usize) -> Result<Vec<Match>> {
    let mut stream = table
        .vector_search(query_vec)
        .map_err(Error::store)?
        .distance_type(DistanceType::Cosine)
        .limit(limit)
        .execute()
        .await
        .map_err(Error::store)?;

    let mut scored: Vec<(f32, TextUnit)> = Vec::new();
    while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
        read_rows(&batch, &mut scored)?;
    }
    // A zero vector on either side has no cosine distance.
    let before = scored.len();
    scored.retain(|(distance, _)| distance.is_finite());
    if scored.len() < before {
        tracing::debug!(dropped = before - scored.len(), "skipped rows without a finite distance");
    }
    // Stable: equal distances keep the order the engine returned them in.
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(limit);
    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(i, (distance, unit))| Match { unit, rank: i + 1, score: 1.0 - distance })
        .collect())
}

fn read_rows(batch: &RecordBatch, out: &mut Vec<(f32, TextUnit)>) -> Result<()> {
    let texts = string_column(batch, TEXT_COLUMN)?;
    let categories = string_column(batch, CATEGORY_COLUMN)?;
    let distances = batch
        .column_by_name(DISTANCE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| Error::Store(format!("search result lacks {DISTANCE_COLUMN}")))?;
    let vectors = batch
        .column_by_name(VECTOR_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>());
    for i in 0..batch.num_rows() {
        let mut unit = TextUnit::new(texts.value(i), categories.value(i));
        if let Some(vectors) = vectors.filter(|v| v.is_valid(i)) {
            let values = vectors.value(i);
            unit.embedding = Some(values.as_primitive::<arrow_array::types::Float32Type>().values().to_vec());
        }
        out.push((distances.value(i), unit));
    }
    Ok(())
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Store(format!("search result lacks {name} column")))
}
