use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const TEXT_COLUMN: &str = "text";
pub const CATEGORY_COLUMN: &str = "category";
pub const VECTOR_COLUMN: &str = "vector";
pub const DISTANCE_COLUMN: &str = "_distance";

/// Table layout for stored text units: the embedded `text`, its `category`
/// label and an engine-managed `vector` of fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextUnitSchema {
	dim: usize,
}

impl TextUnitSchema {
	pub fn new(dim: usize) -> Self { Self { dim } }

	pub fn dim(&self) -> usize { self.dim }

	pub fn to_arrow(&self) -> Arc<Schema> {
		Arc::new(Schema::new(vec![
			Field::new(TEXT_COLUMN, DataType::Utf8, false),
			Field::new(CATEGORY_COLUMN, DataType::Utf8, false),
			Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), self.dim as i32), true),
		]))
	}
}

/// Width of the `vector` column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
		_ => None,
	}
}
