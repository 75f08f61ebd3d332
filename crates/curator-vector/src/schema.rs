use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// One row per chunk; `section_path` is a JSON array of heading titles.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("record_id", DataType::Utf8, false),
        Field::new("ordinal", DataType::Int32, false),
        Field::new("section_path", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("url", DataType::Utf8, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}
