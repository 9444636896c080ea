use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Chunk table schema for one partition. The vector dimension differs
/// between partitions because each is built by a different provider.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("filename", DataType::Utf8, false),
        Field::new("topic", DataType::Utf8, false),
        Field::new("format", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("total_chunks", DataType::Int32, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}
