//! Arrow schema for `LanceDB` collection tables.

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Schema of one collection table.
///
/// One row per chunk: identity, text, embedding, and the typed metadata
/// fields, with provider-specific extras flattened into a JSON column.
#[must_use]
pub fn collection_schema(embedding_dim: usize) -> Schema {
    Schema::new(vec![
        // Identity
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("document_id", DataType::Utf8, false),
        // Content
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                embedding_dim as i32,
            ),
            false,
        ),
        // Metadata
        Field::new("file_name", DataType::Utf8, false),
        Field::new("relative_path", DataType::Utf8, false),
        Field::new("extension", DataType::Utf8, false),
        Field::new("size", DataType::UInt64, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("total_chunks", DataType::UInt32, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("extra_json", DataType::Utf8, true),
        Field::new("indexed_at", DataType::Utf8, false),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_expected_columns() {
        let schema = collection_schema(384);
        for name in [
            "chunk_id",
            "document_id",
            "text",
            "embedding",
            "file_name",
            "relative_path",
            "extension",
            "size",
            "chunk_index",
            "total_chunks",
            "content_hash",
            "extra_json",
            "indexed_at",
        ] {
            assert!(schema.field_with_name(name).is_ok(), "missing column {name}");
        }
    }

    #[test]
    fn test_embedding_dimension_encoded_in_type() {
        let schema = collection_schema(128);
        let field = schema.field_with_name("embedding").unwrap();
        match field.data_type() {
            DataType::FixedSizeList(_, dim) => assert_eq!(*dim, 128),
            other => panic!("unexpected embedding type: {other:?}"),
        }
    }
}
