//! Helpers for constructing Qdrant point payloads.

use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ingest::ChunkMetadata;

/// Build the payload object stored alongside each indexed chunk.
pub(crate) fn build_payload(text: &str, metadata: &ChunkMetadata, timestamp_rfc3339: &str) -> Value {
    let mut payload = Map::new();
    payload.insert("text".into(), Value::String(text.to_string()));
    payload.insert("chunk_index".into(), json!(metadata.chunk_index));
    payload.insert(
        "total_chunks".into(),
        metadata.total_chunks.map_or(Value::Null, |total| json!(total)),
    );
    payload.insert(
        "source_file".into(),
        Value::String(metadata.source_file.clone()),
    );
    payload.insert(
        "file_type".into(),
        Value::String(metadata.file_kind.as_str().to_string()),
    );
    payload.insert(
        "timestamp".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct an identifier suitable for Qdrant point ids.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::FileKind;

    #[test]
    fn payload_records_chunk_position_and_source() {
        let metadata = ChunkMetadata {
            chunk_index: 1,
            total_chunks: Some(3),
            source_file: "notes.txt".into(),
            file_kind: FileKind::Txt,
        };
        let payload = build_payload("sample", &metadata, "2025-01-01T00:00:00Z");

        assert_eq!(payload["text"], "sample");
        assert_eq!(payload["chunk_index"], 1);
        assert_eq!(payload["total_chunks"], 3);
        assert_eq!(payload["source_file"], "notes.txt");
        assert_eq!(payload["file_type"], "txt");
        assert_eq!(payload["timestamp"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }

    #[test]
    fn point_ids_are_unique() {
        assert_ne!(generate_point_id(), generate_point_id());
    }
}
