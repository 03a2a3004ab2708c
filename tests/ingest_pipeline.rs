//! End-to-end pipeline tests exercising the ingestion orchestrator against stub
//! collaborators and a mocked Qdrant endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use httpmock::{Method::PUT, MockServer};
use serde_json::json;

use docstream::embedding::{BuiltinEmbedder, EmbeddingClient, EmbeddingClientError};
use docstream::ingest::{
    ChunkMetadata, FileKind, IngestError, IngestService, PipelineError, ProcessedDocument,
};
use docstream::processor::{DocumentProcessor, ProcessingError, StandardProcessor};
use docstream::qdrant::QdrantService;

const COLLECTION: &str = "library";

/// Deterministic processor splitting documents on blank lines.
struct ParagraphProcessor;

impl DocumentProcessor for ParagraphProcessor {
    fn process(
        &self,
        path: &Path,
        file_name: &str,
        kind: FileKind,
    ) -> Result<ProcessedDocument, ProcessingError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProcessingError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let chunks: Vec<String> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        let metadatas = chunks
            .iter()
            .enumerate()
            .map(|(chunk_index, _)| ChunkMetadata {
                chunk_index,
                total_chunks: None,
                source_file: file_name.to_string(),
                file_kind: kind,
            })
            .collect();
        Ok(ProcessedDocument { chunks, metadatas })
    }
}

/// Processor violating the equal-length contract between chunks and metadata.
struct MisalignedProcessor;

impl DocumentProcessor for MisalignedProcessor {
    fn process(
        &self,
        _path: &Path,
        file_name: &str,
        kind: FileKind,
    ) -> Result<ProcessedDocument, ProcessingError> {
        Ok(ProcessedDocument {
            chunks: vec!["first".into(), "second".into()],
            metadatas: vec![ChunkMetadata {
                chunk_index: 0,
                total_chunks: None,
                source_file: file_name.to_string(),
                file_kind: kind,
            }],
        })
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingClient for FailingEmbedder {
    async fn embed_batch(
        &self,
        _texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        Err(EmbeddingClientError::GenerationFailed(
            "model backend offline".into(),
        ))
    }
}

fn service_with(
    server: &MockServer,
    staging_dir: &Path,
    processor: Arc<dyn DocumentProcessor>,
    embedder: Box<dyn EmbeddingClient + Send + Sync>,
) -> IngestService {
    let store = QdrantService::with_endpoint(&server.base_url(), None).expect("qdrant client");
    IngestService::with_components(
        processor,
        embedder,
        store,
        staging_dir.to_path_buf(),
        COLLECTION.to_string(),
    )
}

fn staged_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    std::fs::read_dir(dir)
        .expect("read staging dir")
        .map(|entry| entry.expect("dir entry").path())
        .collect()
}

async fn mock_upsert_ok(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/collections/{COLLECTION}/points"))
                .query_param("wait", "true");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.001,
                "result": { "operation_id": 1, "status": "completed" }
            }));
        })
        .await
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_staging() {
    let server = MockServer::start_async().await;
    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(ParagraphProcessor),
        Box::new(BuiltinEmbedder::new(4)),
    );

    let err = service
        .ingest(b"MZ\x90\x00".to_vec(), "notes.exe")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::UnsupportedType { ref extension } if extension == "exe"
    ));
    assert!(staged_files(staging.path()).is_empty());
}

#[tokio::test]
async fn txt_upload_yields_three_chunks_with_backfilled_totals() {
    let server = MockServer::start_async().await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/collections/{COLLECTION}/points"))
                .query_param("wait", "true")
                .body_contains("\"total_chunks\":3")
                .body_contains("\"chunk_index\":2")
                .body_contains("notes.txt");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.001,
                "result": { "operation_id": 1, "status": "completed" }
            }));
        })
        .await;

    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(ParagraphProcessor),
        Box::new(BuiltinEmbedder::new(4)),
    );

    let outcome = service
        .ingest(
            b"alpha section\n\nbeta section\n\ngamma section".to_vec(),
            "notes.txt",
        )
        .await
        .expect("ingested");

    upsert.assert();
    assert_eq!(outcome.chunk_count, 3);
    assert_eq!(outcome.point_ids.len(), 3);
    assert_eq!(outcome.file_kind, FileKind::Txt);
    assert_eq!(outcome.file_name, "notes.txt");

    let files = staged_files(staging.path());
    assert_eq!(files.len(), 1);
    let staged_name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(staged_name, format!("{}_notes.txt", outcome.file_id));
}

#[tokio::test]
async fn embedding_failure_removes_the_staged_file() {
    let server = MockServer::start_async().await;
    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(ParagraphProcessor),
        Box::new(FailingEmbedder),
    );

    let err = service
        .ingest(b"some body text".to_vec(), "notes.txt")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Pipeline(PipelineError::Embedding(_))
    ));
    assert!(err.to_string().contains("model backend offline"));
    assert!(staged_files(staging.path()).is_empty());
}

#[tokio::test]
async fn vector_store_failure_removes_the_staged_file() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/collections/{COLLECTION}/points"));
            then.status(500).body("collection locked");
        })
        .await;

    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(ParagraphProcessor),
        Box::new(BuiltinEmbedder::new(4)),
    );

    let err = service
        .ingest(b"some body text".to_vec(), "notes.txt")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Pipeline(PipelineError::Storage(_))
    ));
    assert!(staged_files(staging.path()).is_empty());
}

#[tokio::test]
async fn misaligned_processor_output_is_a_consistency_error() {
    let server = MockServer::start_async().await;
    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(MisalignedProcessor),
        Box::new(BuiltinEmbedder::new(4)),
    );

    let err = service
        .ingest(b"body".to_vec(), "notes.txt")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Pipeline(PipelineError::Consistency {
            stage: "processing",
            expected: 2,
            actual: 1,
        })
    ));
    assert!(staged_files(staging.path()).is_empty());
}

#[tokio::test]
async fn repeated_uploads_get_independent_identifiers() {
    let server = MockServer::start_async().await;
    let upsert = mock_upsert_ok(&server).await;

    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(ParagraphProcessor),
        Box::new(BuiltinEmbedder::new(4)),
    );

    let first = service
        .ingest(b"identical body".to_vec(), "notes.txt")
        .await
        .expect("first ingest");
    let second = service
        .ingest(b"identical body".to_vec(), "notes.txt")
        .await
        .expect("second ingest");

    upsert.assert_hits(2);
    assert_ne!(first.file_id, second.file_id);
    assert_eq!(staged_files(staging.path()).len(), 2);
}

#[tokio::test]
async fn empty_document_succeeds_without_vector_writes() {
    let server = MockServer::start_async().await;
    let upsert = mock_upsert_ok(&server).await;

    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(ParagraphProcessor),
        Box::new(BuiltinEmbedder::new(4)),
    );

    let outcome = service
        .ingest(b"   \n\n   ".to_vec(), "notes.txt")
        .await
        .expect("ingested");

    upsert.assert_hits(0);
    assert_eq!(outcome.chunk_count, 0);
    assert!(outcome.point_ids.is_empty());
    assert_eq!(staged_files(staging.path()).len(), 1);
}

#[tokio::test]
async fn standard_processor_ingests_markdown_end_to_end() {
    let server = MockServer::start_async().await;
    let upsert = mock_upsert_ok(&server).await;

    let staging = tempfile::tempdir().expect("tempdir");
    let service = service_with(
        &server,
        staging.path(),
        Arc::new(StandardProcessor::with_limits(32, 0)),
        Box::new(BuiltinEmbedder::new(8)),
    );

    let outcome = service
        .ingest(
            b"# Release notes\n\nThe ingestion service now compensates staged files \
              whenever a downstream stage fails, keeping storage consistent."
                .to_vec(),
            "release.md",
        )
        .await
        .expect("ingested");

    upsert.assert();
    assert!(outcome.chunk_count >= 1);
    assert_eq!(outcome.point_ids.len(), outcome.chunk_count);
    assert_eq!(outcome.file_kind, FileKind::Md);
    assert_eq!(staged_files(staging.path()).len(), 1);
}
