//! Core data types and error definitions for the ingestion pipeline.

use crate::{embedding::EmbeddingClientError, processor::ProcessingError, qdrant::QdrantError};
use serde::Serialize;
use thiserror::Error;

/// File types accepted by the upload surface.
///
/// Derived from the lower-cased filename suffix; anything outside this set is rejected
/// before any filesystem or network side effect occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Portable Document Format.
    Pdf,
    /// Markdown source.
    Md,
    /// Plain UTF-8 text.
    Txt,
    /// JSON documents, flattened to their scalar values.
    Json,
}

/// Human-readable allowed set used in rejection messages.
pub const ALLOWED_EXTENSIONS: &str = "pdf, md, txt, json";

impl FileKind {
    /// Resolve the file kind from an original filename.
    ///
    /// The extension is taken from the final suffix and compared case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "md" => Ok(Self::Md),
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            _ => Err(IngestError::UnsupportedType { extension }),
        }
    }

    /// Canonical lower-case tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Md => "md",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes recorded for a single chunk of an ingested document.
///
/// `total_chunks` starts out unset because the processor cannot know the final count
/// while splitting; the orchestrator backfills it once the full sequence exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    /// Zero-based position of the chunk within its document.
    pub chunk_index: usize,
    /// Total number of chunks in the document, backfilled after processing.
    pub total_chunks: Option<usize>,
    /// Original filename the chunk was extracted from.
    pub source_file: String,
    /// Resolved type of the source document.
    pub file_kind: FileKind,
}

/// Output of the document processor: chunk texts and positionally aligned metadata.
#[derive(Debug, Clone, Default)]
pub struct ProcessedDocument {
    /// Ordered chunk texts.
    pub chunks: Vec<String>,
    /// Per-chunk metadata, one entry per chunk.
    pub metadatas: Vec<ChunkMetadata>,
}

/// Terminal result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Opaque identifier generated for the staged upload.
    pub file_id: String,
    /// Original filename supplied by the client.
    pub file_name: String,
    /// Resolved document type.
    pub file_kind: FileKind,
    /// Number of chunks created for the document.
    pub chunk_count: usize,
    /// Identifiers assigned by the vector store, kept for audit and retrieval.
    pub point_ids: Vec<String>,
}

/// Reachability snapshot for the vector store backing the pipeline.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthSnapshot {
    /// Indicates whether the vector store HTTP endpoint responded successfully.
    pub vector_store_reachable: bool,
    /// Whether the configured collection is currently present.
    pub collection_present: bool,
}

/// Errors reported by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload named a file type outside the allowed set. Rejected before any side effect.
    #[error("File type '{extension}' not supported. Allowed: {allowed}", allowed = ALLOWED_EXTENSIONS)]
    UnsupportedType {
        /// Lower-cased extension taken from the filename (empty when absent).
        extension: String,
    },
    /// Writing the upload to the staging directory failed; nothing downstream ran.
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),
    /// A stage after staging failed; the staged file has been removed.
    #[error("Ingestion failed: {0}")]
    Pipeline(#[from] PipelineError),
}

impl IngestError {
    /// Whether the failure was caused by client input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }
}

/// Causes wrapped by [`IngestError::Pipeline`] after compensation has run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Document processor could not extract or chunk the staged file.
    #[error("Failed to process document: {0}")]
    Processing(#[from] ProcessingError),
    /// Embedding provider failed to produce vectors for the chunks.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector store rejected or failed the upsert.
    #[error("Vector store request failed: {0}")]
    Storage(#[from] QdrantError),
    /// A collaborator broke the positional-alignment contract. Never retried.
    #[error("Consistency violation after {stage}: expected {expected} entries, got {actual}")]
    Consistency {
        /// Stage boundary where the mismatch was detected.
        stage: &'static str,
        /// Expected sequence length.
        expected: usize,
        /// Observed sequence length.
        actual: usize,
    },
    /// A blocking worker task was cancelled or panicked.
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
