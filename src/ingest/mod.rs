//! Upload ingestion pipeline: staging, orchestration, and compensation.

mod service;
mod staging;
mod types;

pub use service::{IngestApi, IngestService};
pub use staging::{StagedFile, stage_upload};
pub use types::{
    ALLOWED_EXTENSIONS, ChunkMetadata, FileKind, HealthSnapshot, IngestError, IngestOutcome,
    PipelineError, ProcessedDocument,
};
