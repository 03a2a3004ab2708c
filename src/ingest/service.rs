//! Ingestion service coordinating staging, processing, embedding, and Qdrant writes.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    metrics::{IngestMetrics, MetricsSnapshot},
    processor::{DocumentProcessor, StandardProcessor},
    qdrant::{PointInsert, QdrantService},
};

use super::{
    staging::{StagedFile, stage_upload},
    types::{
        FileKind, HealthSnapshot, IngestError, IngestOutcome, PipelineError, ProcessedDocument,
    },
};

/// Coordinates the full ingestion pipeline: validation, staging, processing,
/// embedding, and vector-store writes, with compensation on failure.
///
/// The service owns long-lived handles to the document processor, embedding client,
/// Qdrant transport, and metrics registry. Construct it once near process start and
/// share it through an `Arc`; every collaborator must tolerate concurrent calls from
/// multiple in-flight requests.
pub struct IngestService {
    processor: Arc<dyn DocumentProcessor>,
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    qdrant_service: QdrantService,
    metrics: Arc<IngestMetrics>,
    staging_dir: PathBuf,
    collection_name: String,
}

/// Abstraction over the ingestion pipeline used by external surfaces.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Validate, stage, and ingest one uploaded document.
    async fn ingest(
        &self,
        bytes: Vec<u8>,
        original_filename: &str,
    ) -> Result<IngestOutcome, IngestError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;

    /// Probe the vector store for a lightweight health snapshot.
    async fn health(&self) -> HealthSnapshot;
}

impl IngestService {
    /// Build a new ingestion service, initializing backing services as needed.
    pub async fn new() -> Self {
        let config = get_config();
        tracing::info!("Initializing embedding client");
        let embedding_client = get_embedding_client();
        let qdrant_service = QdrantService::new().expect("Failed to connect to Qdrant");
        let vector_size = config.embedding_dimension as u64;
        tracing::debug!(
            collection = %config.qdrant_collection_name,
            vector_size,
            "Ensuring ingestion collection"
        );
        qdrant_service
            .create_collection_if_not_exists(&config.qdrant_collection_name, vector_size)
            .await
            .expect("Failed to ensure Qdrant collection exists");
        tracing::debug!(collection = %config.qdrant_collection_name, "Ingestion collection ready");

        Self::with_components(
            Arc::new(StandardProcessor::from_config()),
            embedding_client,
            qdrant_service,
            PathBuf::from(&config.staging_dir),
            config.qdrant_collection_name.clone(),
        )
    }

    /// Assemble a service from explicit collaborators.
    pub fn with_components(
        processor: Arc<dyn DocumentProcessor>,
        embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
        qdrant_service: QdrantService,
        staging_dir: PathBuf,
        collection_name: String,
    ) -> Self {
        Self {
            processor,
            embedding_client,
            qdrant_service,
            metrics: Arc::new(IngestMetrics::new()),
            staging_dir,
            collection_name,
        }
    }

    /// Run one upload through the pipeline.
    ///
    /// Validation happens before any side effect; staging is the only side effect the
    /// pipeline has to undo. On any failure after staging the staged file is removed
    /// and the cause is wrapped in a single [`IngestError::Pipeline`].
    pub async fn ingest(
        &self,
        bytes: Vec<u8>,
        original_filename: &str,
    ) -> Result<IngestOutcome, IngestError> {
        let kind = match FileKind::from_filename(original_filename) {
            Ok(kind) => kind,
            Err(err) => {
                self.metrics.record_rejected();
                tracing::warn!(filename = original_filename, error = %err, "Rejected upload");
                return Err(err);
            }
        };

        tracing::info!(
            filename = original_filename,
            kind = %kind,
            bytes = bytes.len(),
            "Ingesting upload"
        );
        let staged = match stage_upload(&self.staging_dir, original_filename, &bytes).await {
            Ok(staged) => staged,
            Err(err) => {
                self.metrics.record_failed();
                return Err(err);
            }
        };

        match self.run_pipeline(&staged, original_filename, kind).await {
            Ok(outcome) => {
                staged.persist();
                self.metrics.record_document(outcome.chunk_count as u64);
                tracing::info!(
                    file_id = %outcome.file_id,
                    chunks = outcome.chunk_count,
                    "Document ingested"
                );
                Ok(outcome)
            }
            Err(cause) => {
                self.metrics.record_failed();
                tracing::error!(
                    file_id = staged.id(),
                    error = %cause,
                    "Pipeline failed; compensating staged file"
                );
                // Dropping `staged` removes the file.
                Err(IngestError::Pipeline(cause))
            }
        }
    }

    async fn run_pipeline(
        &self,
        staged: &StagedFile,
        file_name: &str,
        kind: FileKind,
    ) -> Result<IngestOutcome, PipelineError> {
        let processor = Arc::clone(&self.processor);
        let path = staged.path().to_path_buf();
        let name = file_name.to_string();
        let document =
            tokio::task::spawn_blocking(move || processor.process(&path, &name, kind)).await??;

        let ProcessedDocument {
            chunks,
            mut metadatas,
        } = document;
        if metadatas.len() != chunks.len() {
            return Err(PipelineError::Consistency {
                stage: "processing",
                expected: chunks.len(),
                actual: metadatas.len(),
            });
        }

        // Second pass: the total is only known once the full chunk sequence exists.
        let total = chunks.len();
        for metadata in &mut metadatas {
            metadata.total_chunks = Some(total);
        }
        tracing::debug!(file = file_name, chunks = total, "Enriched chunk metadata");

        let point_ids = if chunks.is_empty() {
            tracing::debug!(file = file_name, "Document produced no chunks; skipping embed and upsert");
            Vec::new()
        } else {
            let embeddings = self.embedding_client.embed_batch(chunks.clone()).await?;
            if embeddings.len() != chunks.len() {
                return Err(PipelineError::Consistency {
                    stage: "embedding",
                    expected: chunks.len(),
                    actual: embeddings.len(),
                });
            }

            let points: Vec<PointInsert> = chunks
                .into_iter()
                .zip(embeddings)
                .zip(metadatas)
                .map(|((text, vector), metadata)| PointInsert {
                    text,
                    vector,
                    metadata,
                })
                .collect();

            self.qdrant_service
                .upsert_chunks(&self.collection_name, points)
                .await?
        };

        Ok(IngestOutcome {
            file_id: staged.id().to_string(),
            file_name: file_name.to_string(),
            file_kind: kind,
            chunk_count: total,
            point_ids,
        })
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Probe Qdrant to surface a lightweight health snapshot.
    pub async fn health(&self) -> HealthSnapshot {
        match self.qdrant_service.list_collections().await {
            Ok(collections) => HealthSnapshot {
                vector_store_reachable: true,
                collection_present: collections
                    .iter()
                    .any(|name| name == &self.collection_name),
            },
            Err(error) => {
                tracing::warn!(error = %error, "Vector store health probe failed");
                HealthSnapshot {
                    vector_store_reachable: false,
                    collection_present: false,
                }
            }
        }
    }
}

#[async_trait]
impl IngestApi for IngestService {
    async fn ingest(
        &self,
        bytes: Vec<u8>,
        original_filename: &str,
    ) -> Result<IngestOutcome, IngestError> {
        IngestService::ingest(self, bytes, original_filename).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        IngestService::metrics_snapshot(self)
    }

    async fn health(&self) -> HealthSnapshot {
        IngestService::health(self).await
    }
}
