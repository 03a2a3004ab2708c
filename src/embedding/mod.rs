//! Embedding client abstraction and adapters.

mod ollama;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{EmbeddingProvider, get_config};

pub use ollama::OllamaEmbedder;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
    /// HTTP layer failed before receiving a response.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with an unexpected status code.
    #[error("Unexpected embedding provider response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Produced vector does not match the configured dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured on the server.
        expected: usize,
        /// Dimension produced by the provider.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
///
/// Implementations must return one vector per input text, in input order.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce an embedding vector for each supplied chunk of text.
    async fn embed_batch(&self, texts: Vec<String>)
    -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Deterministic in-process embedding client.
///
/// Folds the bytes of each text into a fixed-dimension vector and normalizes it.
/// Useful for development and tests where no model runtime is available; the batch
/// is encoded on the blocking pool so large documents stay off the reactor.
pub struct BuiltinEmbedder {
    dimension: usize,
}

impl BuiltinEmbedder {
    /// Construct a client producing vectors of the given dimension.
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];

        if text.is_empty() {
            return embedding;
        }

        for (idx, byte) in text.bytes().enumerate() {
            let slot = idx % dimension;
            embedding[slot] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for BuiltinEmbedder {
    async fn embed_batch(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if self.dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        tracing::debug!(count = texts.len(), dimension = self.dimension, "Encoding batch");

        let dimension = self.dimension;
        tokio::task::spawn_blocking(move || {
            texts
                .into_iter()
                .map(|text| Self::encode(&text, dimension))
                .collect()
        })
        .await
        .map_err(|err| EmbeddingClientError::GenerationFailed(err.to_string()))
    }
}

/// Build an embedding client suitable for the current configuration.
pub fn get_embedding_client() -> Box<dyn EmbeddingClient + Send + Sync> {
    let config = get_config();
    match config.embedding_provider {
        EmbeddingProvider::Ollama => {
            let base_url = config
                .ollama_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
            Box::new(OllamaEmbedder::new(
                base_url,
                config.embedding_model.clone(),
                config.embedding_dimension,
            ))
        }
        EmbeddingProvider::Builtin => Box::new(BuiltinEmbedder::new(config.embedding_dimension)),
    }
}
