//! Embedding adapter for a local Ollama runtime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbeddingClient, EmbeddingClientError};

/// Embedding client backed by Ollama's `/api/embeddings` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Construct a client for the given Ollama endpoint and model.
    pub fn new(base_url: String, model: String, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimension,
        }
    }

    async fn embed_one(&self, prompt: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                prompt,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::UnexpectedStatus { status, body });
        }

        let payload: EmbedResponse = response.json().await?;
        if payload.embedding.len() != self.dimension {
            return Err(EmbeddingClientError::DimensionMismatch {
                expected: self.dimension,
                actual: payload.embedding.len(),
            });
        }
        Ok(payload.embedding)
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedder {
    async fn embed_batch(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        tracing::debug!(count = texts.len(), model = %self.model, "Requesting embeddings");

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in &texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }
}
