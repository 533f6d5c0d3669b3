//! Embeddings client for an OpenAI-compatible hosted endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Client for the `/embeddings` endpoint of a hosted model service.
///
/// Batch embedding degrades in two steps: a failed batch call is retried
/// item by item, and an item that still fails is replaced by a zero vector
/// of the configured dimensionality. Output length therefore always equals
/// input length; callers must treat zero vectors as degraded (they match
/// nothing meaningfully in similarity search).
pub struct NimEmbeddings {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl NimEmbeddings {
    /// Create a new embeddings client.
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: llm.base_url.clone(),
            api_key: llm.api_key.clone(),
            model: embeddings.model.clone(),
            dimensions: embeddings.dimensions,
            batch_size: embeddings.batch_size,
        }
    }

    /// A zero vector standing in for a failed embedding.
    pub fn null_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimensions]
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Embedding failed: HTTP {status} - {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Embedding response count mismatch: sent {}, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        // Responses may arrive out of order; restore input order by index.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for NimEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut embeddings = self.request_embeddings(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("Empty embedding response"))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            match self.request_embeddings(batch).await {
                Ok(batch_embeddings) => embeddings.extend(batch_embeddings),
                Err(batch_err) => {
                    tracing::warn!(
                        "Batch embedding failed ({batch_err}), falling back to per-item embedding"
                    );
                    for text in batch {
                        match self.embed_query(text).await {
                            Ok(embedding) => embeddings.push(embedding),
                            Err(item_err) => {
                                tracing::error!(
                                    "Embedding failed for one item ({item_err}), inserting null vector"
                                );
                                embeddings.push(self.null_vector());
                            }
                        }
                    }
                }
            }
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        match builder.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "nim-embeddings"
    }
}

/// Whether an embedding is the zero-vector fallback.
pub fn is_null_embedding(embedding: &[f32]) -> bool {
    embedding.iter().all(|v| *v == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingConfig, LlmConfig};

    #[test]
    fn null_vector_has_configured_dimensions() {
        let embedder = NimEmbeddings::new(&LlmConfig::default(), &EmbeddingConfig::default());
        let null = embedder.null_vector();
        assert_eq!(null.len(), 1024);
        assert!(is_null_embedding(&null));
    }

    #[test]
    fn non_zero_embedding_is_not_null() {
        assert!(!is_null_embedding(&[0.0, 0.1, 0.0]));
        assert!(is_null_embedding(&[0.0, 0.0]));
        // An empty embedding is trivially null.
        assert!(is_null_embedding(&[]));
    }
}
