//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Uniform "embed text into vectors" interface over a hosted embedding API.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single query text. Failures propagate to the caller.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of documents, preserving input order and count.
    ///
    /// Implementations must return exactly one vector per input text even
    /// under partial upstream failure; see [`crate::providers::NimEmbeddings`]
    /// for the degradation contract.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embedding dimensionality.
    fn dimensions(&self) -> usize;

    /// Whether the provider is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
