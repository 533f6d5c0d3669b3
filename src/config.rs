//! Configuration for the manual RAG service
//!
//! Every option is environment-driven; `Config::from_env()` is the single
//! entry point. Defaults are suitable for local development against a
//! Qdrant instance on localhost and an OpenAI-compatible model endpoint.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::retrieval::SearchFallback;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Embedding endpoint configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Chat completion configuration
    pub llm: LlmConfig,
    /// Reranking configuration
    pub rerank: RerankConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Metadata database configuration
    pub metadata_db: MetadataDbConfig,
    /// Blob store configuration
    pub blob_store: BlobStoreConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Auth configuration
    pub auth: AuthConfig,
}

impl Config {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = read("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = read("SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid SERVER_PORT: {port}")))?;
        }

        if let Some(url) = read("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        config.llm.api_key = read("LLM_API_KEY");
        if let Some(model) = read("CHAT_MODEL") {
            config.llm.chat_model = model;
        }

        if let Some(model) = read("EMBEDDING_MODEL") {
            config.embeddings.model = model;
        }
        if let Some(dims) = read("EMBEDDING_DIMENSIONS") {
            config.embeddings.dimensions = dims
                .parse()
                .map_err(|_| Error::Config(format!("Invalid EMBEDDING_DIMENSIONS: {dims}")))?;
        }

        // Absent rerank model disables reranking entirely.
        config.rerank.model = read("RERANK_MODEL");

        if let Some(url) = read("QDRANT_URL") {
            config.vector_db.url = url;
        }
        config.vector_db.api_key = read("QDRANT_API_KEY");
        if let Some(name) = read("QDRANT_COLLECTION_NAME") {
            config.vector_db.collection_name = name;
        }

        if let Some(path) = read("DATABASE_PATH") {
            config.metadata_db.path = PathBuf::from(path);
        }

        config.blob_store.url = read("BLOB_STORE_URL");
        config.blob_store.api_key = read("BLOB_STORE_API_KEY");
        if let Some(root) = read("BLOB_STORE_ROOT") {
            config.blob_store.root = PathBuf::from(root);
        }

        if let Some(fallback) = read("SEARCH_FALLBACK") {
            config.retrieval.fallback = fallback.parse()?;
        }

        if let Some(secret) = read("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Some(minutes) = read("JWT_EXPIRY_MINUTES") {
            config.auth.token_expiry_minutes = minutes
                .parse()
                .map_err(|_| Error::Config(format!("Invalid JWT_EXPIRY_MINUTES: {minutes}")))?;
        }
        config.auth.default_admin_email = read("DEFAULT_ADMIN_EMAIL");
        config.auth.default_admin_password = read("DEFAULT_ADMIN_PASSWORD");

        Ok(config)
    }
}

fn read(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Embedding endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model identifier
    pub model: String,
    /// Embedding dimensionality (1024 for nv-embed-v1)
    pub dimensions: usize,
    /// Texts per batch request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nvidia/nv-embed-v1".to_string(),
            dimensions: 1024,
            batch_size: 100,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 500,
        }
    }
}

/// Chat completion configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Endpoint base URL (shared with embeddings and reranking)
    pub base_url: String,
    /// API key for the endpoint
    pub api_key: Option<String>,
    /// Chat model identifier
    pub chat_model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling parameter
    pub top_p: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://integrate.api.nvidia.com/v1".to_string(),
            api_key: None,
            chat_model: "meta/llama-3.1-70b-instruct".to_string(),
            temperature: 0.8,
            top_p: 1.0,
            max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

/// Reranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Rerank model identifier; reranking is disabled when unset
    pub model: Option<String>,
    /// Candidates kept after reranking
    pub top_n: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model: None,
            top_n: 8,
        }
    }
}

impl RerankConfig {
    /// Whether a reranking pass is configured
    pub fn enabled(&self) -> bool {
        self.model.is_some()
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Qdrant URL
    pub url: String,
    /// Qdrant API key
    pub api_key: Option<String>,
    /// Collection name for manual chunks
    pub collection_name: String,
    /// Chunks per upsert batch
    pub upsert_batch_size: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection_name: "manual_chunks".to_string(),
            upsert_batch_size: 50,
        }
    }
}

/// Metadata database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDbConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl Default for MetadataDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/manual-rag.db"),
        }
    }
}

/// Blob store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// Remote media-store upload URL; filesystem store is used when unset
    pub url: Option<String>,
    /// Remote media-store API key
    pub api_key: Option<String>,
    /// Root directory for the filesystem store
    pub root: PathBuf,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            root: PathBuf::from("data/blobs"),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates fetched from the vector store before reranking
    pub fetch_k: usize,
    /// Chunks kept for context assembly
    pub context_k: usize,
    /// How far the filter is allowed to relax on an empty result
    pub fallback: SearchFallback,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fetch_k: 15,
            context_k: 8,
            fallback: SearchFallback::Strict,
        }
    }
}

/// Auth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Token lifetime in minutes
    pub token_expiry_minutes: i64,
    /// Default admin account provisioned at startup when absent
    pub default_admin_email: Option<String>,
    /// Default admin password
    pub default_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            token_expiry_minutes: 30,
            default_admin_email: None,
            default_admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_contract() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 500);
        assert_eq!(config.embeddings.batch_size, 100);
        assert_eq!(config.vector_db.upsert_batch_size, 50);
        assert_eq!(config.retrieval.fetch_k, 15);
        assert_eq!(config.retrieval.context_k, 8);
        assert_eq!(config.retrieval.fallback, SearchFallback::Strict);
        assert!(!config.rerank.enabled());
    }
}
