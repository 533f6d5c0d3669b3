//! Provider clients for the external services the pipeline orchestrates:
//! embeddings, chat completion, reranking, vector storage, and blob storage.

pub mod blob_store;
pub mod chat;
pub mod embedding;
pub mod nim;
pub mod rerank;
pub mod vector_store;

pub use blob_store::{BlobStore, HttpBlobStore, LocalBlobStore, StoredBlob};
pub use chat::{ChatClient, ChatMessage};
pub use embedding::EmbeddingProvider;
pub use nim::NimEmbeddings;
pub use rerank::RerankClient;
pub use vector_store::{QdrantStore, ScoredChunk};
