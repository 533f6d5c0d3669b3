//! manual-rag: RAG backend for product manuals
//!
//! Manuals are uploaded per company/product, chunked and embedded into a
//! hosted vector database, and the query endpoint answers questions from
//! metadata-filtered similarity search, optional reranking, and a single
//! chat-completion call, appending source references to every answer.

pub mod auth;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod reconcile;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{
    manual::{ChunkMetadata, DocumentChunk, ManualRecord, QueryFilter},
    query::QueryRequest,
};
