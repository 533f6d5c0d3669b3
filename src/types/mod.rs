//! Core types for the manual RAG service

pub mod manual;
pub mod query;
pub mod response;

pub use manual::{ChunkMetadata, DocumentChunk, ManualRecord, QueryFilter};
pub use query::{QueryRequest, Turn};
pub use response::{
    BatchUploadResponse, DeleteManualResponse, FileResult, HealthReport, ManualSummary,
    QueryResponse, UploadResponse,
};
