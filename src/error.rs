//! Error types for the manual RAG service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

fn fmt_available(models: &[String]) -> String {
    if models.is_empty() {
        String::new()
    } else {
        format!(" Available models include: {}", models.join(", "))
    }
}

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation error
    #[error("{0}")]
    Validation(String),

    /// Query filter missing or blank
    #[error("Both company_name and product_name are required to search for context.")]
    MissingFilter,

    /// No chunks matched the query filter
    #[error("No context found for the specified company and product combination.")]
    NoContextFound,

    /// Manual record not found
    #[error("Manual not found: {0}")]
    ManualNotFound(String),

    /// Chat model not available; carries the model list for diagnosis
    #[error("Chat model '{model}' not found or not available for this account.{}", fmt_available(.available))]
    ModelNotFound { model: String, available: Vec<String> },

    /// Upstream rejected the API key
    #[error("Upstream authentication failed: {0}")]
    Unauthorized(String),

    /// Upstream denied access
    #[error("Upstream access denied: {0}")]
    Forbidden(String),

    /// Credential or token failure on our own auth surface
    #[error("{0}")]
    Auth(String),

    /// Caller lacks the required role
    #[error("Not enough permissions")]
    Permission,

    /// PDF parsing error
    #[error("Failed to parse '{filename}': {message}")]
    PdfParse { filename: String, message: String },

    /// Embedding generation error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Blob storage error
    #[error("Blob storage error: {0}")]
    Storage(String),

    /// Metadata database error
    #[error("Metadata database error: {0}")]
    MetadataDb(String),

    /// Chat completion error
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a PDF parse error
    pub fn pdf_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PdfParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create a blob storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a metadata db error
    pub fn metadata_db(message: impl Into<String>) -> Self {
        Self::MetadataDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::MetadataDb(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Error::MissingFilter => (StatusCode::BAD_REQUEST, "missing_filter"),
            Error::NoContextFound => (StatusCode::NOT_FOUND, "no_context_found"),
            Error::ManualNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::ModelNotFound { .. } => (StatusCode::NOT_FOUND, "model_not_found"),
            Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "upstream_unauthorized"),
            Error::Forbidden(_) => (StatusCode::FORBIDDEN, "upstream_forbidden"),
            Error::Auth(_) => (StatusCode::UNAUTHORIZED, "auth_error"),
            Error::Permission => (StatusCode::FORBIDDEN, "forbidden"),
            Error::PdfParse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            Error::Embedding(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            Error::VectorDb(_) => (StatusCode::BAD_GATEWAY, "vector_db_error"),
            Error::Storage(_) => (StatusCode::BAD_GATEWAY, "storage_error"),
            Error::MetadataDb(_) => (StatusCode::INTERNAL_SERVER_ERROR, "metadata_db_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_not_found_lists_alternatives() {
        let err = Error::ModelNotFound {
            model: "meta/llama-3.1-70b".to_string(),
            available: vec!["nvidia/nemotron-4".to_string(), "meta/llama-3.1-8b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("meta/llama-3.1-70b"));
        assert!(msg.contains("nvidia/nemotron-4"));
    }

    #[test]
    fn model_not_found_without_alternatives() {
        let err = Error::ModelNotFound {
            model: "gone".to_string(),
            available: vec![],
        };
        assert!(!err.to_string().contains("Available models"));
    }
}
