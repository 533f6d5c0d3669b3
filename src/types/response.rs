//! Response types for the HTTP surface

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::manual::ManualRecord;
use super::query::Turn;

/// Response from the query endpoint: Markdown text with an appended
/// reference section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Response from a single-manual upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    /// Filenames tracked for the caller's session
    pub files: Vec<String>,
    pub db_record: ManualRecord,
}

/// Per-file outcome within a batch upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileResult {
    Success {
        filename: String,
        chunks: usize,
        db_id: Uuid,
        storage_uri: String,
    },
    Error {
        filename: String,
        error: String,
    },
}

/// Response from the batch upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUploadResponse {
    pub message: String,
    pub files: Vec<String>,
    pub results: Vec<FileResult>,
    pub total_chunks: usize,
}

/// Manual summary for company listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSummary {
    pub id: Uuid,
    pub company_name: String,
    pub product_name: String,
    pub filename: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_uri: Option<String>,
}

impl From<&ManualRecord> for ManualSummary {
    fn from(record: &ManualRecord) -> Self {
        Self {
            id: record.id,
            company_name: record.company_name.clone(),
            product_name: record.product_name.clone(),
            filename: record.filename.clone(),
            uri: record.storage_uri.clone(),
            qr_uri: record.qr_uri.clone(),
        }
    }
}

/// Response from manual deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteManualResponse {
    pub message: String,
    pub metadata_deleted: bool,
    pub blob_deleted: bool,
    pub vectors_deleted: bool,
    pub product_name: String,
    pub product_code: String,
}

/// Per-component health signal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentHealth {
    Available,
    NotConfigured,
    Error(String),
}

/// Degradation-aware health report; component outages degrade the status
/// rather than failing the probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub vector_store: ComponentHealth,
    pub llm: ComponentHealth,
    pub reranker: ComponentHealth,
}

impl HealthReport {
    pub fn new(
        vector_store: ComponentHealth,
        llm: ComponentHealth,
        reranker: ComponentHealth,
    ) -> Self {
        // The reranker is optional; its absence never degrades the service.
        let degraded = matches!(vector_store, ComponentHealth::Error(_))
            || matches!(llm, ComponentHealth::Error(_) | ComponentHealth::NotConfigured);
        Self {
            status: if degraded { "degraded" } else { "healthy" }.to_string(),
            vector_store,
            llm,
            reranker,
        }
    }
}

/// Conversation history for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub total_messages: usize,
    pub conversation: Vec<Turn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_degrades_on_component_error() {
        let report = HealthReport::new(
            ComponentHealth::Error("connection refused".to_string()),
            ComponentHealth::Available,
            ComponentHealth::NotConfigured,
        );
        assert_eq!(report.status, "degraded");
    }

    #[test]
    fn missing_reranker_stays_healthy() {
        let report = HealthReport::new(
            ComponentHealth::Available,
            ComponentHealth::Available,
            ComponentHealth::NotConfigured,
        );
        assert_eq!(report.status, "healthy");
    }
}
