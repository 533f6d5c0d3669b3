//! Query, conversation, and health endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::query::QueryRequest;
use crate::types::response::{ComponentHealth, ConversationHistory, HealthReport, QueryResponse};

use super::SessionParams;

/// POST /query/ - answer a question about one company/product's manuals
pub async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    tracing::info!(
        "Query: \"{}\" (company='{}', product='{}', session='{}')",
        request.query,
        request.company_name,
        request.product_name,
        request.session_id()
    );

    let response = state.answer().answer(&request).await?;
    Ok(Json(QueryResponse { response }))
}

/// GET /conversation/history/
pub async fn conversation_history(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Json<ConversationHistory> {
    let conversation = state.sessions().history(params.session_id());
    Json(ConversationHistory {
        total_messages: conversation.len(),
        conversation,
    })
}

/// GET /conversation/clear/
pub async fn clear_conversation(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Json<serde_json::Value> {
    state.sessions().clear_conversation(params.session_id());
    tracing::info!("Conversation memory cleared for session '{}'", params.session_id());
    Json(serde_json::json!({
        "message": "Conversation memory cleared successfully",
    }))
}

/// GET /health/ - degradation-aware component probe; always 200 for
/// component outages
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    let vector_store = match state.vector_store().health_check().await {
        Ok(true) => ComponentHealth::Available,
        Ok(false) => ComponentHealth::Error("unreachable".to_string()),
        Err(e) => ComponentHealth::Error(e.to_string()),
    };

    let llm = match state.chat().health_check().await {
        Ok(true) => ComponentHealth::Available,
        Ok(false) => ComponentHealth::Error("unreachable".to_string()),
        Err(e) => ComponentHealth::Error(e.to_string()),
    };

    let reranker = match state.reranker() {
        None => ComponentHealth::NotConfigured,
        Some(client) => match client.health_check().await {
            Ok(true) => ComponentHealth::Available,
            Ok(false) => ComponentHealth::Error("unreachable".to_string()),
            Err(e) => ComponentHealth::Error(e.to_string()),
        },
    };

    let report = HealthReport::new(vector_store, llm, reranker);
    if report.status != "healthy" {
        tracing::warn!("Health check degraded: {:?}", report);
    }
    Json(report)
}
