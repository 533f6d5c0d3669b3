//! Company and manual listing endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::response::ManualSummary;

use super::SessionParams;

/// GET /companies/ - distinct companies with at least one manual
pub async fn list_companies(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let companies = state.db().distinct_companies()?;
    Ok(Json(serde_json::json!({ "companies": companies })))
}

/// GET /companies/current/ - the session's last-upload company, falling
/// back to the most recent upload overall
pub async fn current_company(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Result<Json<serde_json::Value>> {
    let company = match state.sessions().current_company(params.session_id()) {
        Some(company) => Some(company),
        None => state.db().latest_company()?,
    };
    Ok(Json(serde_json::json!({ "company_name": company })))
}

/// GET /companies/:company/models/ - manuals ingested for a company
pub async fn company_models(
    State(state): State<AppState>,
    Path(company): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let models: Vec<ManualSummary> = state
        .db()
        .manuals_for_company(&company)?
        .iter()
        .map(ManualSummary::from)
        .collect();
    Ok(Json(serde_json::json!({ "models": models })))
}
