//! Admin endpoints for the reconciliation queue

use axum::{extract::State, Json};

use crate::auth::AdminUser;
use crate::reconcile::ReconcileReport;
use crate::server::state::AppState;

/// GET /reconcile/ - pending drift-repair work items
pub async fn list_reconcile(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Json<serde_json::Value> {
    let pending = state.reconcile().snapshot();
    Json(serde_json::json!({
        "count": pending.len(),
        "pending": pending,
    }))
}

/// POST /reconcile/run - retry every pending item once
pub async fn run_reconcile(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
) -> Json<ReconcileReport> {
    tracing::info!("Reconciliation pass triggered by {}", user.email);
    let report = state
        .reconcile()
        .run(state.embedder(), state.vector_store())
        .await;
    Json(report)
}
