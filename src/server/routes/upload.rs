//! Manual upload, listing, and deletion endpoints

use axum::{
    extract::{Multipart, Query, State},
    Form, Json,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ingestion::{validate_upload, PreparedManual};
use crate::server::state::AppState;
use crate::types::manual::resolve_product;
use crate::types::response::{
    BatchUploadResponse, DeleteManualResponse, FileResult, UploadResponse,
};

use super::SessionParams;

/// Fields collected from an upload multipart form.
#[derive(Default)]
struct UploadForm {
    files: Vec<(String, Vec<u8>)>,
    company_name: Option<String>,
    product_name: Option<String>,
    product_code: Option<String>,
    user_id: Option<String>,
}

impl UploadForm {
    /// Read every multipart field. File parts are accepted under the names
    /// `file` and `files`.
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::internal(format!("Failed to read multipart field: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" | "files" => {
                    let filename = field
                        .file_name()
                        .map(|s| s.to_string())
                        .ok_or_else(|| Error::validation("Uploaded file part has no filename"))?;
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| Error::internal(format!("Failed to read file: {e}")))?;
                    form.files.push((filename, data.to_vec()));
                }
                "company_name" => form.company_name = Some(text(field).await?),
                "product_name" => form.product_name = Some(text(field).await?),
                "product_code" => form.product_code = Some(text(field).await?),
                "user_id" => form.user_id = Some(text(field).await?),
                other => tracing::debug!("Ignoring unknown form field '{other}'"),
            }
        }

        Ok(form)
    }

    fn session_id(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("default_user")
    }

    fn company(&self) -> Result<&str> {
        self.company_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::validation("company_name is required"))
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::internal(format!("Failed to read form field: {e}")))
}

/// POST /upload_pdf/ - ingest one manual
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let form = UploadForm::read(multipart).await?;
    let company = form.company()?.to_string();
    let product = resolve_product(form.product_name.as_deref(), form.product_code.as_deref())?;

    let (filename, data) = form
        .files
        .first()
        .ok_or_else(|| Error::validation("No file provided"))?;
    validate_upload(filename, data)?;

    let session_id = form.session_id();
    state.sessions().begin_upload(session_id);

    tracing::info!("Processing upload '{filename}' ({} bytes) for company '{company}'", data.len());
    let outcome = state
        .ingest()
        .ingest(filename, data, &company, &product, form.product_code.as_deref())
        .await?;

    state.sessions().record_upload(session_id, filename, &company);
    tracing::info!(
        "Ingested '{filename}': {} chunks ({} stored)",
        outcome.chunk_count,
        outcome.chunks_stored
    );

    Ok(Json(UploadResponse {
        message: format!("PDF {filename} processed successfully"),
        files: state.sessions().uploaded_files(session_id),
        db_record: outcome.record,
    }))
}

/// POST /upload_multiple_pdfs/ - ingest several manuals with one combined
/// vector upsert pass
pub async fn upload_multiple_pdfs(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchUploadResponse>> {
    let form = UploadForm::read(multipart).await?;
    if form.files.is_empty() {
        return Err(Error::validation("No files provided"));
    }
    let company = form.company()?.to_string();
    let product = resolve_product(form.product_name.as_deref(), form.product_code.as_deref())?;

    let session_id = form.session_id();
    state.sessions().begin_upload(session_id);

    // Per-file stages first; the vector upsert runs once over everything
    // so the collection-existence check is amortized across files.
    let mut results = Vec::with_capacity(form.files.len());
    let mut prepared: Vec<PreparedManual> = Vec::new();

    for (filename, data) in &form.files {
        if let Err(e) = validate_upload(filename, data) {
            results.push(FileResult::Error {
                filename: filename.clone(),
                error: e.to_string(),
            });
            continue;
        }

        match state
            .ingest()
            .prepare(filename, data, &company, &product, form.product_code.as_deref())
            .await
        {
            Ok(manual) => {
                state.sessions().record_upload(session_id, filename, &company);
                results.push(FileResult::Success {
                    filename: filename.clone(),
                    chunks: manual.chunks.len(),
                    db_id: manual.record.id,
                    storage_uri: manual.record.storage_uri.clone(),
                });
                prepared.push(manual);
            }
            Err(e) => {
                tracing::error!("Failed to process '{filename}': {e}");
                results.push(FileResult::Error {
                    filename: filename.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let total_chunks: usize = prepared.iter().map(|m| m.chunks.len()).sum();
    let all_chunks: Vec<_> = prepared.into_iter().flat_map(|m| m.chunks).collect();
    let stored = state.ingest().store_chunks(all_chunks).await;
    tracing::info!(
        "Batch upload complete: {} files, {total_chunks} chunks ({stored} stored)",
        form.files.len()
    );

    Ok(Json(BatchUploadResponse {
        message: format!("Processed {} files", form.files.len()),
        files: state.sessions().uploaded_files(session_id),
        results,
        total_chunks,
    }))
}

/// GET /get_uploaded_files/
pub async fn get_uploaded_files(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "files": state.sessions().uploaded_files(params.session_id()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RemoveFileForm {
    pub file_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// POST /remove_file/
pub async fn remove_file(
    State(state): State<AppState>,
    Form(form): Form<RemoveFileForm>,
) -> Result<Json<serde_json::Value>> {
    let session_id = form
        .user_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("default_user");

    if !state.sessions().remove_file(session_id, &form.file_name) {
        return Err(Error::validation("File not found"));
    }

    Ok(Json(serde_json::json!({
        "message": format!("File {} removed successfully", form.file_name),
        "files": state.sessions().uploaded_files(session_id),
    })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteManualForm {
    pub product_name: String,
    /// The original filename of the manual; legacy field name retained.
    pub product_code: String,
}

/// DELETE /delete_manual/ - best-effort cross-store deletion; the metadata
/// row is authoritative
pub async fn delete_manual(
    State(state): State<AppState>,
    Form(form): Form<DeleteManualForm>,
) -> Result<Json<DeleteManualResponse>> {
    let record = state
        .db()
        .find_manual(&form.product_name, &form.product_code)?
        .ok_or_else(|| Error::ManualNotFound(form.product_name.clone()))?;

    let (metadata_deleted, blob_deleted, vectors_deleted) =
        state.ingest().delete_manual(&record).await?;

    Ok(Json(DeleteManualResponse {
        message: format!(
            "Manual '{}' ({}) deleted successfully",
            form.product_name, form.product_code
        ),
        metadata_deleted,
        blob_deleted,
        vectors_deleted,
        product_name: form.product_name,
        product_code: form.product_code,
    }))
}
