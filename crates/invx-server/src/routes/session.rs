//! Session endpoints backed by the batch orchestrator.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use invx_core::{CanonicalField, FileBlob, InvoiceRecord, SessionSnapshot};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::files::csv_download;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub field: String,
    pub value: String,
}

/// Accept every file part and process them in the background.
#[instrument(skip(state, multipart))]
pub async fn submit_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
        files.push(FileBlob::new(name, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let accepted = files.len();
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.submit(files).await;
    });

    info!(accepted, "Batch accepted");
    Ok((StatusCode::ACCEPTED, Json(json!({ "accepted": accepted }))))
}

#[instrument(skip(state))]
pub async fn snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.orchestrator.snapshot())
}

/// Overwrite one field of a record.
#[instrument(skip(state))]
pub async fn edit_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EditRequest>,
) -> Result<Json<InvoiceRecord>, ApiError> {
    let field = CanonicalField::from_key(&request.field)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown field: {}", request.field)))?;

    let record = state.orchestrator.update_field(&id, field, request.value)?;
    Ok(Json(record))
}

#[instrument(skip(state))]
pub async fn remove_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.orchestrator.remove(&id).await?;
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state))]
pub async fn export_session(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let csv = state.orchestrator.export_csv()?;
    Ok(csv_download(csv))
}
