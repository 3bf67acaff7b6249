//! Single-file endpoints: upload, extract, retrieve, delete and export.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;
use invx_core::MediaType;
use invx_core::export::{export_file_name, rows_from_json, write_csv};
use invx_core::storage::content_type_for;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use crate::AppState;
use crate::error::ApiError;

/// Uploaded files never change once stored.
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub original_name: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub filename: Option<String>,
    pub all: Option<String>,
}

/// Store one multipart `file` field.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;

        let stored = state.storage.store(&original_name, &bytes).await?;
        return Ok(Json(UploadResponse {
            success: true,
            filename: stored.unique_name,
            original_name: stored.original_name,
            path: stored.retrieval_path,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// Run extraction on a previously uploaded file.
#[instrument(skip(state))]
pub async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<Value>, ApiError> {
    let filename = request
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Filename is required".to_string()))?;

    let bytes = state.storage.retrieve(&filename).await?;
    let media_type = MediaType::from_path(&filename);

    match state.extractor.extract(&bytes, media_type).await {
        Ok(fields) => {
            info!(filename = %filename, "Extracted invoice");
            Ok(Json(json!({ "success": true, "data": fields })))
        }
        Err(e) => {
            error!(filename = %filename, error = %e, "Extraction failed");
            Err(ApiError::Extraction(e.to_string()))
        }
    }
}

/// Serve a stored file.
#[instrument(skip(state))]
pub async fn retrieve(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.storage.retrieve(&filename).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename)),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        bytes,
    ))
}

/// Delete one stored file (`?filename=`) or all of them (`?all=true`).
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, ApiError> {
    if query.all.as_deref() == Some("true") {
        // Clearing an unreadable store is reported as nothing to delete.
        let count = match state.storage.delete_all().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to delete uploads");
                0
            }
        };
        let message = if count == 0 {
            "No files to delete".to_string()
        } else {
            format!("Deleted {} files", count)
        };
        return Ok(Json(json!({ "success": true, "message": message, "count": count })));
    }

    match query.filename.filter(|f| !f.is_empty()) {
        Some(filename) => {
            state.storage.delete(&filename).await?;
            Ok(Json(json!({
                "success": true,
                "message": format!("Deleted {}", filename),
            })))
        }
        None => Err(ApiError::BadRequest(
            "Filename or all parameter required".to_string(),
        )),
    }
}

/// Render the posted `invoices` array as a CSV download.
#[instrument(skip(body))]
pub async fn export(Json(body): Json<Value>) -> Result<impl IntoResponse, ApiError> {
    let rows = rows_from_json(&body)?;
    let csv = write_csv(&rows)?;
    info!(rows = rows.len(), "Exported invoices");
    Ok(csv_download(csv))
}

/// CSV body with attachment headers.
pub fn csv_download(csv: String) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(Utc::now()));
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
}
