//! Router construction.

mod files;
mod session;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use invx_core::models::config::ServerConfig;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Create the API router.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/upload", post(files::upload))
        .route("/api/process", post(files::process))
        .route("/api/delete", delete(files::delete))
        .route("/api/export", post(files::export))
        .route("/uploaded_files/:filename", get(files::retrieve))
        .route("/api/batch", post(session::submit_batch))
        .route("/api/session", get(session::snapshot))
        .route("/api/session/export", get(session::export_session))
        .route(
            "/api/invoices/:id",
            patch(session::edit_invoice).delete(session::remove_invoice),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(json!({
        "status": "healthy",
        "service": "invx"
    }))
}
