//! HTTP surface for invx.
//!
//! Exposes the single-file upload / extract / retrieve / delete / export
//! endpoints plus session endpoints that drive the batch orchestrator.

mod error;
mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;

use std::sync::Arc;

use invx_core::{
    BatchOrchestrator, FsStorage, InvoiceExtractor, InvxConfig, StorageGateway, VisionExtractor,
};
use tracing::info;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageGateway>,
    pub extractor: Arc<dyn InvoiceExtractor>,
    pub orchestrator: Arc<BatchOrchestrator>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        extractor: Arc<dyn InvoiceExtractor>,
        concurrency: usize,
    ) -> Self {
        let orchestrator = BatchOrchestrator::new(storage.clone(), extractor.clone())
            .with_concurrency(concurrency);
        Self {
            storage,
            extractor,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Filesystem storage and the configured vision extractor.
    pub fn from_config(config: &InvxConfig) -> invx_core::Result<Self> {
        let storage = FsStorage::new(&config.storage.upload_dir, &config.storage.public_path);
        let extractor = VisionExtractor::from_config(&config.vision, &config.extraction)?;
        Ok(Self::new(
            Arc::new(storage),
            Arc::new(extractor),
            config.batch.concurrency,
        ))
    }
}

/// Bind the configured address and serve until the process exits.
pub async fn serve(config: &InvxConfig) -> invx_core::Result<()> {
    let state = AppState::from_config(config)?;
    let app = create_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        addr = %addr,
        upload_dir = %config.storage.upload_dir.display(),
        mock = config.vision.mock,
        "Starting API server"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
