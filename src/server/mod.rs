//! Web server for uploading game archives.
//!
//! Serves the upload page with the paginated history table, and the JSON API:
//! - `GET /api/history` for the full history
//! - `GET /api/history/page` for one page with its navigation window
//! - `POST /api/upload` for uploading one archive to Drive

mod handlers;
mod routes;
mod templates;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::drive::{DriveClient, StorageGateway};
use crate::repository::{CatalogLookup, CsvCatalog, HistoryStore, JsonFileHistoryStore};
use crate::services::UploadService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadService,
    pub history: Arc<dyn HistoryStore>,
    pub client_id: String,
    pub page_size: usize,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire the file-backed stores and the Drive client from settings.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings.ensure_directories()?;

        if settings.folder_id.is_empty() {
            tracing::warn!("GOOGLE_DRIVE_FOLDER_ID is not set; uploads will fail");
        }
        if !settings.catalog_path.exists() {
            tracing::warn!("Catalog not found at {}", settings.catalog_path.display());
        }

        let history: Arc<dyn HistoryStore> =
            Arc::new(JsonFileHistoryStore::new(settings.history_path()));
        let catalog: Arc<dyn CatalogLookup> = Arc::new(CsvCatalog::new(&settings.catalog_path));
        let gateway: Arc<dyn StorageGateway> = Arc::new(DriveClient::new(settings.drive.clone())?);

        Ok(Self::from_parts(settings, catalog, history, gateway))
    }

    /// Build state from explicit collaborators.
    pub fn from_parts(
        settings: &Settings,
        catalog: Arc<dyn CatalogLookup>,
        history: Arc<dyn HistoryStore>,
        gateway: Arc<dyn StorageGateway>,
    ) -> Self {
        let uploads = UploadService::new(catalog, history.clone(), gateway, &settings.folder_id);
        Self {
            uploads,
            history,
            client_id: settings.client_id.clone(),
            page_size: settings.page_size.max(1),
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
