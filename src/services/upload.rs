//! Upload flow: resolve the catalog entry for a file, upload it to Drive
//! unless it already exists, and record it in the history.

use std::sync::{Arc, LazyLock};

use bytes::Bytes;
use regex::Regex;
use tracing::{info, warn};

use crate::drive::{NewFile, StorageGateway};
use crate::error::AppError;
use crate::models::UploadRecord;
use crate::repository::{CatalogLookup, HistoryStore};

/// Identifier embedded in a file name, e.g. `game_12345_v2.zip`.
static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)_").expect("identifier pattern is valid"));

/// Characters not allowed in destination names. ASCII only, so accented
/// letters are replaced like any other symbol.
static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("name pattern is valid"));

const FALLBACK_MIME: &str = "application/zip";

/// Extract the numeric identifier between two underscores in a file name.
pub fn extract_identifier(file_name: &str) -> Option<&str> {
    IDENTIFIER_PATTERN
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Make a display name safe to use as a file name.
pub fn sanitize_name(display_name: &str) -> String {
    UNSAFE_NAME_CHARS
        .replace_all(display_name.trim(), "_")
        .into_owned()
}

/// Resolve the MIME type of an uploaded part.
fn resolve_mime(declared: Option<&str>, file_name: &str) -> String {
    declared
        .map(str::trim)
        .filter(|m| !m.is_empty() && *m != "application/octet-stream")
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(file_name).first_raw().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// A file received by the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub message: String,
    pub record: UploadRecord,
}

/// Runs the upload flow against injected catalog, history and storage.
#[derive(Clone)]
pub struct UploadService {
    catalog: Arc<dyn CatalogLookup>,
    history: Arc<dyn HistoryStore>,
    gateway: Arc<dyn StorageGateway>,
    folder_id: String,
}

impl UploadService {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        history: Arc<dyn HistoryStore>,
        gateway: Arc<dyn StorageGateway>,
        folder_id: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            history,
            gateway,
            folder_id: folder_id.into(),
        }
    }

    /// Upload one file on behalf of the holder of `access_token`.
    ///
    /// Steps run strictly in order: identifier, catalog, duplicate check,
    /// Drive upload, history append. A failure after the Drive upload leaves
    /// the file in Drive without a history entry.
    pub async fn upload(
        &self,
        access_token: &str,
        request: UploadRequest,
    ) -> Result<UploadOutcome, AppError> {
        if self.folder_id.is_empty() {
            return Err(AppError::storage(
                "Upload destination is not configured",
                "GOOGLE_DRIVE_FOLDER_ID is not set",
            ));
        }

        let identifier = extract_identifier(&request.file_name).ok_or_else(|| {
            warn!("Rejected {}: no identifier in file name", request.file_name);
            AppError::Validation(format!(
                "Invalid file name format. No identifier found in: {}",
                request.file_name
            ))
        })?;

        let entry = self.catalog.lookup(identifier).await?.ok_or_else(|| {
            warn!("Rejected {}: identifier {} not in catalog", request.file_name, identifier);
            AppError::NotFound(format!(
                "No game with identifier {} was found in the catalog.",
                identifier
            ))
        })?;

        let display_name = sanitize_name(&entry.display_name);
        let destination = format!("{}.zip", display_name);

        if self
            .gateway
            .find_in_folder(access_token, &self.folder_id, &destination)
            .await?
            .is_some()
        {
            info!("Skipping {}: {} already exists in Drive", request.file_name, destination);
            return Err(AppError::Conflict(format!(
                "File \"{}\" already exists in your Google Drive.",
                destination
            )));
        }

        let mime_type = resolve_mime(request.content_type.as_deref(), &request.file_name);
        let remote = self
            .gateway
            .create_file(
                access_token,
                &self.folder_id,
                NewFile {
                    name: destination.clone(),
                    mime_type,
                    bytes: request.bytes,
                },
            )
            .await?;

        let record = UploadRecord::new(display_name, remote.link());
        self.history.append(record.clone()).await?;

        info!(
            "Uploaded {} as {} (drive id {})",
            request.file_name, destination, remote.id
        );

        Ok(UploadOutcome {
            message: format!(
                "File \"{}\" was uploaded to your Google Drive!",
                destination
            ),
            record,
        })
    }
}
