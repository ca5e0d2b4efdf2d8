//! Google Drive v3 REST client.
//!
//! Only the two calls the uploader needs are implemented: looking up a file by
//! name inside a folder, and creating a file with its content in one
//! `multipart/related` request. Every call is made with the end user's OAuth
//! access token.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Endpoint and timeout settings for the Drive client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Metadata API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Media upload API base URL.
    #[serde(default = "default_upload_base")]
    pub upload_base: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_upload_base() -> String {
    DEFAULT_UPLOAD_BASE.to_string()
}
fn default_timeout_secs() -> u64 {
    300
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            upload_base: default_upload_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// A file stored in Drive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

impl RemoteFile {
    /// Browser link for the file, falling back to the canonical view URL.
    pub fn link(&self) -> String {
        self.web_view_link
            .clone()
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", self.id))
    }
}

/// Content to store as a new file.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Errors from Drive calls.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Failed to reach Drive.
    #[error("connection error: {0}")]
    Connection(String),
    /// Drive rejected the access token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Drive returned an error status.
    #[error("API error: {0}")]
    Api(String),
    /// The response body was not what we expected.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Remote object storage used by the upload flow.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Find a non-trashed file called `name` directly inside `folder_id`.
    async fn find_in_folder(
        &self,
        access_token: &str,
        folder_id: &str,
        name: &str,
    ) -> Result<Option<RemoteFile>, DriveError>;

    /// Create `file` inside `folder_id`.
    async fn create_file(
        &self,
        access_token: &str,
        folder_id: &str,
        file: NewFile,
    ) -> Result<RemoteFile, DriveError>;
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

#[derive(Debug, Serialize)]
struct FileMetadata<'a> {
    name: &'a str,
    parents: [&'a str; 1],
}

/// Drive client over reqwest.
#[derive(Clone)]
pub struct DriveClient {
    config: DriveConfig,
    client: Client,
}

impl DriveClient {
    pub fn new(config: DriveConfig) -> Result<Self, DriveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DriveError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Build the `q` search expression for a file name within a folder.
    fn name_query(folder_id: &str, name: &str) -> String {
        format!(
            "'{}' in parents and name='{}' and trashed=false",
            escape_query_literal(folder_id),
            escape_query_literal(name)
        )
    }

    /// Fresh boundary for one `multipart/related` request.
    fn related_boundary() -> String {
        format!("gamedrop-{}", Uuid::new_v4().simple())
    }

    /// The `multipart/related` body as head, media and tail chunks.
    ///
    /// The media chunk shares the buffer of `file.bytes`.
    fn related_parts(boundary: &str, metadata: &str, file: &NewFile) -> [Bytes; 3] {
        let head = format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {t}\r\n\r\n",
            b = boundary,
            m = metadata,
            t = file.mime_type
        );
        let tail = format!("\r\n--{}--\r\n", boundary);
        [Bytes::from(head), file.bytes.clone(), Bytes::from(tail)]
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, DriveError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            return Err(DriveError::Unauthorized(body));
        }
        Err(DriveError::Api(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl StorageGateway for DriveClient {
    async fn find_in_folder(
        &self,
        access_token: &str,
        folder_id: &str,
        name: &str,
    ) -> Result<Option<RemoteFile>, DriveError> {
        let url = format!("{}/files", self.config.api_base);
        let query = Self::name_query(folder_id, name);
        debug!("Searching Drive: {}", query);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("q", query.as_str()), ("fields", "files(id, webViewLink)")])
            .send()
            .await
            .map_err(|e| DriveError::Connection(e.to_string()))?;
        let resp = Self::check_status(resp).await?;

        let list: FileList = resp
            .json()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))?;
        Ok(list.files.into_iter().next())
    }

    async fn create_file(
        &self,
        access_token: &str,
        folder_id: &str,
        file: NewFile,
    ) -> Result<RemoteFile, DriveError> {
        let url = format!("{}/files", self.config.upload_base);
        let metadata = serde_json::to_string(&FileMetadata {
            name: &file.name,
            parents: [folder_id],
        })
        .map_err(|e| DriveError::Parse(e.to_string()))?;
        let boundary = Self::related_boundary();
        let parts = Self::related_parts(&boundary, &metadata, &file);
        let content_length: usize = parts.iter().map(Bytes::len).sum();
        let body = Body::wrap_stream(stream::iter(
            parts.into_iter().map(Ok::<_, std::io::Error>),
        ));

        debug!(
            "Uploading {} ({} bytes) to Drive folder {}",
            file.name,
            file.bytes.len(),
            folder_id
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .header(CONTENT_LENGTH, content_length)
            .query(&[("uploadType", "multipart"), ("fields", "id, webViewLink")])
            .body(body)
            .send()
            .await
            .map_err(|e| DriveError::Connection(e.to_string()))?;
        let resp = Self::check_status(resp).await?;

        resp.json()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))
    }
}

/// Escape a value for use inside a single-quoted Drive query literal.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
