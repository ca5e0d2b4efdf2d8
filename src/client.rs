//! HTTP client for a running gamedrop server.
//!
//! Used by the command-line interface to submit queued files and read back
//! the upload history.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{HistoryPage, UploadRecord};
use crate::services::{SubmitResponse, UploadSink};

/// Default server address for the CLI.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Errors talking to the server.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

/// Client for the gamedrop HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            access_token: None,
        })
    }

    /// Set the OAuth access token forwarded to Drive by the server.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Fetch the full upload history.
    ///
    /// A payload that is not a JSON array is treated as an empty history.
    pub async fn fetch_history(&self) -> Result<Vec<UploadRecord>, ClientError> {
        let url = format!("{}/api/history", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_default(),
            });
        }
        Ok(parse_history(body))
    }

    /// Fetch one page of history as paginated by the server.
    pub async fn fetch_history_page(&self, page: u32) -> Result<HistoryPage, ClientError> {
        let url = format!("{}/api/history/page", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("page", page)])
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_default(),
            });
        }
        Ok(resp.json().await?)
    }
}

/// Interpret a history payload, tolerating anything that is not an array.
pub fn parse_history(body: Value) -> Vec<UploadRecord> {
    match body {
        Value::Array(_) => serde_json::from_value(body).unwrap_or_else(|e| {
            warn!("Ignoring unreadable history payload: {}", e);
            Vec::new()
        }),
        _ => Vec::new(),
    }
}

fn error_message(body: &Value) -> Option<String> {
    body.get("error").and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl UploadSink for ApiClient {
    async fn submit(&self, path: &Path, file_name: &str) -> Result<SubmitResponse, String> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| "not logged in: no access token".to_string())?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        debug!("Submitting {} ({} bytes)", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")
            .map_err(|e| e.to_string())?;
        let form = Form::new().part("file", part);

        let url = format!("{}/api/upload", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status().as_u16();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Ok(SubmitResponse {
            status,
            error: error_message(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_history_array() {
        let body = json!([{
            "_id": "1",
            "gameName": "My_Game",
            "driveLink": "https://drive.google.com/file/d/1/view",
            "uploadDate": "2024-06-10T06:13:20Z"
        }]);
        let records = parse_history(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name, "My_Game");
    }

    #[test]
    fn test_parse_history_non_array_is_empty() {
        assert!(parse_history(json!({"error": "boom"})).is_empty());
        assert!(parse_history(Value::Null).is_empty());
        assert!(parse_history(json!([{"unexpected": true}])).is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_submit_without_token_fails_before_reading() {
        let client = ApiClient::new(DEFAULT_SERVER_URL, Duration::from_secs(5)).unwrap();
        let err = client
            .submit(Path::new("/nonexistent/a_1_.zip"), "a_1_.zip")
            .await
            .unwrap_err();
        assert!(err.contains("no access token"));
    }
}
