//! Request handlers.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::templates;
use super::AppState;
use crate::error::AppError;
use crate::models::{HistoryPage, UploadRecord};
use crate::pagination::Pagination;
use crate::services::UploadRequest;

/// Name of the multipart field carrying the archive.
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct PageParams {
    page: Option<String>,
}

impl PageParams {
    /// Requested page; anything unparsable counts as page 1.
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    message: String,
    data: UploadRecord,
}

/// Upload page with the history table.
pub async fn index(State(state): State<AppState>, Query(params): Query<PageParams>) -> Html<String> {
    let records = match state.history.load().await {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to load history for page: {}", e);
            Vec::new()
        }
    };
    let pagination = Pagination::at_page(state.page_size, records.len(), params.page());

    let content = format!(
        "{}{}",
        templates::upload_section(),
        templates::history_section(&records, &pagination)
    );
    Html(templates::base_template(
        "Game Archive Upload",
        &content,
        &state.client_id,
    ))
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], templates::CSS)
}

/// Full upload history, newest first.
pub async fn history(State(state): State<AppState>) -> Result<Json<Vec<UploadRecord>>, AppError> {
    let records = state.history.load().await.map_err(|e| {
        error!("Failed to load history: {}", e);
        AppError::from(e)
    })?;
    Ok(Json(records))
}

/// One page of upload history.
pub async fn history_page(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<HistoryPage>, AppError> {
    let records = state.history.load().await?;
    let pagination = Pagination::at_page(state.page_size, records.len(), params.page());

    Ok(Json(HistoryPage::new(&records, &pagination)))
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let missing = || AppError::Auth("Authorization token is invalid or missing.".to_string());
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(missing)?;
    let token = value.strip_prefix("Bearer ").ok_or_else(missing)?.trim();
    if token.is_empty() {
        return Err(missing());
    }
    Ok(token.to_string())
}

/// Read the `file` field from the multipart body.
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadRequest, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::Validation(format!("Expected a multipart upload: {}", e)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))?;

        if file_name.is_empty() {
            break;
        }
        return Ok(UploadRequest {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(AppError::Validation(
        "No file was found in the request.".to_string(),
    ))
}

/// Upload one archive to Drive.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let token = bearer_token(&headers)?;
    let request = read_file_field(multipart).await?;

    let outcome = state.uploads.upload(&token, request).await.map_err(|e| {
        if let AppError::Storage { .. } = e {
            error!("Upload failed: {}", e);
        }
        e
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: outcome.message,
            data: outcome.record,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer ya29.token"));
        assert_eq!(bearer_token(&headers).unwrap(), "ya29.token");
    }

    #[test]
    fn test_page_params() {
        let params = |p: Option<&str>| PageParams {
            page: p.map(str::to_string),
        };
        assert_eq!(params(None).page(), 1);
        assert_eq!(params(Some("3")).page(), 3);
        assert_eq!(params(Some("abc")).page(), 1);
        assert_eq!(params(Some("-2")).page(), 1);
    }
}
