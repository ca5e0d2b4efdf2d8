//! End-to-end tests for the upload and history endpoints.
//!
//! The router is driven in-process with fake Drive gateways, in-memory or
//! file-backed history stores and a CSV catalog written to a temp dir.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use gamedrop::client::ApiClient;
use gamedrop::config::Settings;
use gamedrop::drive::{DriveError, NewFile, RemoteFile, StorageGateway};
use gamedrop::models::{UploadRecord, UploadStatus};
use gamedrop::repository::{
    CsvCatalog, HistoryError, HistoryStore, InMemoryHistoryStore, JsonFileHistoryStore,
};
use gamedrop::server::{create_router, AppState};
use gamedrop::services::UploadQueue;

const BOUNDARY: &str = "gamedrop-test-boundary";
const TOKEN: &str = "ya29.test-token";

/// Drive folder held in memory. Records the token each call was made with.
#[derive(Default)]
struct FakeDrive {
    files: Mutex<Vec<(String, String, NewFile)>>,
    tokens: Mutex<Vec<String>>,
}

#[async_trait]
impl StorageGateway for FakeDrive {
    async fn find_in_folder(
        &self,
        access_token: &str,
        folder_id: &str,
        name: &str,
    ) -> Result<Option<RemoteFile>, DriveError> {
        self.tokens.lock().await.push(access_token.to_string());
        let files = self.files.lock().await;
        Ok(files
            .iter()
            .find(|(_, folder, file)| folder == folder_id && file.name == name)
            .map(|(id, _, _)| RemoteFile {
                id: id.clone(),
                web_view_link: None,
            }))
    }

    async fn create_file(
        &self,
        access_token: &str,
        folder_id: &str,
        file: NewFile,
    ) -> Result<RemoteFile, DriveError> {
        self.tokens.lock().await.push(access_token.to_string());
        let mut files = self.files.lock().await;
        let id = format!("drive-{}", files.len() + 1);
        files.push((id.clone(), folder_id.to_string(), file));
        Ok(RemoteFile {
            web_view_link: Some(format!("https://drive.google.com/file/d/{id}/view")),
            id,
        })
    }
}

/// Drive that finds nothing and fails every create with `error`.
struct FailingDrive {
    error: fn() -> DriveError,
    creates: AtomicUsize,
}

impl FailingDrive {
    fn new(error: fn() -> DriveError) -> Self {
        Self {
            error,
            creates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StorageGateway for FailingDrive {
    async fn find_in_folder(
        &self,
        _access_token: &str,
        _folder_id: &str,
        _name: &str,
    ) -> Result<Option<RemoteFile>, DriveError> {
        Ok(None)
    }

    async fn create_file(
        &self,
        _access_token: &str,
        _folder_id: &str,
        _file: NewFile,
    ) -> Result<RemoteFile, DriveError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Err((self.error)())
    }
}

/// History that reads fine but refuses every append.
struct ReadOnlyHistory;

#[async_trait]
impl HistoryStore for ReadOnlyHistory {
    async fn load(&self) -> Result<Vec<UploadRecord>, HistoryError> {
        Ok(Vec::new())
    }

    async fn append(&self, _record: UploadRecord) -> Result<(), HistoryError> {
        Err(HistoryError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "history is read-only",
        )))
    }
}

struct Harness {
    app: Router,
    drive: Arc<FakeDrive>,
    history: Arc<InMemoryHistoryStore>,
    dir: tempfile::TempDir,
}

/// Router over `dir` with a catalog containing `12345 -> My Game` and
/// `777 -> Other: Edition`.
fn build_app(
    dir: &Path,
    history: Arc<dyn HistoryStore>,
    drive: Arc<dyn StorageGateway>,
) -> Router {
    let catalog_path: PathBuf = dir.join("catalog.csv");
    std::fs::write(&catalog_path, "appid,name\n12345,My Game\n777,Other: Edition\n")
        .expect("Failed to write catalog");

    let mut settings = Settings::with_data_dir(dir.to_path_buf());
    settings.folder_id = "folder-1".to_string();
    settings.client_id = "client-id.apps.googleusercontent.com".to_string();
    settings.page_size = 5;

    let state = AppState::from_parts(
        &settings,
        Arc::new(CsvCatalog::new(catalog_path)),
        history,
        drive,
    );
    create_router(state)
}

fn setup(existing: Vec<UploadRecord>) -> Harness {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let drive = Arc::new(FakeDrive::default());
    let history = Arc::new(InMemoryHistoryStore::with_records(existing));
    let app = build_app(dir.path(), history.clone(), drive.clone());

    Harness {
        app,
        drive,
        history,
        dir,
    }
}

fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/zip\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(file_name: &str, token: Option<&str>) -> Request<Body> {
    upload_request_with_field("file", file_name, token)
}

fn upload_request_with_field(field: &str, file_name: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(multipart_body(field, file_name, b"PK\x03\x04fake")))
        .expect("Failed to build request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");
    send(app, request).await
}

fn old_record(name: &str) -> UploadRecord {
    UploadRecord::new(name, format!("https://drive.google.com/file/d/{name}/view"))
}

// ============================================================================
// POST /api/upload
// ============================================================================

#[tokio::test]
async fn upload_creates_file_and_prepends_history() {
    let h = setup(vec![old_record("Earlier")]);

    let (status, body) = send(&h.app, upload_request("game_12345_v2.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["gameName"], "My_Game");
    assert!(body["data"]["driveLink"]
        .as_str()
        .unwrap()
        .contains("drive-1"));
    assert!(body["message"].as_str().unwrap().contains("My_Game.zip"));

    let files = h.drive.files.lock().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].1, "folder-1");
    assert_eq!(files[0].2.name, "My_Game.zip");
    assert_eq!(files[0].2.mime_type, "application/zip");
    assert_eq!(&files[0].2.bytes[..], b"PK\x03\x04fake");
    drop(files);

    assert!(h.drive.tokens.lock().await.iter().all(|t| t == TOKEN));

    let records = h.history.load().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].display_name, "My_Game");
    assert_eq!(records[1].display_name, "Earlier");
}

#[tokio::test]
async fn repeated_upload_conflicts_without_new_history() {
    let h = setup(Vec::new());

    let (status, _) = send(&h.app, upload_request("game_12345_v2.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&h.app, upload_request("game_12345_v2.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("My_Game.zip"));

    assert_eq!(h.drive.files.lock().await.len(), 1);
    assert_eq!(h.history.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn upload_without_token_is_unauthorized() {
    let h = setup(Vec::new());

    let (status, body) = send(&h.app, upload_request("game_12345_v2.zip", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authorization token is invalid or missing.");
    assert!(h.drive.tokens.lock().await.is_empty());
}

#[tokio::test]
async fn upload_without_identifier_is_rejected() {
    let h = setup(Vec::new());

    let (status, body) = send(&h.app, upload_request("game.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("game.zip"));
    assert!(h.history.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_with_unknown_identifier_is_not_found() {
    let h = setup(Vec::new());

    let (status, body) = send(&h.app, upload_request("game_99999_.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("99999"));
    assert!(h.drive.files.lock().await.is_empty());
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let h = setup(Vec::new());

    let request = upload_request_with_field("archive", "game_12345_.zip", Some(TOKEN));
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file was found in the request.");
}

#[tokio::test]
async fn upload_sanitizes_punctuation_in_display_name() {
    let h = setup(Vec::new());

    let (status, body) = send(&h.app, upload_request("x_777_y.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["gameName"], "Other__Edition");
    assert_eq!(h.drive.files.lock().await[0].2.name, "Other__Edition.zip");
}

// ============================================================================
// GET /api/history and /api/history/page
// ============================================================================

#[tokio::test]
async fn history_returns_records_newest_first() {
    let h = setup(vec![old_record("Second"), old_record("First")]);

    let (status, body) = get(&h.app, "/api/history").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["gameName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[tokio::test]
async fn history_page_returns_slice_and_window() {
    let records: Vec<UploadRecord> = (1..=50).map(|i| old_record(&format!("Game {i}"))).collect();
    let h = setup(records);

    let (status, body) = get(&h.app, "/api/history/page?page=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 5);
    assert_eq!(body["pageSize"], 5);
    assert_eq!(body["totalItems"], 50);
    assert_eq!(body["totalPages"], 10);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["items"][0]["gameName"], "Game 21");
    assert_eq!(
        body["window"],
        serde_json::json!([1, "...", 4, 5, 6, "...", 10])
    );
}

#[tokio::test]
async fn history_page_out_of_range_falls_back_to_first() {
    let records: Vec<UploadRecord> = (1..=7).map(|i| old_record(&format!("Game {i}"))).collect();
    let h = setup(records);

    let (status, body) = get(&h.app, "/api/history/page?page=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["window"], serde_json::json!([1, 2]));
}

// ============================================================================
// GET /
// ============================================================================

#[tokio::test]
async fn index_page_lists_uploads_and_client_id() {
    let h = setup(vec![old_record("Half-Life")]);

    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("client-id.apps.googleusercontent.com"));
    assert!(html.contains("Half-Life"));
}

// ============================================================================
// Storage failures
// ============================================================================

#[tokio::test]
async fn history_endpoints_report_malformed_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let history_path = dir.path().join("history.json");
    std::fs::write(&history_path, "{not json").expect("Failed to write history");
    let app = build_app(
        dir.path(),
        Arc::new(JsonFileHistoryStore::new(history_path)),
        Arc::new(FakeDrive::default()),
    );

    let (status, body) = get(&app, "/api/history").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to access upload history");
    assert!(body["details"].as_str().unwrap().contains("malformed"));

    let (status, _) = get(&app, "/api/history/page?page=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn drive_create_failure_is_storage_error_without_history() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let drive = Arc::new(FailingDrive::new(|| {
        DriveError::Api("HTTP 503 Service Unavailable: backend error".into())
    }));
    let history = Arc::new(InMemoryHistoryStore::new());
    let app = build_app(dir.path(), history.clone(), drive.clone());

    let (status, body) = send(&app, upload_request("game_12345_v2.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Google Drive request failed");
    assert!(body["details"].as_str().unwrap().contains("backend error"));

    assert_eq!(drive.creates.load(Ordering::SeqCst), 1);
    assert!(history.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn drive_rejecting_token_is_unauthorized() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let drive = Arc::new(FailingDrive::new(|| {
        DriveError::Unauthorized("Invalid Credentials".into())
    }));
    let history = Arc::new(InMemoryHistoryStore::new());
    let app = build_app(dir.path(), history.clone(), drive);

    let (status, body) = send(&app, upload_request("game_12345_v2.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("Invalid Credentials"));
    assert!(body.get("details").is_none());
    assert!(history.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_append_failure_leaves_file_in_drive() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let drive = Arc::new(FakeDrive::default());
    let app = build_app(dir.path(), Arc::new(ReadOnlyHistory), drive.clone());

    let (status, body) = send(&app, upload_request("game_12345_v2.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to access upload history");
    assert_eq!(drive.files.lock().await.len(), 1);

    // The uploaded file is now found by the duplicate check.
    let (status, _) = send(&app, upload_request("game_12345_v2.zip", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(drive.files.lock().await.len(), 1);
}

// ============================================================================
// Command-line client against a live server
// ============================================================================

#[tokio::test]
async fn queue_uploads_through_http_client() {
    let existing: Vec<UploadRecord> = (1..=6).map(|i| old_record(&format!("Game {i}"))).collect();
    let h = setup(existing);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    let app = h.app.clone();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ApiClient::new(&format!("http://{addr}"), Duration::from_secs(10))
        .unwrap()
        .with_token(TOKEN);

    let files = ["game_12345_a.zip", "game_12345_b.zip", "game_99999_.zip"];
    let queue = UploadQueue::new();
    for name in files {
        let path = h.dir.path().join(name);
        std::fs::write(&path, b"PK\x03\x04data").unwrap();
        queue.add(path).await.unwrap();
    }

    let summary = queue.submit_all(&client).await.unwrap();
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);

    let statuses: Vec<UploadStatus> = queue.items().await.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![UploadStatus::Success, UploadStatus::Skipped, UploadStatus::Error]
    );
    let failed = &queue.items().await[2];
    assert!(failed.status_label().contains("99999"));

    // Paged with the server's page size: 7 records at 5 per page.
    let page = client.fetch_history_page(1).await.unwrap();
    assert_eq!(page.page_size, 5);
    assert_eq!(page.total_items, 7);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0].display_name, "My_Game");

    let all = client.fetch_history().await.unwrap();
    assert_eq!(all.len(), 7);
}
