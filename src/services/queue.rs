//! Client-side upload queue.
//!
//! Files are added as `pending` and submitted one at a time, in the order they
//! were added, by a single worker. Only one submission run may be active; the
//! queue cannot be edited while it runs.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{UploadStatus, UploadableItem};

/// Errors from queue operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("the queue is currently uploading")]
    Busy,
    #[error("only .zip archives can be queued: {0}")]
    NotAnArchive(String),
}

/// Response of the upload endpoint for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub error: Option<String>,
}

/// Something that can send one queued file to the upload endpoint.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Send the file at `path`. `Err` means the request could not be completed.
    async fn submit(&self, path: &Path, file_name: &str) -> Result<SubmitResponse, String>;
}

/// Counts of terminal outcomes for one submission run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl QueueSummary {
    pub fn total(&self) -> usize {
        self.uploaded + self.skipped + self.failed
    }

    fn record(&mut self, status: UploadStatus) {
        if !status.is_terminal() {
            return;
        }
        match status {
            UploadStatus::Success => self.uploaded += 1,
            UploadStatus::Skipped => self.skipped += 1,
            _ => self.failed += 1,
        }
    }
}

/// Map an endpoint response to the item's terminal status and message.
pub fn classify_response(result: Result<SubmitResponse, String>) -> (UploadStatus, String) {
    match result {
        Ok(resp) if resp.status == 201 => (UploadStatus::Success, "Uploaded".to_string()),
        Ok(resp) if resp.status == 409 => (
            UploadStatus::Skipped,
            "Skipped (already exists)".to_string(),
        ),
        Ok(resp) => {
            let reason = resp
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("Upload failed (HTTP {})", resp.status));
            (UploadStatus::Error, format!("Failed: {}", reason))
        }
        Err(reason) => (UploadStatus::Error, format!("Failed: {}", reason)),
    }
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Clears the submitting flag when a run ends, including on cancellation.
struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ordered list of files awaiting upload.
#[derive(Default)]
pub struct UploadQueue {
    items: Mutex<Vec<UploadableItem>>,
    submitting: AtomicBool,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Queue a file. Returns the new item's id.
    pub async fn add(&self, path: impl Into<PathBuf>) -> Result<String, QueueError> {
        let path = path.into();
        if !is_zip(&path) {
            return Err(QueueError::NotAnArchive(path.display().to_string()));
        }
        let item = UploadableItem::new(path);
        let id = item.id.clone();
        self.items.lock().await.push(item);
        Ok(id)
    }

    /// Remove an item. Refused while a submission run is active.
    pub async fn remove(&self, id: &str) -> Result<bool, QueueError> {
        if self.is_submitting() {
            return Err(QueueError::Busy);
        }
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() != before)
    }

    /// Snapshot of all items in insertion order.
    pub async fn items(&self) -> Vec<UploadableItem> {
        self.items.lock().await.clone()
    }

    pub async fn pending_count(&self) -> usize {
        self.items
            .lock()
            .await
            .iter()
            .filter(|item| item.status == UploadStatus::Pending)
            .count()
    }

    async fn set_status(&self, id: &str, status: UploadStatus, message: Option<String>) {
        let mut items = self.items.lock().await;
        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            if !item.transition(status, message) {
                debug!("Ignored transition of {} to {}", item.file_name(), status);
            }
        }
    }

    /// Submit every pending item through `sink`, one at a time.
    ///
    /// A failing item is marked `error` and the run continues with the next.
    pub async fn submit_all(&self, sink: &dyn UploadSink) -> Result<QueueSummary, QueueError> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(QueueError::Busy);
        }
        let _guard = SubmittingGuard(&self.submitting);

        let pending: Vec<(String, PathBuf, String)> = self
            .items
            .lock()
            .await
            .iter()
            .filter(|item| item.status == UploadStatus::Pending)
            .map(|item| (item.id.clone(), item.path.clone(), item.file_name()))
            .collect();

        let mut summary = QueueSummary::default();
        for (id, path, file_name) in pending {
            self.set_status(&id, UploadStatus::Uploading, Some("Sending...".to_string()))
                .await;

            let result = sink.submit(&path, &file_name).await;
            let (status, message) = classify_response(result);
            debug!("{}: {}", file_name, message);

            self.set_status(&id, status, Some(message)).await;
            summary.record(status);
        }

        info!(
            "Upload run finished: {} uploaded, {} skipped, {} failed",
            summary.uploaded, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}
