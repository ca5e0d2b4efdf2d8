//! Append-only upload history.
//!
//! The JSON file holds an array of records, newest first. Each append reads
//! the whole file, prepends the new record and rewrites it.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::models::UploadRecord;

/// Errors reading or writing the history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Storage for completed uploads.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All records, most recent first.
    async fn load(&self) -> Result<Vec<UploadRecord>, HistoryError>;

    /// Prepend a record.
    async fn append(&self, record: UploadRecord) -> Result<(), HistoryError>;
}

/// History kept in a pretty-printed JSON array on disk.
pub struct JsonFileHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_records(&self) -> Result<Vec<UploadRecord>, HistoryError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn load(&self) -> Result<Vec<UploadRecord>, HistoryError> {
        self.read_records().await
    }

    async fn append(&self, record: UploadRecord) -> Result<(), HistoryError> {
        // Serializes read-modify-write within this process only.
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        records.insert(0, record);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(&self.path, json).await?;

        debug!(
            "Wrote {} history records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// History held in memory.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<UploadRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<UploadRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self) -> Result<Vec<UploadRecord>, HistoryError> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: UploadRecord) -> Result<(), HistoryError> {
        self.records.write().await.insert(0, record);
        Ok(())
    }
}
