use std::fmt;
use std::str::FromStr;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Status of a queued file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Skipped,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Skipped => "skipped",
            UploadStatus::Error => "error",
        }
    }

    /// Terminal statuses are never left without re-adding the file.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Success | UploadStatus::Skipped | UploadStatus::Error
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (UploadStatus::Pending, UploadStatus::Uploading)
                | (UploadStatus::Uploading, UploadStatus::Success)
                | (UploadStatus::Uploading, UploadStatus::Skipped)
                | (UploadStatus::Uploading, UploadStatus::Error)
        )
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "uploading" => Ok(UploadStatus::Uploading),
            "success" => Ok(UploadStatus::Success),
            "skipped" => Ok(UploadStatus::Skipped),
            "error" => Ok(UploadStatus::Error),
            other => Err(format!("unknown upload status: {}", other)),
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A file selected for upload, tracked until it is removed from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadableItem {
    pub id: String,
    pub path: PathBuf,
    pub status: UploadStatus,
    pub message: Option<String>,
}

impl UploadableItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            path: path.into(),
            status: UploadStatus::Pending,
            message: None,
        }
    }

    /// File name as sent to the upload endpoint.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    /// Apply a status transition. Illegal transitions are ignored and return false.
    pub fn transition(&mut self, next: UploadStatus, message: Option<String>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.message = message;
        true
    }

    /// Status text for display: the message if set, otherwise the capitalized status.
    pub fn status_label(&self) -> String {
        if let Some(ref message) = self.message {
            return message.clone();
        }
        let status = self.status.as_str();
        let mut chars = status.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
