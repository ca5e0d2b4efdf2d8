use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed upload as stored in the history file.
///
/// Field names on disk match the history files written by earlier versions
/// of the uploader, so existing `history.json` files load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "gameName")]
    pub display_name: String,
    #[serde(rename = "driveLink")]
    pub remote_link: String,
    #[serde(rename = "uploadDate")]
    pub uploaded_at: DateTime<Utc>,
}

impl UploadRecord {
    /// Create a record for an upload that finished just now.
    pub fn new(display_name: impl Into<String>, remote_link: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            remote_link: remote_link.into(),
            uploaded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_history_field_names() {
        let record = UploadRecord::new("My_Game", "https://drive.google.com/file/d/abc/view");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["gameName"], "My_Game");
        assert_eq!(value["driveLink"], "https://drive.google.com/file/d/abc/view");
        assert!(value["_id"].as_str().is_some());
        assert!(value["uploadDate"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_reads_existing_history_entry() {
        let json = r#"{
            "_id": "1718000000000",
            "gameName": "Old_Game",
            "driveLink": "https://drive.google.com/file/d/xyz/view",
            "uploadDate": "2024-06-10T06:13:20.000Z"
        }"#;
        let record: UploadRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "1718000000000");
        assert_eq!(record.display_name, "Old_Game");
        assert_eq!(record.uploaded_at.format("%Y-%m-%d").to_string(), "2024-06-10");
    }
}
