use serde::{Deserialize, Serialize};

use super::UploadRecord;
use crate::pagination::{PageToken, Pagination};

/// One page of upload history with its navigation tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub page: u32,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: u32,
    pub items: Vec<UploadRecord>,
    pub window: Vec<PageToken>,
}

impl HistoryPage {
    /// Cut the current page out of `records`.
    pub fn new(records: &[UploadRecord], pagination: &Pagination) -> Self {
        Self {
            page: pagination.current_page(),
            page_size: pagination.page_size(),
            total_items: pagination.total_items(),
            total_pages: pagination.total_pages(),
            items: pagination.slice(records).to_vec(),
            window: pagination.window(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_page_wire_names() {
        let records: Vec<UploadRecord> = (0..12)
            .map(|i| UploadRecord::new(format!("Game_{}", i), "https://drive.google.com"))
            .collect();
        let page = HistoryPage::new(&records, &Pagination::at_page(5, records.len(), 3));

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["page"], 3);
        assert_eq!(value["pageSize"], 5);
        assert_eq!(value["totalItems"], 12);
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["items"].as_array().unwrap().len(), 2);
        assert_eq!(value["window"], serde_json::json!([1, 2, 3]));

        let parsed: HistoryPage = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, page);
    }
}
