//! Domain models for uploads, history pages, the catalog and the upload queue.

mod catalog_entry;
mod history_page;
mod upload_item;
mod upload_record;

pub use catalog_entry::CatalogEntry;
pub use history_page::HistoryPage;
pub use upload_item::{UploadStatus, UploadableItem};
pub use upload_record::UploadRecord;
