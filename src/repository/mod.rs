//! Storage for upload history and the game catalog.
//!
//! Both stores sit behind traits so the server can be wired to flat files in
//! production and to in-memory fakes in tests.

pub mod catalog;
pub mod history;

pub use catalog::{CatalogError, CatalogLookup, CsvCatalog};
pub use history::{HistoryError, HistoryStore, InMemoryHistoryStore, JsonFileHistoryStore};
