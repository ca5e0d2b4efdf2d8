//! Catalog lookup: numeric identifier to display name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::ReaderBuilder;
use thiserror::Error;
use tracing::warn;

use crate::models::CatalogEntry;

/// Errors reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("catalog parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog task failed: {0}")]
    Task(String),
}

/// Read-only access to catalog entries.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Find the entry with exactly this identifier.
    async fn lookup(&self, identifier: &str) -> Result<Option<CatalogEntry>, CatalogError>;
}

/// Catalog backed by a CSV file with an `appid,name` header.
///
/// The file is re-read on every lookup so edits take effect without a restart.
#[derive(Debug, Clone)]
pub struct CsvCatalog {
    path: PathBuf,
}

impl CsvCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse every row of the catalog file.
    ///
    /// Rows that do not form an entry are skipped with a warning so one bad
    /// line does not hide the rest of the catalog.
    pub fn read_entries(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
        let file = std::fs::File::open(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut entries = Vec::new();
        for row in reader.deserialize::<CatalogEntry>() {
            match row {
                Ok(entry) => entries.push(entry),
                Err(e) if is_row_error(&e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or_default();
                    warn!("Skipping catalog row at {}:{}: {}", path.display(), line, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(entries)
    }
}

/// Errors confined to a single row, as opposed to failures reading the file.
fn is_row_error(err: &csv::Error) -> bool {
    matches!(
        err.kind(),
        csv::ErrorKind::Deserialize { .. }
            | csv::ErrorKind::Utf8 { .. }
            | csv::ErrorKind::UnequalLengths { .. }
    )
}

#[async_trait]
impl CatalogLookup for CsvCatalog {
    async fn lookup(&self, identifier: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        let path = self.path.clone();
        let identifier = identifier.to_string();

        tokio::task::spawn_blocking(move || {
            let entries = Self::read_entries(&path)?;
            Ok(entries.into_iter().find(|e| e.identifier == identifier))
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_catalog(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game_data.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_lookup_by_appid() {
        let (_dir, path) = write_catalog("appid,name\n12345,My Game\n678,\"Other, The Game\"\n");
        let catalog = CsvCatalog::new(path);

        let entry = catalog.lookup("12345").await.unwrap().unwrap();
        assert_eq!(entry.display_name, "My Game");

        let entry = catalog.lookup("678").await.unwrap().unwrap();
        assert_eq!(entry.display_name, "Other, The Game");

        assert!(catalog.lookup("999").await.unwrap().is_none());
        assert!(catalog.lookup("1234").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accepts_descriptive_header() {
        let (_dir, path) = write_catalog("identifier,displayName\n42, Answer \n");
        let catalog = CsvCatalog::new(path);
        let entry = catalog.lookup("42").await.unwrap().unwrap();
        assert_eq!(entry.display_name, "Answer");
    }

    #[tokio::test]
    async fn test_short_row_does_not_hide_other_entries() {
        let (_dir, path) = write_catalog("appid,name\n12345,My Game\n999\n,\n777,Later Game\n");
        let catalog = CsvCatalog::new(path);

        let entry = catalog.lookup("12345").await.unwrap().unwrap();
        assert_eq!(entry.display_name, "My Game");
        let entry = catalog.lookup("777").await.unwrap().unwrap();
        assert_eq!(entry.display_name, "Later Game");
        assert!(catalog.lookup("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let catalog = CsvCatalog::new("/nonexistent/game_data.csv");
        assert!(matches!(
            catalog.lookup("1").await,
            Err(CatalogError::Read { .. })
        ));
    }
}
