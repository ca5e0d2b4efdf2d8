use serde::{Deserialize, Serialize};

/// A row of the catalog: numeric identifier to display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(alias = "appid")]
    pub identifier: String,
    #[serde(alias = "name", rename = "displayName")]
    pub display_name: String,
}
