//! Configuration management for gamedrop using the prefer crate.
//!
//! Values come from three layers, later ones winning: built-in defaults, a
//! `gamedrop` config file discovered by prefer, and environment variables.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::drive::DriveConfig;

/// Default number of history rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Default maximum accepted upload size (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Default bind address for the web server.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port for the web server.
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable holding the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
/// Environment variable holding the destination Drive folder.
pub const ENV_FOLDER_ID: &str = "GOOGLE_DRIVE_FOLDER_ID";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// History filename inside the data directory.
    pub history_filename: String,
    /// Path to the catalog CSV.
    pub catalog_path: PathBuf,
    /// Drive folder receiving uploads.
    pub folder_id: String,
    /// OAuth client identifier published to the browser.
    pub client_id: String,
    /// Drive endpoints and timeout.
    pub drive: DriveConfig,
    /// History rows per page.
    pub page_size: usize,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// Address the web server binds to.
    pub host: String,
    /// Port the web server listens on.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/.local/share/gamedrop (or platform equivalent)
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("gamedrop");

        Self {
            catalog_path: data_dir.join("game_data.csv"),
            data_dir,
            history_filename: "history.json".to_string(),
            folder_id: String::new(),
            client_id: String::new(),
            drive: DriveConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            catalog_path: data_dir.join("game_data.csv"),
            data_dir,
            ..Default::default()
        }
    }

    /// Get the full path to the history file.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }

    /// Apply `GOOGLE_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        if let Some(id) = non_empty(ENV_CLIENT_ID) {
            self.client_id = id;
        }
        if let Some(folder) = non_empty(ENV_FOLDER_ID) {
            self.folder_id = folder;
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target directory for data.
    #[serde(default)]
    pub target: Option<String>,
    /// History filename.
    #[serde(default)]
    pub history: Option<String>,
    /// Catalog CSV path.
    #[serde(default)]
    pub catalog: Option<String>,
    /// Destination Drive folder.
    #[serde(default)]
    pub folder_id: Option<String>,
    /// OAuth client identifier.
    #[serde(default)]
    pub client_id: Option<String>,
    /// History rows per page.
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Maximum upload size in bytes.
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,
    /// Drive endpoint configuration.
    #[serde(default)]
    pub drive: Option<DriveConfig>,
    /// Web server bind address.
    #[serde(default)]
    pub host: Option<String>,
    /// Web server port.
    #[serde(default)]
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers gamedrop config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("gamedrop").await {
            Ok(pref_config) => {
                let target: Option<String> = pref_config.get("target").await.ok();
                let history: Option<String> = pref_config.get("history").await.ok();
                let catalog: Option<String> = pref_config.get("catalog").await.ok();
                let folder_id: Option<String> = pref_config.get("folder_id").await.ok();
                let client_id: Option<String> = pref_config.get("client_id").await.ok();
                let page_size: Option<usize> = pref_config.get("page_size").await.ok();
                let max_upload_bytes: Option<usize> =
                    pref_config.get("max_upload_bytes").await.ok();
                let drive: Option<DriveConfig> = pref_config.get("drive").await.ok();
                let host: Option<String> = pref_config.get("host").await.ok();
                let port: Option<u16> = pref_config.get("port").await.ok();

                Config {
                    target,
                    history,
                    catalog,
                    folder_id,
                    client_id,
                    page_size,
                    max_upload_bytes,
                    drive,
                    host,
                    port,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref target) = self.target {
            let path = shellexpand::tilde(target);
            settings.data_dir = PathBuf::from(path.as_ref());
            settings.catalog_path = settings.data_dir.join("game_data.csv");
        }
        if let Some(ref history) = self.history {
            settings.history_filename = history.clone();
        }
        if let Some(ref catalog) = self.catalog {
            let path = shellexpand::tilde(catalog);
            settings.catalog_path = PathBuf::from(path.as_ref());
        }
        if let Some(ref folder_id) = self.folder_id {
            settings.folder_id = folder_id.clone();
        }
        if let Some(ref client_id) = self.client_id {
            settings.client_id = client_id.clone();
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size.max(1);
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
        if let Some(ref drive) = self.drive {
            settings.drive = drive.clone();
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
    }
}

/// Load settings from configuration file and environment.
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings.apply_env();
    settings
}
