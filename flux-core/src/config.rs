//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "storage": { "dbFile": "flux_financial_database.xlsx", "googleSheetId": "..." },
//!   "server": { "host": "0.0.0.0", "port": 5000, "staticDir": "static" }
//! }
//! ```
//! Environment variables override the file. Relative paths are resolved
//! against the data directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_DB_FILE: &str = "flux_financial_database.xlsx";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_SPREADSHEET_TITLE: &str = "Flux Financial Database";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    storage: StorageSettings,
    #[serde(default)]
    server: ServerSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    db_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    google_sheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credentials_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spreadsheet_title: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    static_dir: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Flux configuration (resolved view of settings + environment)
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_file: PathBuf,
    pub google_sheet_id: Option<String>,
    /// Inline service-account JSON; takes precedence over `credentials_file`
    pub google_credentials_json: Option<String>,
    pub credentials_file: PathBuf,
    pub spreadsheet_title: String,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Config {
    /// Defaults rooted at `data_dir`, ignoring settings file and environment
    pub fn defaults(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            db_file: data_dir.join(DEFAULT_DB_FILE),
            google_sheet_id: None,
            google_credentials_json: None,
            credentials_file: data_dir.join(DEFAULT_CREDENTIALS_FILE),
            spreadsheet_title: DEFAULT_SPREADSHEET_TITLE.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: data_dir.join(DEFAULT_STATIC_DIR),
        }
    }

    /// Load config from the data directory, then apply environment overrides
    ///
    /// Recognized variables: FLUX_DB_FILE, GOOGLE_SHEET_ID,
    /// GOOGLE_CREDENTIALS_JSON, FLUX_CREDENTIALS_FILE, FLUX_STATIC_DIR,
    /// HOST and PORT.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, |key| std::env::var(key).ok())
    }

    fn load_with_env(data_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = read_settings(data_dir)?;
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let resolve = |p: String| {
            let path = PathBuf::from(p);
            if path.is_absolute() {
                path
            } else {
                data_dir.join(path)
            }
        };

        let mut config = Self::defaults(data_dir);

        if let Some(db_file) = env("FLUX_DB_FILE").or(raw.storage.db_file) {
            config.db_file = resolve(db_file);
        }
        config.google_sheet_id = env("GOOGLE_SHEET_ID").or(raw.storage.google_sheet_id);
        config.google_credentials_json = env("GOOGLE_CREDENTIALS_JSON");
        if let Some(file) = env("FLUX_CREDENTIALS_FILE").or(raw.storage.credentials_file) {
            config.credentials_file = resolve(file);
        }
        if let Some(title) = raw.storage.spreadsheet_title {
            config.spreadsheet_title = title;
        }

        if let Some(host) = env("HOST").or(raw.server.host) {
            config.host = host;
        }
        match env("PORT") {
            Some(port) => {
                config.port = port
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid PORT value: {}", port))?;
            }
            None => {
                if let Some(port) = raw.server.port {
                    config.port = port;
                }
            }
        }
        if let Some(dir) = env("FLUX_STATIC_DIR").or(raw.server.static_dir) {
            config.static_dir = resolve(dir);
        }

        Ok(config)
    }

    /// True when a spreadsheet ID and some form of credentials are present
    pub fn has_cloud_credentials(&self) -> bool {
        self.google_sheet_id.is_some()
            && (self.google_credentials_json.is_some() || self.credentials_file.exists())
    }

    /// Save config to the data directory
    /// Preserves other settings that Flux doesn't manage
    pub fn save(&self) -> Result<()> {
        let mut settings = read_settings(&self.data_dir)?;

        settings.storage.db_file = Some(self.relative(&self.db_file));
        settings.storage.google_sheet_id = self.google_sheet_id.clone();
        settings.storage.credentials_file = Some(self.relative(&self.credentials_file));
        settings.storage.spreadsheet_title = Some(self.spreadsheet_title.clone());
        settings.server.host = Some(self.host.clone());
        settings.server.port = Some(self.port);
        settings.server.static_dir = Some(self.relative(&self.static_dir));

        std::fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(self.data_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.data_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable {}: {}", settings_path.display(), e);
        SettingsFile::default()
    }))
}
