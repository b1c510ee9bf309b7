//! Configuration for the AskDocs client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding `backend.base_url`
pub const API_URL_ENV: &str = "ASKDOCS_API_URL";

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend endpoint configuration
    pub backend: BackendConfig,
    /// Upload defaults
    pub upload: UploadConfig,
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend API
    pub base_url: String,
    /// Upload endpoint path
    pub upload_path: String,
    /// Query endpoint path
    pub query_path: String,
    /// Health endpoint path
    pub health_path: String,
    /// Index listing endpoint path
    pub documents_path: String,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            upload_path: "/api/upload".to_string(),
            query_path: "/api/query".to_string(),
            health_path: "/api/health".to_string(),
            documents_path: "/api/documents".to_string(),
            user_agent: format!("askdocs-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl BackendConfig {
    /// Join the base URL and an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Upload defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Advisory size limit; the backend enforces it, the client only warns
    pub max_file_size_bytes: u64,
    /// Title used for pasted text when none is given
    pub default_text_title: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * 1024 * 1024, // 5MB
            default_text_title: "Direct Input".to_string(),
        }
    }
}

impl ClientConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("askdocs").join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("invalid config: {}", e)))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present, otherwise built-in defaults. `ASKDOCS_API_URL` wins over the
    /// file for the base URL.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::read_file(&default)?,
                _ => Self::default(),
            },
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_api_url(&url);
        }

        Ok(config)
    }

    /// Override the backend base URL; blank values are ignored
    pub fn apply_api_url(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.backend.base_url = url.to_string();
        }
    }

    fn read_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&raw)
    }
}
