//! Configuration management for Zonekeeper services

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Key directory and external tool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KeyDirConfig {
    /// Directory holding the `.key`/`.private` pairs
    pub key_dir: PathBuf,
    /// Key generation binary, defaults to the BIND tool
    pub keygen_bin: String,
    /// Timestamp rewriting binary, defaults to the BIND tool
    pub settime_bin: String,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub keys: KeyDirConfig,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let key_dir = env::var("ZONEKEEPER_KEY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./keys"));

        let keygen_bin =
            env::var("ZONEKEEPER_KEYGEN_BIN").unwrap_or_else(|_| "dnssec-keygen".to_string());

        let settime_bin =
            env::var("ZONEKEEPER_SETTIME_BIN").unwrap_or_else(|_| "dnssec-settime".to_string());

        let log_level = env::var("LOG_LEVEL").ok();

        Ok(Self {
            keys: KeyDirConfig {
                key_dir,
                keygen_bin,
                settime_bin,
            },
            log_level,
        })
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}
