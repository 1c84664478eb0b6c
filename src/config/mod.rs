//! # Configuration Management Module
//!
//! Static configuration for the archive browser: which boards exist, where the
//! archived JSON snapshots live, how many threads fit on a page and which board
//! to fall back to when a location does not match any route.
//!
//! ## Configuration Structure
//!
//! - [`ArchiveConfig`] - Data location, boards, paging and search timing
//! - [`BoardConfig`] - A single board (id used in locations, display name)
//! - [`PreferencesConfig`] - Where the local preference store is kept
//! - [`LoggingConfig`] - Default log level
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bbsarchive::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Data: {}", config.archive.data_base_url);
//!     println!("Index URL: {}", config.index_url("tuna"));
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [archive]
//! data_base_url = "https://archive-data.tunaground.net/data"
//! threads_per_page = 20
//! default_board = "tuna"
//! search_debounce_ms = 150
//!
//! [[archive.boards]]
//! id = "tuna"
//! name = "Tuna"
//!
//! [preferences]
//! file = "preferences.json"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! The configuration is loaded once at startup and is not editable at runtime.

use anyhow::{Result, anyhow};
use percent_encoding::utf8_percent_encode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::router::COMPONENT;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Base of the snapshot tree: an `http(s)://` URL, a `file://` URL or a local directory
    pub data_base_url: String,
    #[serde(default = "default_threads_per_page")]
    pub threads_per_page: usize,
    pub default_board: String,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    pub boards: Vec<BoardConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_threads_per_page() -> usize { 20 }
fn default_search_debounce_ms() -> u64 { 150 }

impl Default for PreferencesConfig {
    fn default() -> Self {
        PreferencesConfig { file: Some("preferences.json".to_string()) }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".to_string() }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()
            .map_err(|e| anyhow!("Invalid config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Load configuration, falling back to built-in defaults when the file is absent
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::metadata(path).await.is_err() {
            log::debug!("No config file at {}, using defaults", path);
            return Ok(Config::default());
        }
        Self::load(path).await
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content).await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject configurations the browser cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.archive.threads_per_page == 0 {
            return Err(anyhow!("threads_per_page must be at least 1"));
        }
        if self.archive.boards.is_empty() {
            return Err(anyhow!("at least one board must be configured"));
        }
        if self.board(&self.archive.default_board).is_none() {
            return Err(anyhow!("default_board '{}' is not in the board list", self.archive.default_board));
        }
        Ok(())
    }

    pub fn board(&self, board_id: &str) -> Option<&BoardConfig> {
        self.archive.boards.iter().find(|b| b.id == board_id)
    }

    /// Display name for a board; unknown ids are shown as-is
    pub fn board_name<'a>(&'a self, board_id: &'a str) -> &'a str {
        self.board(board_id).map(|b| b.name.as_str()).unwrap_or(board_id)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.archive.search_debounce_ms)
    }

    fn base(&self) -> &str {
        self.archive.data_base_url.trim_end_matches('/')
    }

    /// `{base}/{board}/index.json`
    pub fn index_url(&self, board_id: &str) -> String {
        format!("{}/{}/index.json", self.base(), path_segment(board_id))
    }

    /// `{base}/{board}/{thread}.json`
    pub fn thread_url(&self, board_id: &str, thread_id: &str) -> String {
        format!("{}/{}/{}.json", self.base(), path_segment(board_id), path_segment(thread_id))
    }

    /// `{base}/{board}/attachment/{filename}` with the filename percent-encoded
    pub fn attachment_url(&self, board_id: &str, filename: &str) -> String {
        format!("{}/{}/attachment/{}", self.base(), path_segment(board_id), path_segment(filename))
    }
}

/// One URL path segment; dot segments are escaped too so they stay names
fn path_segment(value: &str) -> String {
    match value {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => utf8_percent_encode(value, COMPONENT).to_string(),
    }
}

impl Default for Config {
    fn default() -> Self {
        let boards = [("tuna", "Tuna"), ("situplay", "Situplay"), ("anchor", "Anchor")]
            .iter()
            .map(|(id, name)| BoardConfig { id: id.to_string(), name: name.to_string() })
            .collect();

        Config {
            archive: ArchiveConfig {
                data_base_url: "https://archive-data.tunaground.net/data".to_string(),
                threads_per_page: default_threads_per_page(),
                default_board: "tuna".to_string(),
                search_debounce_ms: default_search_debounce_ms(),
                boards,
            },
            preferences: PreferencesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
