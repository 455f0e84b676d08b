//! Configuration management for Rillet.
//!
//! Configuration is read from `~/.config/rillet/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::fetcher::DEFAULT_WORKERS;
use crate::normalizer::date;

pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subscriptions in display order.
    pub urls: Vec<String>,
    /// chrono strftime format for post dates.
    pub date_format: String,
    pub home: HomePage,
    pub reader: ReaderConfig,
    pub fetch: FetchConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            home: HomePage::default(),
            reader: ReaderConfig::default(),
            fetch: FetchConfig::default(),
            colors: ColorConfig::default(),
            keybindings: KeybindingConfig::default(),
        }
    }
}

/// Page shown at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomePage {
    #[default]
    Home,
    Mixed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Scroll fraction past which an opened post is marked read.
    pub read_threshold: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { read_threshold: 0.8 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub workers: usize,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/rillet/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("rillet").join("config.toml"))
    }

    /// Database location: the platform state directory, or the data
    /// directory where no state directory exists.
    pub fn default_db_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::state_dir()
            .or_else(dirs::data_dir)
            .ok_or(ConfigError::NoDataDir)?;
        Ok(base.join("rillet").join("rillet.db"))
    }

    /// Subscription URLs that parse, first occurrence wins.
    pub fn validated_urls(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::with_capacity(self.urls.len());

        for raw in &self.urls {
            let url = raw.trim();
            if let Err(e) = Url::parse(url) {
                tracing::warn!("Skipping invalid feed url {:?}: {}", raw, e);
                continue;
            }
            if seen.insert(url.to_string()) {
                urls.push(url.to_string());
            } else {
                tracing::debug!("Skipping duplicate feed url {}", url);
            }
        }

        urls
    }

    /// Like [`Config::validated_urls`], but an empty list is an error.
    pub fn require_urls(&self) -> Result<Vec<String>, ConfigError> {
        let urls = self.validated_urls();
        if urls.is_empty() {
            return Err(ConfigError::NoUrls);
        }
        Ok(urls)
    }

    /// The configured date format, or the fallback when chrono rejects it.
    pub fn display_date_format(&self) -> &str {
        if date::is_valid_format(&self.date_format) {
            &self.date_format
        } else {
            tracing::warn!(
                "Invalid date_format {:?}, using {}",
                self.date_format,
                date::FALLBACK_DATE_FORMAT
            );
            date::FALLBACK_DATE_FORMAT
        }
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# Rillet Configuration

# Feeds, shown in this order
urls = [
    # "https://example.com/feed.xml",
]

# chrono strftime format for post dates
date_format = "%d/%m/%Y"

# Startup page: "home" (feed list) or "mixed" (all posts by date)
home = "home"

[reader]
# Fraction of a post scrolled past before it is marked read
read_threshold = 0.8

[fetch]
# Feeds fetched concurrently
workers = 20
# Per-request timeout in seconds
timeout_secs = 30

# Colors can be named (Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray,
# DarkGray, LightRed, LightGreen, LightYellow, LightBlue, LightMagenta,
# LightCyan, White, Reset) or hex ("#RRGGBB", "#RGB").
[colors]
border = "Cyan"
title = "LightCyan"
selection_bg = "Cyan"
selection_fg = "Black"
unread_item = "White"
read_item = "DarkGray"
unread_marker = "Yellow"
error_item = "LightRed"
metadata_date = "Yellow"
metadata_link = "Blue"
status_fg = "White"
status_bg = "DarkGray"

# Keys are single characters ("x", "X", "/"), special keys (Enter, Tab,
# BackTab, Backspace, Delete, Home, End, PageUp, PageDown, Up, Down, Left,
# Right, Esc, Space, F1-F12), optionally with modifiers ("Ctrl+c", "Shift+Up").
[keybindings]
quit = ["q", "Ctrl+c"]
move_up = ["k", "Up"]
move_down = ["j", "Down"]
jump_up = ["K", "Shift+Up", "PageUp"]
jump_down = ["J", "Shift+Down", "PageDown"]
open = ["Enter", "l", "Right", "Tab"]
back = ["h", "Left", "BackTab", "Esc"]
refresh = ["r"]
refresh_all = ["R"]
search = ["/"]
toggle_read = ["x"]
read_all = ["X"]
open_in_browser = ["o"]
mixed = ["m"]
help = ["?"]
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No urls were found in config file")]
    NoUrls,
}
