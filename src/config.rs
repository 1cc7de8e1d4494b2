//! Configuration file parser for ~/.config/blackbird/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Paths probed by feed discovery when a page advertises no feed links.
pub const DEFAULT_DISCOVERY_PATHS: [&str; 6] =
    ["/feed", "/rss", "/atom.xml", "/feed.xml", "/rss.xml", "/index.xml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

/// Settings shared by every network entry point of the pipeline.
///
/// Keys left out of the file keep their default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-request timeout covering connect, send and body read.
    pub request_timeout_secs: u64,

    /// Feed bodies larger than this are rejected.
    pub max_feed_size_bytes: usize,

    pub user_agent: String,

    /// Permit requests to localhost and private address ranges.
    pub allow_private_hosts: bool,

    /// Look for icons on `https://{host}` regardless of the feed's scheme.
    pub icon_force_https: bool,

    /// Conventional feed paths probed by discovery, in order.
    pub discovery_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_feed_size_bytes: 10 * 1024 * 1024,
            user_agent: concat!("blackbird/", env!("CARGO_PKG_VERSION")).to_string(),
            allow_private_hosts: false,
            icon_force_https: true,
            discovery_paths: DEFAULT_DISCOVERY_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "request_timeout_secs",
        "max_feed_size_bytes",
        "user_agent",
        "allow_private_hosts",
        "icon_force_https",
        "discovery_paths",
    ];

    /// `~/.config/blackbird/config.toml`, or `None` without a `HOME`.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("blackbird")
                .join("config.toml"),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    ///
    /// Files over 1 MB are refused without being read. Everything else is
    /// handled by [`from_toml`](Self::from_toml).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text. Blank text yields defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            timeout_secs = config.request_timeout_secs,
            allow_private_hosts = config.allow_private_hosts,
            "Loaded configuration"
        );
        Ok(config)
    }
}
