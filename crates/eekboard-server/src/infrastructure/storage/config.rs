//! TOML configuration for the keyboard service.
//!
//! The file is looked up at, in order:
//! - the path in the `EEKBOARD_CONFIG` environment variable;
//! - `$XDG_CONFIG_HOME/eekboard/config.toml`;
//! - `~/.config/eekboard/config.toml`.
//!
//! A missing file yields [`AppConfig::default()`]. Every field carries a
//! `#[serde(default = ...)]`, so a partial file only overrides what it names:
//!
//! ```toml
//! [bus]
//! session = true
//!
//! [repeat]
//! enabled = true
//! delay_ms = 500
//! interval_ms = 50
//!
//! [layouts]
//! directory = "/usr/share/eekboard/layouts"
//!
//! [log]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use eekboard_core::protocol::names::{SERVICE_NAME, SERVICE_PATH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::RepeatSettings;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "EEKBOARD_CONFIG";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `EEKBOARD_CONFIG`, `XDG_CONFIG_HOME` nor `HOME` is set.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub repeat: RepeatConfig,
    #[serde(default)]
    pub layouts: LayoutsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusConfig {
    /// Well-known name to request.
    #[serde(default = "default_bus_name")]
    pub name: String,
    /// Object path of the service object.
    #[serde(default = "default_bus_path")]
    pub path: String,
    /// `true` for the session bus, `false` for the system bus.
    #[serde(default = "default_true")]
    pub session: bool,
}

/// Key-repeat timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepeatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Milliseconds from press to the first repeat.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Milliseconds between repeats.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutsConfig {
    /// Where layout names passed to `AddKeyboard` are resolved.
    #[serde(default = "default_layouts_dir")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bus_name() -> String {
    SERVICE_NAME.to_string()
}
fn default_bus_path() -> String {
    SERVICE_PATH.to_string()
}
fn default_true() -> bool {
    true
}
fn default_delay_ms() -> u64 {
    500
}
fn default_interval_ms() -> u64 {
    50
}
fn default_layouts_dir() -> PathBuf {
    PathBuf::from("/usr/share/eekboard/layouts")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: default_bus_name(),
            path: default_bus_path(),
            session: default_true(),
        }
    }
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            delay_ms: default_delay_ms(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for LayoutsConfig {
    fn default() -> Self {
        Self {
            directory: default_layouts_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl From<&RepeatConfig> for RepeatSettings {
    fn from(cfg: &RepeatConfig) -> Self {
        RepeatSettings::new(
            cfg.enabled,
            Duration::from_millis(cfg.delay_ms),
            Duration::from_millis(cfg.interval_ms),
        )
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the directory holding the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file, honouring `EEKBOARD_CONFIG`.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from its default location.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config from `path`, returning defaults if it does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to its default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("eekboard"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
