//! Optional TOML configuration file.
//!
//! Looked up at:
//! - Linux:    `$XDG_CONFIG_HOME/simdeck/config.toml` (or `~/.config/simdeck/...`)
//! - macOS:    `~/Library/Application Support/SimDeck/config.toml`
//! - Windows:  `%APPDATA%\SimDeck\config.toml`
//!
//! or wherever `--config` points.  Every key is optional:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1"
//! port = 3000
//! log_level = "info"
//!
//! [stream]
//! default_fps = 5
//! max_fps = 30
//!
//! [ios]
//! title_bar_height = 28.0
//! record_settle_ms = 500
//!
//! [android]
//! record_settle_ms = 1000
//! boot_attempts = 60
//! boot_poll_interval_ms = 1000
//! ```
//!
//! Values here override the built-in defaults; command-line flags override
//! values here.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::config::DEFAULT_PORT;
use crate::domain::ServerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
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

    #[error("invalid value for {key}: {detail}")]
    InvalidValue { key: &'static str, detail: String },
}

// ── Schema ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub stream: StreamSection,
    #[serde(default)]
    pub ios: IosSection,
    #[serde(default)]
    pub android: AndroidSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSection {
    #[serde(default = "default_fps")]
    pub default_fps: u32,
    #[serde(default = "default_max_fps")]
    pub max_fps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IosSection {
    #[serde(default = "default_title_bar_height")]
    pub title_bar_height: f64,
    #[serde(default = "default_ios_settle_ms")]
    pub record_settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndroidSection {
    #[serde(default = "default_android_settle_ms")]
    pub record_settle_ms: u64,
    #[serde(default = "default_boot_attempts")]
    pub boot_attempts: u32,
    #[serde(default = "default_boot_poll_interval_ms")]
    pub boot_poll_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind() -> String {
    Ipv4Addr::LOCALHOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    ServerConfig::default().log_level
}
fn default_fps() -> u32 {
    ServerConfig::default().default_fps
}
fn default_max_fps() -> u32 {
    ServerConfig::default().max_fps
}
fn default_title_bar_height() -> f64 {
    ServerConfig::default().title_bar_height
}
fn default_ios_settle_ms() -> u64 {
    ServerConfig::default().ios_record_settle.as_millis() as u64
}
fn default_android_settle_ms() -> u64 {
    ServerConfig::default().android_record_settle.as_millis() as u64
}
fn default_boot_attempts() -> u32 {
    ServerConfig::default().boot_attempts
}
fn default_boot_poll_interval_ms() -> u64 {
    ServerConfig::default().boot_poll_interval.as_millis() as u64
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            default_fps: default_fps(),
            max_fps: default_max_fps(),
        }
    }
}

impl Default for IosSection {
    fn default() -> Self {
        Self {
            title_bar_height: default_title_bar_height(),
            record_settle_ms: default_ios_settle_ms(),
        }
    }
}

impl Default for AndroidSection {
    fn default() -> Self {
        Self {
            record_settle_ms: default_android_settle_ms(),
            boot_attempts: default_boot_attempts(),
            boot_poll_interval_ms: default_boot_poll_interval_ms(),
        }
    }
}

impl FileConfig {
    /// Resolves the file's values into a runtime config.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if `server.bind` is not an IP address or
    /// a frame rate is zero.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let ip: IpAddr = self.server.bind.parse().map_err(|_| ConfigError::InvalidValue {
            key: "server.bind",
            detail: format!("{:?} is not an IP address", self.server.bind),
        })?;
        if self.stream.max_fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "stream.max_fps",
                detail: "must be at least 1".into(),
            });
        }
        if self.stream.default_fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "stream.default_fps",
                detail: "must be at least 1".into(),
            });
        }
        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, self.server.port),
            default_fps: self.stream.default_fps,
            max_fps: self.stream.max_fps,
            title_bar_height: self.ios.title_bar_height,
            ios_record_settle: Duration::from_millis(self.ios.record_settle_ms),
            android_record_settle: Duration::from_millis(self.android.record_settle_ms),
            boot_attempts: self.android.boot_attempts,
            boot_poll_interval: Duration::from_millis(self.android.boot_poll_interval_ms),
            log_level: self.server.log_level.clone(),
        })
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// The default config file location for this platform.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config file.
///
/// With `explicit` set, that file must exist.  Otherwise the platform default
/// location is read, and a missing file (or an undeterminable config
/// directory) yields [`FileConfig::default`].
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match config_file_path() {
            Ok(path) => (path, false),
            Err(ConfigError::NoPlatformConfigDir) => {
                debug!("no platform config directory; using defaults");
                return Ok(FileConfig::default());
            }
            Err(e) => return Err(e),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            debug!(path = %path.display(), "config file loaded");
            Ok(toml::from_str(&content)?)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(FileConfig::default())
        }
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("SimDeck"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("SimDeck")
        })
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("simdeck"))
    }

    #[cfg(not(any(unix, target_os = "windows")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_matches_builtin_defaults() {
        // Arrange
        let file: FileConfig = toml::from_str("").unwrap();

        // Act
        let cfg = file.to_server_config().unwrap();

        // Assert
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let file: FileConfig = toml::from_str("[stream]\nmax_fps = 12\n").unwrap();
        let cfg = file.to_server_config().unwrap();
        assert_eq!(cfg.max_fps, 12);
        assert_eq!(cfg.default_fps, 5);
        assert_eq!(cfg.bind_addr.port(), 3000);
    }

    #[test]
    fn test_all_sections_are_applied() {
        let text = r#"
            [server]
            bind = "0.0.0.0"
            port = 8080
            log_level = "debug"

            [ios]
            title_bar_height = 32.0
            record_settle_ms = 750

            [android]
            boot_attempts = 90
            boot_poll_interval_ms = 500
        "#;
        let cfg = toml::from_str::<FileConfig>(text).unwrap().to_server_config().unwrap();

        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.title_bar_height, 32.0);
        assert_eq!(cfg.ios_record_settle, Duration::from_millis(750));
        assert_eq!(cfg.boot_attempts, 90);
        assert_eq!(cfg.boot_poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_bad_bind_address_is_rejected() {
        let file: FileConfig = toml::from_str("[server]\nbind = \"localhost:1\"\n").unwrap();
        assert!(matches!(
            file.to_server_config(),
            Err(ConfigError::InvalidValue { key: "server.bind", .. })
        ));
    }

    #[test]
    fn test_zero_fps_is_rejected() {
        let file: FileConfig = toml::from_str("[stream]\ndefault_fps = 0\n").unwrap();
        assert!(file.to_server_config().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(toml::from_str::<FileConfig>("[server\nport = ").is_err());
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4000").unwrap();

        let cfg = load_config(Some(file.path())).unwrap();

        assert_eq!(cfg.server.port, 4000);
    }

    #[test]
    fn test_missing_explicit_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = load_config(Some(&missing)).unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
