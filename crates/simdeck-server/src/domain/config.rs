//! Server configuration.
//!
//! [`ServerConfig`] holds every runtime setting.  It is assembled once at
//! startup (defaults, then the optional TOML file, then CLI flags) and shared
//! read-only behind an `Arc` afterwards.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use simdeck_core::domain::geometry::DEFAULT_TITLE_BAR_HEIGHT;
use simdeck_core::protocol::stream::DEFAULT_STREAM_FPS;

/// Port used when neither `--port` nor `PORT` is given.
pub const DEFAULT_PORT: u16 = 3000;

/// All runtime configuration for the server.
///
/// # Example
///
/// ```rust
/// use simdeck_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 3000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.  Loopback by default:
    /// the API drives the host's pointer and keyboard.
    pub bind_addr: SocketAddr,

    /// Frame rate used when `startStream` omits `fps` (or sends `0`).
    pub default_fps: u32,

    /// Upper bound applied to any requested frame rate.
    pub max_fps: u32,

    /// Height of the Simulator.app title bar in host points.
    pub title_bar_height: f64,

    /// Wait between interrupting `simctl io recordVideo` and reading the file.
    pub ios_record_settle: Duration,

    /// Wait between interrupting `screenrecord` and pulling the file.
    pub android_record_settle: Duration,

    /// Number of `adb devices` polls while an emulator boots.
    pub boot_attempts: u32,

    /// Delay between boot polls.
    pub boot_poll_interval: Duration,

    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ServerConfig {
    /// | Field                  | Default          |
    /// |------------------------|------------------|
    /// | bind_addr              | `127.0.0.1:3000` |
    /// | default_fps            | 5                |
    /// | max_fps                | 30               |
    /// | title_bar_height       | 28.0             |
    /// | ios_record_settle      | 500 ms           |
    /// | android_record_settle  | 1000 ms          |
    /// | boot_attempts          | 60               |
    /// | boot_poll_interval     | 1 s              |
    /// | log_level              | `info`           |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            default_fps: DEFAULT_STREAM_FPS,
            max_fps: 30,
            title_bar_height: DEFAULT_TITLE_BAR_HEIGHT,
            ios_record_settle: Duration::from_millis(500),
            android_record_settle: Duration::from_millis(1000),
            boot_attempts: 60,
            boot_poll_interval: Duration::from_secs(1),
            log_level: "info".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_is_loopback_3000() {
        // Arrange / Act
        let cfg = ServerConfig::default();
        // Assert
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_default_stream_limits() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.default_fps, 5);
        assert_eq!(cfg.max_fps, 30);
    }

    #[test]
    fn test_default_record_settle_delays() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.ios_record_settle, Duration::from_millis(500));
        assert_eq!(cfg.android_record_settle, Duration::from_secs(1));
    }

    #[test]
    fn test_default_boot_polling_is_sixty_one_second_attempts() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.boot_attempts, 60);
        assert_eq!(cfg.boot_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_default_title_bar_and_log_level() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.title_bar_height, 28.0);
        assert_eq!(cfg.log_level, "info");
    }
}
