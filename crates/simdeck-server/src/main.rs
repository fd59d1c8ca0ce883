//! SimDeck entry point.
//!
//! Resolves configuration, finds or boots one device, binds it to a session
//! and serves the browser UI until Ctrl-C.
//!
//! # Startup
//!
//! ```text
//! main()
//!  └─ Cli::parse + load_config     -- defaults ← TOML file ← flags
//!  └─ Discovery::probe             -- xcrun simctl / adb on PATH?
//!  └─ Discovery::select            -- pinned id, running device, or boot
//!  └─ DeviceSession + CommandDispatcher
//!  └─ http_api::serve              -- until the shutdown watch flips
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simdeck_core::Platform;
use simdeck_server::application::{CommandDispatcher, DeviceDriver, DeviceSession};
use simdeck_server::domain::ServerConfig;
use simdeck_server::infrastructure::config_file::{load_config, FileConfig};
use simdeck_server::infrastructure::discovery::{Discovery, Selection};
use simdeck_server::infrastructure::driver::{AndroidDriver, IosDriver};
use simdeck_server::infrastructure::http_api::{serve, AppState};
use simdeck_server::infrastructure::process::SystemRunner;

/// Control an iOS simulator or Android emulator from the browser.
#[derive(Debug, Parser)]
#[command(name = "simdeck", version, about)]
struct Cli {
    /// HTTP port [default: 3000]
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind [default: 127.0.0.1]
    #[arg(long, env = "SIMDECK_BIND")]
    bind: Option<IpAddr>,

    /// Only consider iOS simulators
    #[arg(long, conflicts_with = "android")]
    ios: bool,

    /// Only consider Android emulators
    #[arg(long)]
    android: bool,

    /// Bind this simulator UDID or adb serial without discovery
    #[arg(long, value_name = "ID")]
    device: Option<String>,

    /// Boot this Android Virtual Device
    #[arg(long, value_name = "NAME")]
    avd: Option<String>,

    /// Frame rate when the browser does not ask for one
    #[arg(long)]
    fps: Option<u32>,

    /// Config file to read instead of the platform default
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_server_config(&self, file: &FileConfig) -> anyhow::Result<ServerConfig> {
        let mut config = file.to_server_config().context("invalid config file")?;
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(ip) = self.bind {
            config.bind_addr.set_ip(ip);
        }
        if let Some(fps) = self.fps {
            if fps == 0 {
                bail!("--fps must be at least 1");
            }
            config.default_fps = fps;
            config.max_fps = config.max_fps.max(fps);
        }
        Ok(config)
    }

    fn selection(&self) -> Selection {
        let platform = match (self.ios, self.android) {
            (true, _) => Some(Platform::Ios),
            (_, true) => Some(Platform::Android),
            _ => None,
        };
        Selection {
            platform,
            device: self.device.clone(),
            avd: self.avd.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = load_config(cli.config.as_deref()).context("failed to load config")?;
    let config = Arc::new(cli.into_server_config(&file)?);

    // `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("SimDeck starting");

    // ── Device ────────────────────────────────────────────────────────────────
    let discovery = Discovery::new(SystemRunner, Arc::clone(&config));
    let tools = discovery.probe().await;
    if !tools.any() {
        bail!("no device tooling found: install Xcode (xcrun simctl) or the Android SDK (adb)");
    }
    info!(simctl = tools.simctl, adb = tools.adb, "device tooling detected");

    let device = discovery
        .select(tools, &cli.selection())
        .await
        .context("no device available")?;
    info!(
        platform = %device.platform,
        device = %device.id,
        name = device.display_name(),
        "device selected"
    );

    let driver: Arc<dyn DeviceDriver> = match device.platform {
        Platform::Ios => Arc::new(IosDriver::new(SystemRunner, &device.id, Arc::clone(&config))),
        Platform::Android => Arc::new(AndroidDriver::new(
            SystemRunner,
            &device.id,
            Arc::clone(&config),
        )),
    };
    let session = Arc::new(DeviceSession::new(driver, Arc::clone(&config)));
    if let Err(e) = session.refresh_screen().await {
        info!(error = %e, "screen size not available yet");
    }
    let dispatcher = Arc::new(CommandDispatcher::new(session));

    // ── Shutdown ──────────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!(error = %e, "cannot listen for Ctrl-C");
                // Holding the sender keeps the server up.
                std::future::pending::<()>().await;
            }
        }
    });

    // ── HTTP ──────────────────────────────────────────────────────────────────
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("SimDeck ready at http://{}  Press Ctrl-C to exit.", config.bind_addr);

    serve(listener, AppState::new(dispatcher, shutdown_rx.clone()), shutdown_rx)
        .await
        .context("HTTP server failed")?;

    info!("SimDeck stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file_values() {
        // Arrange
        let cli = Cli::parse_from(["simdeck", "--port", "8080", "--bind", "0.0.0.0", "--fps", "10"]);
        let file: FileConfig = toml::from_str("[server]\nport = 4000\n").unwrap();

        // Act
        let config = cli.into_server_config(&file).unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.default_fps, 10);
    }

    #[test]
    fn test_file_values_apply_without_flags() {
        let cli = Cli::parse_from(["simdeck", "--config", "/tmp/simdeck.toml"]);
        let file: FileConfig = toml::from_str("[server]\nport = 4000\n").unwrap();

        let config = cli.into_server_config(&file).unwrap();

        assert_eq!(config.bind_addr.port(), 4000);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/simdeck.toml")));
    }

    #[test]
    fn test_fps_above_max_raises_max() {
        let cli = Cli::parse_from(["simdeck", "--fps", "60"]);
        let config = cli.into_server_config(&FileConfig::default()).unwrap();
        assert_eq!(config.max_fps, 60);
    }

    #[test]
    fn test_zero_fps_is_rejected() {
        let cli = Cli::parse_from(["simdeck", "--fps", "0"]);
        assert!(cli.into_server_config(&FileConfig::default()).is_err());
    }

    #[test]
    fn test_platform_flags_conflict() {
        assert!(Cli::try_parse_from(["simdeck", "--ios", "--android"]).is_err());
    }

    #[test]
    fn test_selection_carries_platform_and_pins() {
        let cli = Cli::parse_from(["simdeck", "--android", "--avd", "Pixel_7_API_34"]);

        let selection = cli.selection();

        assert_eq!(selection.platform, Some(Platform::Android));
        assert_eq!(selection.avd.as_deref(), Some("Pixel_7_API_34"));
        assert_eq!(selection.device, None);
    }
}
