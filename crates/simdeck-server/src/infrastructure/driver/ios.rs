//! iOS simulator driver over `xcrun simctl` and host UI scripting.
//!
//! `simctl` covers screenshots, app launch, URLs, status bar and recording,
//! but it cannot inject touches.  Taps are therefore delivered as host mouse
//! clicks inside the Simulator.app window:
//!
//! 1. activate Simulator.app and read its front window frame (`osascript`),
//! 2. letterbox-fit the device's logical size into the content area and map
//!    the point to host coordinates ([`device_to_host`]),
//! 3. click there with `cliclick` when installed, else AppleScript
//!    `click at`.
//!
//! The window frame is read fresh for every tap and swipe, since the user may
//! move or resize the window at any time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use simdeck_core::domain::displays::ios_display_size;
use simdeck_core::domain::geometry::{device_to_host, IOS_DEFAULT_DISPLAY};
use simdeck_core::keymap::KeyMapper;
use simdeck_core::{DevicePoint, HostPoint, HostWindowGeometry, Platform, ScreenGeometry};

use crate::application::driver::{
    AppList, DeviceDriver, DeviceInfo, DriverError, IosDeviceInfo, RecordingHandle,
    RecordingOutput, SwipeOutcome,
};
use crate::domain::requests::{LaunchTarget, StatusBarOverride, SwipeGesture};
use crate::domain::ServerConfig;
use crate::infrastructure::capture;
use crate::infrastructure::discovery::{runtime_suffix, SimctlDeviceList};
use crate::infrastructure::driver::finish_recorder;
use crate::infrastructure::process::{argv, CommandRunner, SystemRunner};

pub const XCRUN: &str = "xcrun";
pub const OSASCRIPT: &str = "osascript";

/// Where Homebrew installs `cliclick` on Apple silicon and Intel hosts.
pub const CLICLICK_PATHS: &[&str] = &["/opt/homebrew/bin/cliclick", "/usr/local/bin/cliclick"];

pub const SWIPE_FALLBACK_NOTE: &str = "Swipe simulation via UI";

/// Brings Simulator.app forward and prints `x,y,width,height` of its front
/// window in host points.
const WINDOW_FRAME_SCRIPT: &str = r#"tell application "Simulator" to activate
delay 0.2
tell application "System Events"
    tell process "Simulator"
        set winPos to position of front window
        set winSize to size of front window
    end tell
end tell
return ((item 1 of winPos) as text) & "," & ((item 2 of winPos) as text) & "," & ((item 1 of winSize) as text) & "," & ((item 2 of winSize) as text)"#;

fn activate_script(delay: &str, body: Option<&str>) -> String {
    let mut script = format!("tell application \"Simulator\" to activate\ndelay {delay}");
    if let Some(body) = body {
        script.push_str("\ntell application \"System Events\"\n    ");
        script.push_str(body);
        script.push_str("\nend tell");
    }
    script
}

/// Escapes `text` for an AppleScript string literal.
pub fn applescript_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// First installed `cliclick`, if any.
pub fn detect_cliclick() -> Option<PathBuf> {
    CLICLICK_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

pub struct IosDriver<R = SystemRunner> {
    runner: R,
    udid: String,
    config: Arc<ServerConfig>,
    cliclick: Option<PathBuf>,
}

impl<R: CommandRunner> IosDriver<R> {
    /// Creates a driver for `udid`, probing the host for `cliclick`.
    pub fn new(runner: R, udid: impl Into<String>, config: Arc<ServerConfig>) -> Self {
        let cliclick = detect_cliclick();
        debug!(cliclick = ?cliclick, "pointer utility");
        Self {
            runner,
            udid: udid.into(),
            config,
            cliclick,
        }
    }

    /// Overrides the detected `cliclick` path.
    pub fn with_cliclick(mut self, cliclick: Option<PathBuf>) -> Self {
        self.cliclick = cliclick;
        self
    }

    async fn simctl<I, S>(&self, args: I) -> Result<String, DriverError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut full = vec!["simctl".to_string()];
        full.extend(args.into_iter().map(Into::into));
        self.runner.run(XCRUN, &full).await
    }

    async fn osascript(&self, script: &str) -> Result<String, DriverError> {
        self.runner.run(OSASCRIPT, &argv(["-e", script])).await
    }

    async fn booted_devices(&self) -> Result<SimctlDeviceList, DriverError> {
        let json = self.simctl(["list", "devices", "booted", "-j"]).await?;
        SimctlDeviceList::parse(&json)
    }

    async fn window_frame(&self) -> Result<HostWindowGeometry, DriverError> {
        let output = self.osascript(WINDOW_FRAME_SCRIPT).await?;
        let line = output.trim();
        HostWindowGeometry::parse_csv(line, self.config.title_bar_height).ok_or_else(|| {
            DriverError::Parse {
                what: "Simulator window frame".into(),
                detail: line.to_string(),
            }
        })
    }

    async fn click(&self, at: HostPoint) -> Result<(), DriverError> {
        let (x, y) = at.rounded();
        debug!(x, y, "host click");
        match &self.cliclick {
            Some(cliclick) => {
                let program = cliclick.to_string_lossy();
                self.runner.run(&program, &[format!("c:{x},{y}")]).await?;
            }
            None => {
                self.osascript(&format!(
                    "tell application \"System Events\"\n    click at {{{x}, {y}}}\nend tell"
                ))
                .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<R: CommandRunner> DeviceDriver for IosDriver<R> {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn device_id(&self) -> &str {
        &self.udid
    }

    async fn device_info(&self) -> Result<DeviceInfo, DriverError> {
        let list = self.booted_devices().await?;
        let (runtime, device) = list
            .find(&self.udid)
            .ok_or_else(|| DriverError::DeviceNotFound(self.udid.clone()))?;
        Ok(DeviceInfo::Ios(IosDeviceInfo {
            udid: device.udid.clone(),
            name: device.name.clone(),
            state: device.state.clone(),
            runtime: runtime_suffix(runtime).to_string(),
            device_type_identifier: device.device_type_identifier.clone(),
        }))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let path = capture::reserve("ios", "png")?;
        let target = path.to_string_lossy().into_owned();
        self.simctl(["io", self.udid.as_str(), "screenshot", target.as_str()])
            .await?;
        capture::consume(path, "simctl io screenshot").await
    }

    async fn tap(&self, point: DevicePoint, screen: ScreenGeometry) -> Result<(), DriverError> {
        let window = self.window_frame().await?;
        self.click(device_to_host(&window, screen, point)).await
    }

    async fn swipe(
        &self,
        gesture: &SwipeGesture,
        screen: ScreenGeometry,
    ) -> Result<SwipeOutcome, DriverError> {
        let Some(cliclick) = &self.cliclick else {
            self.osascript(&activate_script("0.1", None)).await?;
            return Ok(SwipeOutcome {
                note: Some(SWIPE_FALLBACK_NOTE.to_string()),
            });
        };

        let window = self.window_frame().await?;
        let (sx, sy) = device_to_host(&window, screen, gesture.start()).rounded();
        let (ex, ey) = device_to_host(&window, screen, gesture.end()).rounded();
        let (mx, my) = ((sx + ex) / 2, (sy + ey) / 2);
        // Three moves after the press; spread the duration across them.
        let wait = (gesture.duration_ms / 3).clamp(10, 1000);
        let args = vec![
            "-w".to_string(),
            wait.to_string(),
            format!("dd:{sx},{sy}"),
            format!("dm:{mx},{my}"),
            format!("dm:{ex},{ey}"),
            format!("du:{ex},{ey}"),
        ];
        self.runner.run(&cliclick.to_string_lossy(), &args).await?;
        Ok(SwipeOutcome::default())
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        let keystroke = format!("keystroke {}", applescript_string(text));
        self.osascript(&activate_script("0.2", Some(&keystroke)))
            .await
            .map(drop)
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        match KeyMapper::ios(key).applescript() {
            Some(statement) => self
                .osascript(&activate_script("0.1", Some(&statement)))
                .await
                .map(drop),
            None => {
                debug!(key, "no simulator shortcut for key; ignored");
                Ok(())
            }
        }
    }

    async fn launch(&self, target: &LaunchTarget) -> Result<(), DriverError> {
        let bundle = target
            .ios_bundle()
            .ok_or_else(|| DriverError::InvalidArgument("bundleId is required".into()))?;
        self.simctl(["launch", self.udid.as_str(), bundle]).await.map(drop)
    }

    async fn open_url(&self, url: &str) -> Result<(), DriverError> {
        self.simctl(["openurl", self.udid.as_str(), url]).await.map(drop)
    }

    async fn list_apps(&self) -> Result<AppList, DriverError> {
        let raw = self.simctl(["listapps", self.udid.as_str()]).await?;
        Ok(AppList::Raw { raw })
    }

    async fn screen_size(&self) -> Result<ScreenGeometry, DriverError> {
        let list = self.booted_devices().await?;
        Ok(match list.find(&self.udid) {
            Some((_, device)) => ios_display_size(&device.name),
            None => {
                debug!(udid = %self.udid, "device not in booted list; using default display");
                IOS_DEFAULT_DISPLAY
            }
        })
    }

    async fn start_recording(&self) -> Result<RecordingHandle, DriverError> {
        let path = capture::reserve("recording", "mp4")?;
        let target = path.to_string_lossy().into_owned();
        let child = self.runner.spawn(
            XCRUN,
            &argv([
                "simctl",
                "io",
                self.udid.as_str(),
                "recordVideo",
                "--force",
                target.as_str(),
            ]),
        )?;
        Ok(RecordingHandle::new(Some(child), RecordingOutput::HostFile(path)))
    }

    async fn stop_recording(&self, handle: RecordingHandle) -> Result<Vec<u8>, DriverError> {
        let RecordingHandle { process, output, .. } = handle;
        let RecordingOutput::HostFile(path) = output else {
            return Err(DriverError::command_failed(
                "simctl io recordVideo",
                "recording has no host file",
            ));
        };
        finish_recorder(process, self.config.ios_record_settle).await;
        capture::consume(path, "simctl io recordVideo").await
    }

    async fn override_status_bar(&self, status: &StatusBarOverride) -> Result<(), DriverError> {
        let mut args = argv(["status_bar", self.udid.as_str(), "override"]);
        if let Some(time) = status.time.as_deref().filter(|t| !t.is_empty()) {
            args.extend(argv(["--time", time]));
        }
        if let Some(level) = status.battery {
            args.extend(["--batteryLevel".to_string(), level.to_string()]);
        }
        if let Some(wifi) = status.wifi {
            args.extend(argv(["--wifiMode", if wifi { "active" } else { "failed" }]));
        }
        self.simctl(args).await.map(drop)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
