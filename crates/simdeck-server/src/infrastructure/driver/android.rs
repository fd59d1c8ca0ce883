//! Android emulator driver over `adb`.
//!
//! Every call is `adb -s <serial> ...`.  Input is injected in framebuffer
//! pixels with `input tap|swipe|text|keyevent`; screenshots and UI dumps are
//! written to `/sdcard`, pulled to a host temp file and removed from the
//! device.
//!
//! `adb shell` joins its arguments and hands them to the device shell, so any
//! free text that ends up there is escaped first (see [`escape_input_text`]
//! and [`device_shell_quote`]).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use simdeck_core::domain::geometry::ANDROID_DEFAULT_FRAMEBUFFER;
use simdeck_core::keymap::KeyMapper;
use simdeck_core::{parse_ui_dump, DevicePoint, Platform, ScreenGeometry, UiElement};

use crate::application::driver::{
    AndroidDeviceInfo, AppList, DeviceDriver, DeviceInfo, DriverError, RecordingHandle,
    RecordingOutput, SwipeOutcome,
};
use crate::domain::requests::{LaunchTarget, SwipeGesture};
use crate::domain::ServerConfig;
use crate::infrastructure::capture;
use crate::infrastructure::driver::finish_recorder;
use crate::infrastructure::process::{argv, CommandRunner, SystemRunner};

pub const ADB: &str = "adb";

const UNKNOWN_PROP: &str = "Unknown";

/// Escapes text for `adb shell input text`.
///
/// Backslash and quotes are backslash-escaped, spaces become `%s` (the
/// `input` tool's own space token) and `& < > | ;` are escaped so the device
/// shell passes them through.
pub fn escape_input_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            ' ' => out.push_str("%s"),
            '&' | '<' | '>' | '|' | ';' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// A fresh `/sdcard` path per capture, so overlapping captures never share
/// a device file.
fn remote_path(stem: &str, ext: &str) -> String {
    format!("/sdcard/simdeck_{stem}_{}.{ext}", Uuid::new_v4().simple())
}

/// Single-quotes `s` for the device shell.
pub fn device_shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'\''"#))
}

pub struct AndroidDriver<R = SystemRunner> {
    runner: R,
    serial: String,
    config: Arc<ServerConfig>,
}

impl<R: CommandRunner> AndroidDriver<R> {
    pub fn new(runner: R, serial: impl Into<String>, config: Arc<ServerConfig>) -> Self {
        Self {
            runner,
            serial: serial.into(),
            config,
        }
    }

    async fn adb<I, S>(&self, args: I) -> Result<String, DriverError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut full = argv(["-s", self.serial.as_str()]);
        full.extend(args.into_iter().map(Into::into));
        self.runner.run(ADB, &full).await
    }

    async fn shell<I, S>(&self, args: I) -> Result<String, DriverError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut full = vec!["shell".to_string()];
        full.extend(args.into_iter().map(Into::into));
        self.adb(full).await
    }

    async fn getprop(&self, name: &str) -> String {
        match self.shell(["getprop", name]).await {
            Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
            Ok(_) => UNKNOWN_PROP.to_string(),
            Err(e) => {
                debug!(prop = name, error = %e, "getprop failed");
                UNKNOWN_PROP.to_string()
            }
        }
    }

    /// Runs `produce` on the device to write a fresh file, pulls it and
    /// returns its bytes. The device file is removed on every path.
    async fn capture(&self, produce: &[&str], stem: &str, ext: &str) -> Result<Vec<u8>, DriverError> {
        let remote = remote_path(stem, ext);
        let mut args = produce.to_vec();
        args.push(remote.as_str());
        let pulled = match self.shell(args).await {
            Ok(_) => self.pull(&remote, stem, ext).await,
            Err(e) => Err(e),
        };
        self.remove_remote(&remote).await;
        pulled
    }

    async fn pull_and_remove(&self, remote: &str, label: &str, ext: &str) -> Result<Vec<u8>, DriverError> {
        let pulled = self.pull(remote, label, ext).await;
        self.remove_remote(remote).await;
        pulled
    }

    async fn pull(&self, remote: &str, label: &str, ext: &str) -> Result<Vec<u8>, DriverError> {
        let local = capture::reserve(label, ext)?;
        let local_arg = local.to_string_lossy().into_owned();
        self.adb(["pull", remote, local_arg.as_str()]).await?;
        capture::consume(local, "adb pull").await
    }

    async fn remove_remote(&self, remote: &str) {
        if let Err(e) = self.shell(["rm", "-f", remote]).await {
            warn!(remote, error = %e, "could not remove device file");
        }
    }
}

#[async_trait]
impl<R: CommandRunner> DeviceDriver for AndroidDriver<R> {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn device_id(&self) -> &str {
        &self.serial
    }

    async fn device_info(&self) -> Result<DeviceInfo, DriverError> {
        let (model, manufacturer, sdk_version, android_version) = tokio::join!(
            self.getprop("ro.product.model"),
            self.getprop("ro.product.manufacturer"),
            self.getprop("ro.build.version.sdk"),
            self.getprop("ro.build.version.release"),
        );
        Ok(DeviceInfo::Android(AndroidDeviceInfo {
            id: self.serial.clone(),
            model,
            manufacturer,
            sdk_version,
            android_version,
            kind: "android",
        }))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.capture(&["screencap", "-p"], "screenshot", "png").await
    }

    async fn tap(&self, point: DevicePoint, _screen: ScreenGeometry) -> Result<(), DriverError> {
        self.shell(["input".to_string(), "tap".into(), point.x.to_string(), point.y.to_string()])
            .await
            .map(drop)
    }

    async fn swipe(
        &self,
        gesture: &SwipeGesture,
        _screen: ScreenGeometry,
    ) -> Result<SwipeOutcome, DriverError> {
        let (start, end) = (gesture.start(), gesture.end());
        self.shell([
            "input".to_string(),
            "swipe".into(),
            start.x.to_string(),
            start.y.to_string(),
            end.x.to_string(),
            end.y.to_string(),
            gesture.duration_ms.to_string(),
        ])
        .await?;
        Ok(SwipeOutcome::default())
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        let arg = format!("\"{}\"", escape_input_text(text));
        self.shell(["input", "text", arg.as_str()]).await.map(drop)
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        let event = KeyMapper::android(key).to_string();
        self.shell(["input", "keyevent", event.as_str()]).await.map(drop)
    }

    async fn launch(&self, target: &LaunchTarget) -> Result<(), DriverError> {
        let package = target
            .android_package()
            .ok_or_else(|| DriverError::InvalidArgument("packageName is required".into()))?;
        match target.activity() {
            Some(activity) => {
                let component = format!("{package}/{activity}");
                self.shell(["am", "start", "-n", component.as_str()]).await?;
            }
            None => {
                self.shell([
                    "monkey",
                    "-p",
                    package,
                    "-c",
                    "android.intent.category.LAUNCHER",
                    "1",
                ])
                .await?;
            }
        }
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<(), DriverError> {
        let quoted = device_shell_quote(url);
        self.shell([
            "am",
            "start",
            "-a",
            "android.intent.action.VIEW",
            "-d",
            quoted.as_str(),
        ])
        .await
        .map(drop)
    }

    async fn list_apps(&self) -> Result<AppList, DriverError> {
        let output = self.shell(["pm", "list", "packages", "-3"]).await?;
        let apps = output
            .lines()
            .map(|line| line.trim().trim_start_matches("package:").trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Ok(AppList::Packages { apps })
    }

    async fn screen_size(&self) -> Result<ScreenGeometry, DriverError> {
        let output = self.shell(["wm", "size"]).await?;
        Ok(ScreenGeometry::parse_wxh(&output).unwrap_or_else(|| {
            debug!(output = output.trim(), "unrecognised wm size output; using default");
            ANDROID_DEFAULT_FRAMEBUFFER
        }))
    }

    async fn start_recording(&self) -> Result<RecordingHandle, DriverError> {
        let remote = remote_path("recording", "mp4");
        let child = self.runner.spawn(
            ADB,
            &argv(["-s", self.serial.as_str(), "shell", "screenrecord", remote.as_str()]),
        )?;
        Ok(RecordingHandle::new(Some(child), RecordingOutput::DeviceFile(remote)))
    }

    async fn stop_recording(&self, handle: RecordingHandle) -> Result<Vec<u8>, DriverError> {
        let RecordingOutput::DeviceFile(remote) = &handle.output else {
            return Err(DriverError::command_failed(
                "screenrecord",
                "recording was not written to the device",
            ));
        };
        let remote = remote.clone();
        finish_recorder(handle.process, self.config.android_record_settle).await;
        self.pull_and_remove(&remote, "android-recording", "mp4").await
    }

    async fn install(&self, apk_path: &str) -> Result<(), DriverError> {
        if apk_path.trim().is_empty() {
            return Err(DriverError::InvalidArgument("apkPath is required".into()));
        }
        self.adb(["install", "-r", apk_path]).await.map(drop)
    }

    async fn uninstall(&self, package: &str) -> Result<(), DriverError> {
        if package.trim().is_empty() {
            return Err(DriverError::InvalidArgument("packageName is required".into()));
        }
        self.adb(["uninstall", package]).await.map(drop)
    }

    async fn elements(&self) -> Result<Vec<UiElement>, DriverError> {
        let xml = self.capture(&["uiautomator", "dump"], "ui", "xml").await?;
        Ok(parse_ui_dump(&String::from_utf8_lossy(&xml)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
