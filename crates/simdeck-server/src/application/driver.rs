//! The platform driver contract.
//!
//! A [`DeviceDriver`] turns abstract device actions into concrete tool
//! invocations for one bound device.  There are two real implementations
//! (`IosDriver` over `xcrun simctl` + AppleScript, `AndroidDriver` over `adb`)
//! and a recording mock for tests; the session picks one at startup and never
//! switches.
//!
//! Platform-specific capabilities have default bodies that return
//! [`DriverError::UnsupportedOnPlatform`], so each driver only implements what
//! its platform can do.  The dispatcher checks the capability list before it
//! gets here; the defaults are a second line for direct callers.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tempfile::TempPath;
use thiserror::Error;
use tokio::process::Child;
use uuid::Uuid;

use simdeck_core::{DevicePoint, Platform, ScreenGeometry, UiElement};

use crate::domain::requests::{LaunchTarget, StatusBarOverride, SwipeGesture};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Every way a driver call can fail.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A required external tool is missing from `PATH`.
    #[error("{tool} is not available; install it and make sure it is on PATH")]
    DriverUnavailable { tool: String },

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The tool ran but exited non-zero or printed something unusable.
    #[error("{command} failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("{action} is not available on {platform}")]
    UnsupportedOnPlatform { action: String, platform: &'static str },

    /// Only emulator boot has a deadline.
    #[error("Timeout waiting for {0}")]
    Timeout(String),

    #[error("No recording in progress")]
    NoRecordingInProgress,

    #[error("Recording already in progress")]
    RecordingInProgress,

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The request itself is malformed (missing query, empty text).
    #[error("{0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse {what}: {detail}")]
    Parse { what: String, detail: String },
}

impl DriverError {
    pub fn unsupported(action: impl Into<String>, platform: Platform) -> Self {
        DriverError::UnsupportedOnPlatform {
            action: action.into(),
            platform: platform.label(),
        }
    }

    pub fn command_failed(command: impl Into<String>, detail: impl Into<String>) -> Self {
        DriverError::CommandFailed {
            command: command.into(),
            detail: detail.into(),
        }
    }

    /// HTTP status for the error envelope.
    ///
    /// Business outcomes (unsupported action, nothing recording, element
    /// missing) are `200` with `success: false`; malformed requests are `400`;
    /// anything that went wrong while executing is `500`.
    pub fn http_status(&self) -> u16 {
        match self {
            DriverError::UnsupportedOnPlatform { .. }
            | DriverError::NoRecordingInProgress
            | DriverError::RecordingInProgress
            | DriverError::DeviceNotFound(_)
            | DriverError::ElementNotFound(_) => 200,
            DriverError::InvalidArgument(_) => 400,
            DriverError::DriverUnavailable { .. }
            | DriverError::CommandFailed { .. }
            | DriverError::Timeout(_)
            | DriverError::Io(_)
            | DriverError::Parse { .. } => 500,
        }
    }
}

// ── Result payloads ───────────────────────────────────────────────────────────

/// `GET /api/device` payload for an iOS simulator: the booted device record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IosDeviceInfo {
    pub udid: String,
    pub name: String,
    pub state: String,
    /// Last dotted segment of the runtime key, e.g. `iOS-17-2`.
    pub runtime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type_identifier: Option<String>,
}

/// `GET /api/device` payload for an Android emulator.  Properties that could
/// not be read are `"Unknown"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidDeviceInfo {
    pub id: String,
    pub model: String,
    pub manufacturer: String,
    pub sdk_version: String,
    pub android_version: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeviceInfo {
    Ios(IosDeviceInfo),
    Android(AndroidDeviceInfo),
}

/// `GET /api/apps` payload, flattened into the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AppList {
    /// Third-party package names (Android).
    Packages { apps: Vec<String> },
    /// Unparsed `simctl listapps` output (iOS).
    Raw { raw: String },
}

/// Result of a swipe.  iOS without a pointer utility can only bring the
/// simulator forward, and says so in `note`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub note: Option<String>,
}

// ── Recording ─────────────────────────────────────────────────────────────────

/// Where a recording's bytes end up before they are read back.
#[derive(Debug)]
pub enum RecordingOutput {
    /// A host file written by `simctl io recordVideo`; removed on drop.
    HostFile(TempPath),
    /// A path on the device's `/sdcard`, pulled and removed on stop.
    DeviceFile(String),
    /// Test doubles that produce bytes without a file.
    InMemory,
}

impl RecordingOutput {
    pub fn host_path(&self) -> Option<PathBuf> {
        match self {
            RecordingOutput::HostFile(path) => Some(path.to_path_buf()),
            _ => None,
        }
    }
}

/// An in-progress recording.  At most one exists per server process; the
/// session owns it between `record/start` and `record/stop`.
#[derive(Debug)]
pub struct RecordingHandle {
    pub id: Uuid,
    pub started_at: Instant,
    /// The recorder subprocess.  Spawned with `kill_on_drop`, so a handle that
    /// is dropped without being stopped does not leave a recorder running.
    pub process: Option<Child>,
    pub output: RecordingOutput,
}

impl RecordingHandle {
    pub fn new(process: Option<Child>, output: RecordingOutput) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Instant::now(),
            process,
            output,
        }
    }
}

// ── The driver trait ──────────────────────────────────────────────────────────

/// Device actions for one bound simulator or emulator.
///
/// Every method that shells out reports tool failures as a [`DriverError`];
/// none of them panic.  No call has a deadline except emulator boot, which
/// lives in discovery.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    fn platform(&self) -> Platform;

    /// UDID (iOS) or adb serial (Android).
    fn device_id(&self) -> &str;

    async fn device_info(&self) -> Result<DeviceInfo, DriverError>;

    /// PNG bytes of the current screen.  The capture file is gone when this
    /// returns, on success or failure.
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// Taps at device-native `point`.  `screen` is the device size in the same
    /// units; iOS needs it to place the host click, Android ignores it.
    async fn tap(&self, point: DevicePoint, screen: ScreenGeometry) -> Result<(), DriverError>;

    async fn swipe(
        &self,
        gesture: &SwipeGesture,
        screen: ScreenGeometry,
    ) -> Result<SwipeOutcome, DriverError>;

    async fn type_text(&self, text: &str) -> Result<(), DriverError>;

    /// Presses a named key (`home`, `back`, ...).  Names a platform cannot
    /// express are accepted and ignored.
    async fn press_key(&self, key: &str) -> Result<(), DriverError>;

    async fn launch(&self, target: &LaunchTarget) -> Result<(), DriverError>;

    async fn open_url(&self, url: &str) -> Result<(), DriverError>;

    async fn list_apps(&self) -> Result<AppList, DriverError>;

    /// Screen size in device-native units.
    async fn screen_size(&self) -> Result<ScreenGeometry, DriverError>;

    async fn start_recording(&self) -> Result<RecordingHandle, DriverError>;

    /// Interrupts the recorder, waits for the file to finalise and returns
    /// the video bytes.
    async fn stop_recording(&self, handle: RecordingHandle) -> Result<Vec<u8>, DriverError>;

    async fn override_status_bar(&self, _status: &StatusBarOverride) -> Result<(), DriverError> {
        Err(DriverError::unsupported("statusbar", self.platform()))
    }

    async fn install(&self, _apk_path: &str) -> Result<(), DriverError> {
        Err(DriverError::unsupported("install", self.platform()))
    }

    async fn uninstall(&self, _package: &str) -> Result<(), DriverError> {
        Err(DriverError::unsupported("uninstall", self.platform()))
    }

    /// Labelled or interactive elements of the current screen.
    async fn elements(&self) -> Result<Vec<UiElement>, DriverError> {
        Err(DriverError::unsupported("elements", self.platform()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_are_http_200() {
        assert_eq!(DriverError::NoRecordingInProgress.http_status(), 200);
        assert_eq!(DriverError::RecordingInProgress.http_status(), 200);
        assert_eq!(DriverError::ElementNotFound("OK".into()).http_status(), 200);
        assert_eq!(
            DriverError::unsupported("tap-element", Platform::Ios).http_status(),
            200
        );
    }

    #[test]
    fn test_execution_errors_are_http_500() {
        assert_eq!(DriverError::command_failed("adb", "boom").http_status(), 500);
        assert_eq!(DriverError::Timeout("emulator".into()).http_status(), 500);
        assert_eq!(
            DriverError::DriverUnavailable { tool: "adb".into() }.http_status(),
            500
        );
    }

    #[test]
    fn test_invalid_argument_is_http_400() {
        assert_eq!(DriverError::InvalidArgument("Query is required".into()).http_status(), 400);
    }

    #[test]
    fn test_error_messages_match_api_wording() {
        assert_eq!(DriverError::NoRecordingInProgress.to_string(), "No recording in progress");
        assert_eq!(
            DriverError::ElementNotFound("Sign in".into()).to_string(),
            "Element not found: Sign in"
        );
        assert_eq!(
            DriverError::unsupported("tap-element", Platform::Ios).to_string(),
            "tap-element is not available on iOS"
        );
    }

    #[test]
    fn test_android_device_info_serializes_type_field() {
        let info = DeviceInfo::Android(AndroidDeviceInfo {
            id: "emulator-5554".into(),
            model: "sdk_gphone64_arm64".into(),
            manufacturer: "Google".into(),
            sdk_version: "34".into(),
            android_version: "14".into(),
            kind: "android",
        });
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["type"], "android");
        assert_eq!(json["sdkVersion"], "34");
    }

    #[test]
    fn test_app_list_variants_serialize_to_their_field() {
        let json = serde_json::to_value(AppList::Raw { raw: "x".into() }).unwrap();
        assert_eq!(json["raw"], "x");
        let json = serde_json::to_value(AppList::Packages { apps: vec!["a".into()] }).unwrap();
        assert_eq!(json["apps"][0], "a");
    }
}
