//! Recording driver for tests.
//!
//! `MockDriver` performs no I/O.  Every successful call is appended to an
//! in-memory log so tests can assert exactly which driver operations ran, and
//! in what order.  Set `should_fail` to make every call return
//! [`DriverError::CommandFailed`] without being logged.
//!
//! ```ignore
//! let driver = Arc::new(MockDriver::new(Platform::Android));
//! let session = DeviceSession::new(driver.clone(), Arc::new(ServerConfig::default()));
//! // ... dispatch ...
//! assert_eq!(driver.calls(), vec![DriverCall::Tap(DevicePoint::new(10, 20))]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use simdeck_core::domain::geometry::{ANDROID_DEFAULT_FRAMEBUFFER, IOS_DEFAULT_DISPLAY};
use simdeck_core::{parse_ui_dump, DevicePoint, Platform, ScreenGeometry, UiElement};

use crate::application::driver::{
    AndroidDeviceInfo, AppList, DeviceDriver, DeviceInfo, DriverError, IosDeviceInfo,
    RecordingHandle, RecordingOutput, SwipeOutcome,
};
use crate::domain::requests::{LaunchTarget, StatusBarOverride, SwipeGesture};

/// The 8-byte PNG signature plus a marker; enough for a browser round trip.
pub const MOCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\nsimdeck";

/// Bytes returned by `stop_recording`.
pub const MOCK_VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42";

/// View hierarchy served by `elements` on Android.
const MOCK_UI_DUMP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node index="0" text="" resource-id="" class="android.widget.FrameLayout" content-desc="" clickable="false" enabled="true" bounds="[0,0][1080,1920]">
    <node index="0" text="Email" resource-id="com.example:id/email" class="android.widget.EditText" content-desc="" clickable="true" enabled="true" bounds="[100,100][980,160]" />
    <node index="1" text="Sign in" resource-id="com.example:id/login" class="android.widget.Button" content-desc="" clickable="true" enabled="true" bounds="[100,200][300,260]" />
  </node>
</hierarchy>"#;

/// One logged driver operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    DeviceInfo,
    Screenshot,
    Tap(DevicePoint),
    Swipe { start: DevicePoint, end: DevicePoint, duration_ms: u64 },
    Type(String),
    Key(String),
    Launch(LaunchTarget),
    OpenUrl(String),
    ListApps,
    ScreenSize,
    StartRecording,
    StopRecording,
    StatusBar(StatusBarOverride),
    Install(String),
    Uninstall(String),
    Elements,
}

pub struct MockDriver {
    platform: Platform,
    device_id: String,
    calls: Mutex<Vec<DriverCall>>,
    screen: Mutex<ScreenGeometry>,
    swipe_note: Mutex<Option<String>>,
    should_fail: AtomicBool,
}

impl MockDriver {
    pub fn new(platform: Platform) -> Self {
        let screen = match platform {
            Platform::Ios => IOS_DEFAULT_DISPLAY,
            Platform::Android => ANDROID_DEFAULT_FRAMEBUFFER,
        };
        Self {
            platform,
            device_id: format!("mock-{}", platform.as_str()),
            calls: Mutex::new(Vec::new()),
            screen: Mutex::new(screen),
            swipe_note: Mutex::new(None),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<DriverCall> {
        lock(&self.calls).clone()
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Size reported by `screen_size`.
    pub fn set_screen(&self, screen: ScreenGeometry) {
        *lock(&self.screen) = screen;
    }

    /// Note attached to swipe outcomes.
    pub fn set_swipe_note(&self, note: Option<&str>) {
        *lock(&self.swipe_note) = note.map(str::to_string);
    }

    fn record(&self, call: DriverCall) -> Result<(), DriverError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DriverError::command_failed("mock", "mock failure"));
        }
        lock(&self.calls).push(call);
        Ok(())
    }

    fn require(&self, platform: Platform, action: &str) -> Result<(), DriverError> {
        if self.platform == platform {
            Ok(())
        } else {
            Err(DriverError::unsupported(action, self.platform))
        }
    }
}

/// A poisoned log only means another test thread panicked; keep reading.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DeviceDriver for MockDriver {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn device_info(&self) -> Result<DeviceInfo, DriverError> {
        self.record(DriverCall::DeviceInfo)?;
        Ok(match self.platform {
            Platform::Ios => DeviceInfo::Ios(IosDeviceInfo {
                udid: self.device_id.clone(),
                name: "iPhone 15 Pro".into(),
                state: "Booted".into(),
                runtime: "iOS-17-2".into(),
                device_type_identifier: None,
            }),
            Platform::Android => DeviceInfo::Android(AndroidDeviceInfo {
                id: self.device_id.clone(),
                model: "sdk_gphone64_arm64".into(),
                manufacturer: "Google".into(),
                sdk_version: "34".into(),
                android_version: "14".into(),
                kind: "android",
            }),
        })
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.record(DriverCall::Screenshot)?;
        Ok(MOCK_PNG.to_vec())
    }

    async fn tap(&self, point: DevicePoint, _screen: ScreenGeometry) -> Result<(), DriverError> {
        self.record(DriverCall::Tap(point))
    }

    async fn swipe(
        &self,
        gesture: &SwipeGesture,
        _screen: ScreenGeometry,
    ) -> Result<SwipeOutcome, DriverError> {
        self.record(DriverCall::Swipe {
            start: gesture.start(),
            end: gesture.end(),
            duration_ms: gesture.duration_ms,
        })?;
        Ok(SwipeOutcome {
            note: lock(&self.swipe_note).clone(),
        })
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.record(DriverCall::Type(text.to_string()))
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        self.record(DriverCall::Key(key.to_string()))
    }

    async fn launch(&self, target: &LaunchTarget) -> Result<(), DriverError> {
        self.record(DriverCall::Launch(target.clone()))
    }

    async fn open_url(&self, url: &str) -> Result<(), DriverError> {
        self.record(DriverCall::OpenUrl(url.to_string()))
    }

    async fn list_apps(&self) -> Result<AppList, DriverError> {
        self.record(DriverCall::ListApps)?;
        Ok(match self.platform {
            Platform::Ios => AppList::Raw {
                raw: "{ \"com.apple.mobilesafari\" = { CFBundleDisplayName = Safari; }; }".into(),
            },
            Platform::Android => AppList::Packages {
                apps: vec!["com.example.app".into()],
            },
        })
    }

    async fn screen_size(&self) -> Result<ScreenGeometry, DriverError> {
        self.record(DriverCall::ScreenSize)?;
        Ok(*lock(&self.screen))
    }

    async fn start_recording(&self) -> Result<RecordingHandle, DriverError> {
        self.record(DriverCall::StartRecording)?;
        Ok(RecordingHandle::new(None, RecordingOutput::InMemory))
    }

    async fn stop_recording(&self, _handle: RecordingHandle) -> Result<Vec<u8>, DriverError> {
        self.record(DriverCall::StopRecording)?;
        Ok(MOCK_VIDEO.to_vec())
    }

    async fn override_status_bar(&self, status: &StatusBarOverride) -> Result<(), DriverError> {
        self.require(Platform::Ios, "statusbar")?;
        self.record(DriverCall::StatusBar(status.clone()))
    }

    async fn install(&self, apk_path: &str) -> Result<(), DriverError> {
        self.require(Platform::Android, "install")?;
        self.record(DriverCall::Install(apk_path.to_string()))
    }

    async fn uninstall(&self, package: &str) -> Result<(), DriverError> {
        self.require(Platform::Android, "uninstall")?;
        self.record(DriverCall::Uninstall(package.to_string()))
    }

    async fn elements(&self) -> Result<Vec<UiElement>, DriverError> {
        self.require(Platform::Android, "elements")?;
        self.record(DriverCall::Elements)?;
        Ok(parse_ui_dump(MOCK_UI_DUMP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_are_logged_in_order() {
        let driver = MockDriver::new(Platform::Android);

        driver.press_key("home").await.unwrap();
        driver.type_text("hi").await.unwrap();

        assert_eq!(
            driver.calls(),
            vec![DriverCall::Key("home".into()), DriverCall::Type("hi".into())]
        );
    }

    #[tokio::test]
    async fn test_should_fail_skips_the_log() {
        let driver = MockDriver::new(Platform::Ios);
        driver.set_should_fail(true);

        assert!(driver.screenshot().await.is_err());
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_elements_fixture_contains_sign_in_button() {
        let driver = MockDriver::new(Platform::Android);
        let elements = driver.elements().await.unwrap();
        let button = elements.iter().find(|e| e.text == "Sign in").unwrap();
        assert_eq!(button.center, DevicePoint::new(200, 230));
        assert_eq!(button.resource_id, "login");
    }

    #[tokio::test]
    async fn test_platform_specific_calls_respect_platform() {
        let ios = MockDriver::new(Platform::Ios);
        assert!(ios.install("/tmp/a.apk").await.is_err());
        assert!(ios.override_status_bar(&StatusBarOverride::default()).await.is_ok());
    }
}
