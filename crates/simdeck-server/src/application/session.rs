//! Session binding: one device per server process.
//!
//! [`DeviceSession`] owns the state that outlives individual requests:
//!
//! - the driver for the bound `(platform, device id)`,
//! - the single recording slot, guarded so a second start is refused,
//! - the last screen-size answer, reused by coordinate-dependent commands.
//!
//! The iOS tap path reads the cached size rather than asking `simctl` every
//! time; Android relative taps always refresh because `wm size` is cheap and
//! the framebuffer can change with rotation.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use simdeck_core::domain::geometry::ANDROID_DEFAULT_FRAMEBUFFER;
use simdeck_core::{Capabilities, Platform, ScreenGeometry};

use crate::application::driver::{DeviceDriver, DriverError, RecordingHandle};
use crate::domain::ServerConfig;

pub struct DeviceSession {
    driver: Arc<dyn DeviceDriver>,
    capabilities: Capabilities,
    config: Arc<ServerConfig>,
    recording: Mutex<Option<RecordingHandle>>,
    screen: RwLock<Option<ScreenGeometry>>,
}

impl DeviceSession {
    pub fn new(driver: Arc<dyn DeviceDriver>, config: Arc<ServerConfig>) -> Self {
        let capabilities = Capabilities::for_platform(driver.platform());
        info!(
            platform = %driver.platform(),
            device = driver.device_id(),
            "device session bound"
        );
        Self {
            driver,
            capabilities,
            config,
            recording: Mutex::new(None),
            screen: RwLock::new(None),
        }
    }

    pub fn driver(&self) -> &Arc<dyn DeviceDriver> {
        &self.driver
    }

    pub fn platform(&self) -> Platform {
        self.driver.platform()
    }

    pub fn device_id(&self) -> &str {
        self.driver.device_id()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // ── Screen size cache ─────────────────────────────────────────────────────

    /// Queries the driver and stores the answer.
    pub async fn refresh_screen(&self) -> Result<ScreenGeometry, DriverError> {
        let size = self.driver.screen_size().await?;
        *self.screen.write().await = Some(size);
        debug!(width = size.width, height = size.height, "screen size cached");
        Ok(size)
    }

    pub async fn cached_screen(&self) -> Option<ScreenGeometry> {
        *self.screen.read().await
    }

    /// The last known size, querying once if nothing is cached yet.
    pub async fn screen_for_tap(&self) -> Result<ScreenGeometry, DriverError> {
        match self.cached_screen().await {
            Some(size) => Ok(size),
            None => self.refresh_screen().await,
        }
    }

    /// Size to map a relative tap onto: live on Android, cached on iOS.
    pub async fn screen_for_transform(&self) -> Result<ScreenGeometry, DriverError> {
        match self.platform() {
            Platform::Android => self.refresh_screen().await,
            Platform::Ios => self.screen_for_tap().await,
        }
    }

    /// Size handed to the driver with a tap or swipe.
    ///
    /// `adb input` takes framebuffer pixels and ignores it, so Android never
    /// queries `wm size` here.
    pub async fn screen_for_delivery(&self) -> Result<ScreenGeometry, DriverError> {
        match self.platform() {
            Platform::Android => Ok(self
                .cached_screen()
                .await
                .unwrap_or(ANDROID_DEFAULT_FRAMEBUFFER)),
            Platform::Ios => self.screen_for_tap().await,
        }
    }

    // ── Recording slot ────────────────────────────────────────────────────────

    pub async fn is_recording(&self) -> bool {
        self.recording.lock().await.is_some()
    }

    /// Starts a recording unless one is already running.
    ///
    /// The slot lock is held across the driver call, so two concurrent starts
    /// cannot both spawn a recorder.
    pub async fn start_recording(&self) -> Result<Uuid, DriverError> {
        let mut slot = self.recording.lock().await;
        if let Some(active) = slot.as_ref() {
            warn!(recording = %active.id, "record/start refused; recording already active");
            return Err(DriverError::RecordingInProgress);
        }
        let handle = self.driver.start_recording().await?;
        let id = handle.id;
        info!(recording = %id, device = self.device_id(), "recording started");
        *slot = Some(handle);
        Ok(id)
    }

    /// Stops the active recording and returns the video bytes.
    ///
    /// The slot is empty afterwards whether or not the driver succeeded.
    pub async fn stop_recording(&self) -> Result<Vec<u8>, DriverError> {
        let mut slot = self.recording.lock().await;
        let handle = slot.take().ok_or(DriverError::NoRecordingInProgress)?;
        let id = handle.id;
        let elapsed = handle.started_at.elapsed();
        let result = self.driver.stop_recording(handle).await;
        match &result {
            Ok(bytes) => info!(
                recording = %id,
                bytes = bytes.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "recording stopped"
            ),
            Err(e) => warn!(recording = %id, error = %e, "recording stop failed"),
        }
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::driver::mock::{DriverCall, MockDriver};

    fn session(platform: Platform) -> (Arc<MockDriver>, DeviceSession) {
        let driver = Arc::new(MockDriver::new(platform));
        let session = DeviceSession::new(driver.clone(), Arc::new(ServerConfig::default()));
        (driver, session)
    }

    #[tokio::test]
    async fn test_stop_without_start_reports_no_recording() {
        let (driver, session) = session(Platform::Android);

        let result = session.stop_recording().await;

        assert!(matches!(result, Err(DriverError::NoRecordingInProgress)));
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_start_is_rejected_and_slot_kept() {
        // Arrange
        let (driver, session) = session(Platform::Ios);
        let first = session.start_recording().await.unwrap();

        // Act
        let second = session.start_recording().await;

        // Assert
        assert!(matches!(second, Err(DriverError::RecordingInProgress)));
        assert!(session.is_recording().await);
        let starts = driver
            .calls()
            .into_iter()
            .filter(|c| *c == DriverCall::StartRecording)
            .count();
        assert_eq!(starts, 1, "recorder must be spawned once (first id {first})");
    }

    #[tokio::test]
    async fn test_start_then_stop_returns_bytes_and_clears_slot() {
        let (_driver, session) = session(Platform::Android);
        session.start_recording().await.unwrap();

        let video = session.stop_recording().await.unwrap();

        assert!(!video.is_empty());
        assert!(!session.is_recording().await);
    }

    #[tokio::test]
    async fn test_failed_stop_still_clears_slot() {
        let (driver, session) = session(Platform::Ios);
        session.start_recording().await.unwrap();
        driver.set_should_fail(true);

        assert!(session.stop_recording().await.is_err());
        assert!(!session.is_recording().await);
    }

    #[tokio::test]
    async fn test_screen_for_tap_queries_once_then_uses_cache() {
        let (driver, session) = session(Platform::Ios);

        let a = session.screen_for_tap().await.unwrap();
        let b = session.screen_for_tap().await.unwrap();

        assert_eq!(a, b);
        let queries = driver
            .calls()
            .into_iter()
            .filter(|c| *c == DriverCall::ScreenSize)
            .count();
        assert_eq!(queries, 1);
    }

    #[tokio::test]
    async fn test_android_transform_always_refreshes() {
        let (driver, session) = session(Platform::Android);

        session.screen_for_transform().await.unwrap();
        session.screen_for_transform().await.unwrap();

        let queries = driver
            .calls()
            .into_iter()
            .filter(|c| *c == DriverCall::ScreenSize)
            .count();
        assert_eq!(queries, 2);
    }

    #[tokio::test]
    async fn test_android_delivery_size_never_queries_driver() {
        let (driver, session) = session(Platform::Android);

        let size = session.screen_for_delivery().await.unwrap();

        assert_eq!(size, ANDROID_DEFAULT_FRAMEBUFFER);
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ios_delivery_size_uses_cache() {
        let (driver, session) = session(Platform::Ios);

        session.screen_for_delivery().await.unwrap();
        session.screen_for_delivery().await.unwrap();

        assert_eq!(driver.calls(), vec![DriverCall::ScreenSize]);
    }
}
