//! Capability-negotiated command dispatch.
//!
//! [`CommandDispatcher::dispatch`] is the single entry point for every
//! request/response action.  It:
//!
//! 1. checks the action against the bound platform's capability list and
//!    refuses unsupported actions without touching the driver,
//! 2. runs the action (driver calls, coordinate transform, element lookup),
//! 3. folds the outcome into an [`Envelope`]: `{success: true, ...result}` or
//!    `{success: false, error}` with the HTTP status the error calls for.
//!
//! Nothing is deduplicated: two identical taps are two taps.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use simdeck_core::domain::elements::find_element;
use simdeck_core::{to_device, Action};

use crate::application::driver::DriverError;
use crate::application::session::DeviceSession;
use crate::application::unix_millis;
use crate::domain::requests::{LaunchTarget, StatusBarOverride, SwipeGesture, TapTarget};

/// Pause between tapping an input field and typing into it.
pub const ELEMENT_FOCUS_DELAY: Duration = Duration::from_millis(200);

// ── Commands ──────────────────────────────────────────────────────────────────

/// A validated request, ready to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Device,
    Screenshot,
    Tap(TapTarget),
    Swipe(SwipeGesture),
    Type { text: String },
    Key { key: String },
    Launch(LaunchTarget),
    OpenUrl { url: String },
    Apps,
    Screen,
    StatusBar(StatusBarOverride),
    RecordStart,
    RecordStop,
    Install { apk_path: String },
    Uninstall { package_name: String },
    Elements,
    TapElement { query: String, exact: bool },
    TypeElement { query: String, text: String },
    Platform,
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::Device => Action::Device,
            Command::Screenshot => Action::Screenshot,
            Command::Tap(_) => Action::Tap,
            Command::Swipe(_) => Action::Swipe,
            Command::Type { .. } => Action::Type,
            Command::Key { .. } => Action::Key,
            Command::Launch(_) => Action::Launch,
            Command::OpenUrl { .. } => Action::OpenUrl,
            Command::Apps => Action::Apps,
            Command::Screen => Action::Screen,
            Command::StatusBar(_) => Action::StatusBar,
            Command::RecordStart => Action::RecordStart,
            Command::RecordStop => Action::RecordStop,
            Command::Install { .. } => Action::Install,
            Command::Uninstall { .. } => Action::Uninstall,
            Command::Elements => Action::Elements,
            Command::TapElement { .. } => Action::TapElement,
            Command::TypeElement { .. } => Action::TypeElement,
            Command::Platform => Action::Platform,
        }
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Uniform response body: `success`, an optional `error`, and any result
/// fields flattened alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
    /// HTTP status to send with this body.
    #[serde(skip)]
    pub status: u16,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            body: Map::new(),
            status: 200,
        }
    }

    pub fn failure(err: &DriverError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            body: Map::new(),
            status: err.http_status(),
        }
    }

    /// Adds one result field.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.body.insert(key.to_string(), v);
            }
            Err(e) => warn!(field = key, error = %e, "dropping unserializable envelope field"),
        }
        self
    }

    /// Merges every field of a struct-like value into the body.
    pub fn merge(mut self, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => self.body.extend(fields),
            Ok(other) => warn!(value = %other, "merge expects an object; ignored"),
            Err(e) => warn!(error = %e, "dropping unserializable envelope body"),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

pub struct CommandDispatcher {
    session: Arc<DeviceSession>,
}

impl CommandDispatcher {
    pub fn new(session: Arc<DeviceSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<DeviceSession> {
        &self.session
    }

    /// Runs `command` and always returns an envelope.
    pub async fn dispatch(&self, command: Command) -> Envelope {
        let action = command.action();
        if let Some(refused) = self.refusal(action) {
            return refused;
        }

        match self.execute(command).await {
            Ok(envelope) => {
                debug!(%action, "action succeeded");
                envelope
            }
            Err(e) => {
                if e.http_status() >= 500 {
                    warn!(%action, error = %e, "action failed");
                } else {
                    info!(%action, error = %e, "action refused");
                }
                Self::failure_for(action, &e)
            }
        }
    }

    /// The failure envelope for an action the bound platform lacks, if any.
    ///
    /// Lets callers refuse before validating a request body.
    pub fn refusal(&self, action: Action) -> Option<Envelope> {
        let e = self.check_supported(action).err()?;
        debug!(%action, platform = %self.session.platform(), "action not in capability set");
        Some(Self::failure_for(action, &e))
    }

    /// Raw PNG bytes for `GET /api/screenshot.png`.
    pub async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError> {
        self.check_supported(Action::Screenshot)?;
        self.session.driver().screenshot().await
    }

    fn check_supported(&self, action: Action) -> Result<(), DriverError> {
        if self.session.capabilities().supports(action) {
            Ok(())
        } else {
            Err(DriverError::unsupported(action.name(), self.session.platform()))
        }
    }

    fn failure_for(action: Action, err: &DriverError) -> Envelope {
        let envelope = Envelope::failure(err);
        // The UI renders the element list even on failure.
        if action == Action::Elements {
            envelope.with("elements", Vec::<Value>::new())
        } else {
            envelope
        }
    }

    async fn execute(&self, command: Command) -> Result<Envelope, DriverError> {
        let session = &self.session;
        let driver = session.driver();

        let envelope = match command {
            Command::Device => {
                let info = driver.device_info().await?;
                Envelope::ok()
                    .with("device", info)
                    .with("platform", session.platform())
            }
            Command::Screenshot => {
                let png = driver.screenshot().await?;
                Envelope::ok()
                    .with("screenshot", format!("data:image/png;base64,{}", STANDARD.encode(png)))
                    .with("timestamp", unix_millis())
            }
            Command::Tap(target) => {
                let point = match target {
                    TapTarget::Device(point) => point,
                    TapTarget::Relative(rel) => to_device(rel, session.screen_for_transform().await?),
                };
                let screen = session.screen_for_delivery().await?;
                driver.tap(point, screen).await?;
                match target {
                    TapTarget::Relative(_) => Envelope::ok().with("tappedAt", point),
                    TapTarget::Device(_) => Envelope::ok(),
                }
            }
            Command::Swipe(gesture) => {
                let screen = session.screen_for_delivery().await?;
                let outcome = driver.swipe(&gesture, screen).await?;
                match outcome.note {
                    Some(note) => Envelope::ok().with("note", note),
                    None => Envelope::ok(),
                }
            }
            Command::Type { text } => {
                driver.type_text(&text).await?;
                Envelope::ok()
            }
            Command::Key { key } => {
                driver.press_key(&key).await?;
                Envelope::ok()
            }
            Command::Launch(target) => {
                driver.launch(&target).await?;
                Envelope::ok()
            }
            Command::OpenUrl { url } => {
                driver.open_url(&url).await?;
                Envelope::ok()
            }
            Command::Apps => Envelope::ok().merge(driver.list_apps().await?),
            Command::Screen => Envelope::ok().merge(session.refresh_screen().await?),
            Command::StatusBar(status) => {
                driver.override_status_bar(&status).await?;
                Envelope::ok()
            }
            Command::RecordStart => {
                let id = session.start_recording().await?;
                Envelope::ok().with("recordingId", id)
            }
            Command::RecordStop => {
                let video = session.stop_recording().await?;
                Envelope::ok().with("video", format!("data:video/mp4;base64,{}", STANDARD.encode(video)))
            }
            Command::Install { apk_path } => {
                driver.install(&apk_path).await?;
                Envelope::ok()
            }
            Command::Uninstall { package_name } => {
                driver.uninstall(&package_name).await?;
                Envelope::ok()
            }
            Command::Elements => {
                let elements = driver.elements().await?;
                let count = elements.len();
                Envelope::ok().with("elements", elements).with("count", count)
            }
            Command::TapElement { query, exact } => {
                if query.trim().is_empty() {
                    return Err(DriverError::InvalidArgument("Query is required".into()));
                }
                let element = self.tap_element(&query, exact).await?;
                let center = element.center;
                Envelope::ok().with("element", element).with("tappedAt", center)
            }
            Command::TypeElement { query, text } => {
                if query.trim().is_empty() || text.is_empty() {
                    return Err(DriverError::InvalidArgument(
                        "Query and text are required".into(),
                    ));
                }
                let element = self.tap_element(&query, false).await?;
                tokio::time::sleep(ELEMENT_FOCUS_DELAY).await;
                driver.type_text(&text).await?;
                Envelope::ok().with("typed", text).with("element", element)
            }
            Command::Platform => Envelope::ok()
                .with("platform", session.platform())
                .with("deviceId", session.device_id())
                .with("features", session.capabilities()),
        };
        Ok(envelope)
    }

    /// Finds the first element matching `query` in a fresh dump and taps its
    /// centre.
    async fn tap_element(
        &self,
        query: &str,
        exact: bool,
    ) -> Result<simdeck_core::UiElement, DriverError> {
        let driver = self.session.driver();
        let elements = driver.elements().await?;
        let element = find_element(&elements, query, exact)
            .cloned()
            .ok_or_else(|| DriverError::ElementNotFound(query.to_string()))?;
        let screen = self.session.screen_for_delivery().await?;
        driver.tap(element.center, screen).await?;
        Ok(element)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
