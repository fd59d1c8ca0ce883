//! Action catalogue and per-platform capability sets.
//!
//! Every request the browser can make is an [`Action`].  Most actions belong
//! to a *feature* (`record/start` and `record/stop` both belong to `record`);
//! a platform advertises the features it supports and the dispatcher refuses
//! anything outside that list before a driver is touched.  A handful of
//! actions (device info, apps, screen size, platform) have no feature and are
//! available everywhere.

use std::fmt;

use serde::Serialize;

use crate::domain::device::Platform;

// ── Feature lists ─────────────────────────────────────────────────────────────

/// Features advertised by the Android driver, in `GET /api/platform` order.
pub const ANDROID_FEATURES: &[&str] = &[
    "tap",
    "swipe",
    "type",
    "key",
    "launch",
    "openurl",
    "screenshot",
    "record",
    "install",
    "uninstall",
    "elements",
    "tap-element",
    "type-element",
];

/// Features advertised by the iOS driver.
pub const IOS_FEATURES: &[&str] = &[
    "tap",
    "swipe",
    "type",
    "key",
    "launch",
    "openurl",
    "screenshot",
    "record",
    "statusbar",
];

// ── Actions ───────────────────────────────────────────────────────────────────

/// Every operation exposed on the request/response surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Device,
    Screenshot,
    Tap,
    Swipe,
    Type,
    Key,
    Launch,
    OpenUrl,
    Apps,
    Screen,
    StatusBar,
    RecordStart,
    RecordStop,
    Install,
    Uninstall,
    Elements,
    TapElement,
    TypeElement,
    Platform,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::Device,
        Action::Screenshot,
        Action::Tap,
        Action::Swipe,
        Action::Type,
        Action::Key,
        Action::Launch,
        Action::OpenUrl,
        Action::Apps,
        Action::Screen,
        Action::StatusBar,
        Action::RecordStart,
        Action::RecordStop,
        Action::Install,
        Action::Uninstall,
        Action::Elements,
        Action::TapElement,
        Action::TypeElement,
        Action::Platform,
    ];

    /// Route name under the API prefix, e.g. `"record/start"`.
    pub fn name(self) -> &'static str {
        match self {
            Action::Device => "device",
            Action::Screenshot => "screenshot",
            Action::Tap => "tap",
            Action::Swipe => "swipe",
            Action::Type => "type",
            Action::Key => "key",
            Action::Launch => "launch",
            Action::OpenUrl => "openurl",
            Action::Apps => "apps",
            Action::Screen => "screen",
            Action::StatusBar => "statusbar",
            Action::RecordStart => "record/start",
            Action::RecordStop => "record/stop",
            Action::Install => "install",
            Action::Uninstall => "uninstall",
            Action::Elements => "elements",
            Action::TapElement => "tap-element",
            Action::TypeElement => "type-element",
            Action::Platform => "platform",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// The capability this action requires, or `None` if every platform has it.
    pub fn feature(self) -> Option<&'static str> {
        match self {
            Action::Device | Action::Apps | Action::Screen | Action::Platform => None,
            Action::RecordStart | Action::RecordStop => Some("record"),
            other => Some(other.name()),
        }
    }

    pub fn is_universal(self) -> bool {
        self.feature().is_none()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Capabilities ──────────────────────────────────────────────────────────────

/// The fixed feature list of one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Capabilities {
    features: &'static [&'static str],
}

impl Capabilities {
    pub fn for_platform(platform: Platform) -> Self {
        let features = match platform {
            Platform::Android => ANDROID_FEATURES,
            Platform::Ios => IOS_FEATURES,
        };
        Self { features }
    }

    pub fn features(&self) -> &'static [&'static str] {
        self.features
    }

    pub fn supports(&self, action: Action) -> bool {
        match action.feature() {
            None => true,
            Some(feature) => self.features.contains(&feature),
        }
    }
}
