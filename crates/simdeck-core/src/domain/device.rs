//! Device identity.
//!
//! A device is identified by the `(platform, id)` pair: the simulator UDID on
//! iOS, the adb serial on Android.  Devices are created by discovery or boot
//! and live until the host shuts them down; SimDeck only ever tears down its
//! own connection to a device, never the device itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two supported device backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iOS simulator driven by `xcrun simctl`.
    Ios,
    /// Android emulator driven by `adb`.
    Android,
}

impl Platform {
    /// Wire name used in JSON responses (`"ios"` / `"android"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }

    /// Human-readable label for log lines and the UI.
    pub fn label(self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Android => "Android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Platform::from_str`] for anything other than `ios`/`android`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// A simulator or emulator that SimDeck can bind to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Simulator UDID (iOS) or adb serial / AVD name (Android).
    pub id: String,
    pub platform: Platform,
    /// Display name, e.g. `"iPhone 15 Pro"` or `"sdk_gphone64_arm64"`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Android API level or iOS runtime version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    /// `false` for shut-down simulators and AVDs that still need booting.
    pub running: bool,
}

impl Device {
    /// Name to show the user, falling back to the model and then the raw id.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            model
        } else {
            &self.id
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
