//! JSON request bodies accepted by the HTTP API.
//!
//! Field names follow the browser's camelCase (`startX`, `bundleId`, `apkPath`).
//! Coordinates arrive as JSON numbers and may be fractional; drivers round
//! them when building tool arguments.

use serde::Deserialize;
use simdeck_core::{DevicePoint, RelativePoint};

/// Swipe duration when the request omits one.
pub const DEFAULT_SWIPE_DURATION_MS: u64 = 300;

// ── Tap ───────────────────────────────────────────────────────────────────────

/// `POST /api/tap`: either device-native `{x, y}` or overlay-relative
/// `{relX, relY}`.  When both are present the native pair wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapRequest {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rel_x: Option<f64>,
    pub rel_y: Option<f64>,
}

/// Where a tap should land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapTarget {
    /// Already in device-native units.
    Device(DevicePoint),
    /// Fraction of the screenshot overlay; transformed server-side.
    Relative(RelativePoint),
}

impl TapRequest {
    /// Returns `None` when neither coordinate pair is complete.
    pub fn target(&self) -> Option<TapTarget> {
        match (self.x, self.y, self.rel_x, self.rel_y) {
            (Some(x), Some(y), _, _) => Some(TapTarget::Device(DevicePoint::new(
                x.round() as i32,
                y.round() as i32,
            ))),
            (_, _, Some(rx), Some(ry)) => Some(TapTarget::Relative(RelativePoint::new(rx, ry))),
            _ => None,
        }
    }
}

// ── Gestures and text ─────────────────────────────────────────────────────────

/// `POST /api/swipe`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeGesture {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    #[serde(default = "default_swipe_duration", rename = "duration")]
    pub duration_ms: u64,
}

fn default_swipe_duration() -> u64 {
    DEFAULT_SWIPE_DURATION_MS
}

impl SwipeGesture {
    pub fn start(&self) -> DevicePoint {
        DevicePoint::new(self.start_x.round() as i32, self.start_y.round() as i32)
    }

    pub fn end(&self) -> DevicePoint {
        DevicePoint::new(self.end_x.round() as i32, self.end_y.round() as i32)
    }
}

/// `POST /api/type`.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeRequest {
    pub text: String,
}

/// `POST /api/key`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

// ── Apps ──────────────────────────────────────────────────────────────────────

/// `POST /api/launch`.  Android reads `packageName` (falling back to
/// `bundleId`); iOS reads `bundleId` (falling back to `packageName`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTarget {
    pub bundle_id: Option<String>,
    pub package_name: Option<String>,
    pub activity_name: Option<String>,
}

impl LaunchTarget {
    pub fn android_package(&self) -> Option<&str> {
        non_empty(self.package_name.as_deref()).or_else(|| non_empty(self.bundle_id.as_deref()))
    }

    pub fn ios_bundle(&self) -> Option<&str> {
        non_empty(self.bundle_id.as_deref()).or_else(|| non_empty(self.package_name.as_deref()))
    }

    pub fn activity(&self) -> Option<&str> {
        non_empty(self.activity_name.as_deref())
    }
}

/// `POST /api/openurl`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenUrlRequest {
    pub url: String,
}

/// `POST /api/install`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRequest {
    pub apk_path: String,
}

/// `POST /api/uninstall`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UninstallRequest {
    pub package_name: String,
}

/// `POST /api/statusbar`.  Absent fields are left as the simulator has them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusBarOverride {
    pub time: Option<String>,
    pub battery: Option<u8>,
    /// `true` → `--wifiMode active`, `false` → `--wifiMode failed`.
    pub wifi: Option<bool>,
}

// ── Element queries ───────────────────────────────────────────────────────────

/// `POST /api/tap-element`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TapElementRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub exact: bool,
}

/// `POST /api/type-element`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeElementRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub text: String,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_with_native_coordinates_rounds() {
        let req: TapRequest = serde_json::from_str(r#"{"x":100.6,"y":200.2}"#).unwrap();
        assert_eq!(req.target(), Some(TapTarget::Device(DevicePoint::new(101, 200))));
    }

    #[test]
    fn test_tap_with_relative_coordinates_clamps() {
        let req: TapRequest = serde_json::from_str(r#"{"relX":1.4,"relY":0.5}"#).unwrap();
        assert_eq!(
            req.target(),
            Some(TapTarget::Relative(RelativePoint::new(1.0, 0.5)))
        );
    }

    #[test]
    fn test_tap_with_incomplete_pair_has_no_target() {
        let req: TapRequest = serde_json::from_str(r#"{"x":10,"relY":0.5}"#).unwrap();
        assert_eq!(req.target(), None);
    }

    #[test]
    fn test_swipe_duration_defaults_to_300ms() {
        let g: SwipeGesture =
            serde_json::from_str(r#"{"startX":0,"startY":500,"endX":0,"endY":100}"#).unwrap();
        assert_eq!(g.duration_ms, 300);
        assert_eq!(g.end(), DevicePoint::new(0, 100));
    }

    #[test]
    fn test_launch_target_falls_back_between_names() {
        let t: LaunchTarget = serde_json::from_str(r#"{"bundleId":"com.apple.Maps"}"#).unwrap();
        assert_eq!(t.android_package(), Some("com.apple.Maps"));
        assert_eq!(t.ios_bundle(), Some("com.apple.Maps"));

        let t: LaunchTarget =
            serde_json::from_str(r#"{"packageName":"com.android.chrome","activityName":""}"#)
                .unwrap();
        assert_eq!(t.android_package(), Some("com.android.chrome"));
        assert_eq!(t.activity(), None);
    }

    #[test]
    fn test_element_requests_tolerate_missing_fields() {
        let req: TapElementRequest = serde_json::from_str("{}").unwrap();
        assert!(req.query.is_empty());
        assert!(!req.exact);
    }

    #[test]
    fn test_install_uses_camel_case() {
        let req: InstallRequest = serde_json::from_str(r#"{"apkPath":"/tmp/app.apk"}"#).unwrap();
        assert_eq!(req.apk_path, "/tmp/app.apk");
    }
}
