//! Screen and host-window geometry.
//!
//! Two kinds of rectangle matter when delivering a tap:
//!
//! - [`ScreenGeometry`] – the device screen in device-native units
//!   (logical points on iOS, framebuffer pixels on Android).
//! - [`HostWindowGeometry`] – the Simulator.app window on the host desktop, in
//!   host screen points.  Only iOS needs it.  It is read live before every tap
//!   because the user can move or resize the window at any time; never keep a
//!   copy across taps.
//!
//! The simulator draws the device screen uniformly scaled and centred inside
//! the window's content area (below the title bar).  [`Letterbox`] captures
//! that fit: one scale factor plus the padding on the axis that does not fill.
//!
//! ```text
//! ┌──────────── window ─────────────┐
//! │ title bar (title_bar_height)    │
//! ├─────────────────────────────────┤ ← content origin
//! │ offset_x │ device × scale │     │
//! │          │                │     │
//! └─────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::transform::DevicePoint;

/// Logical point size used when the iOS model is not in the display table.
pub const IOS_DEFAULT_DISPLAY: ScreenGeometry = ScreenGeometry::new(393, 852);

/// Framebuffer size reported when `wm size` output cannot be parsed.
pub const ANDROID_DEFAULT_FRAMEBUFFER: ScreenGeometry = ScreenGeometry::new(1080, 1920);

/// Height of the Simulator.app title bar in host points.
pub const DEFAULT_TITLE_BAR_HEIGHT: f64 = 28.0;

/// Device screen size in device-native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Parses the first `<width>x<height>` pair in `text`.
    ///
    /// Matches `adb shell wm size` output such as `Physical size: 1080x2400`.
    /// When an override is active adb prints the physical size first, which
    /// is the one `input tap` addresses.
    pub fn parse_wxh(text: &str) -> Option<Self> {
        for token in text.split(|c: char| c.is_whitespace() || c == ':') {
            let Some((w, h)) = token.split_once('x') else {
                continue;
            };
            if let (Ok(width), Ok(height)) = (w.parse::<u32>(), h.parse::<u32>()) {
                return Some(Self::new(width, height));
            }
        }
        None
    }
}

/// The Simulator.app window on the host desktop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostWindowGeometry {
    /// Left edge of the window in host screen points.
    pub x: f64,
    /// Top edge of the window (including title bar) in host screen points.
    pub y: f64,
    pub width: f64,
    /// Full window height including the title bar.
    pub height: f64,
    pub title_bar_height: f64,
}

impl HostWindowGeometry {
    /// Width available to the device screen.
    pub fn content_width(&self) -> f64 {
        self.width.max(0.0)
    }

    /// Height available to the device screen (below the title bar).
    pub fn content_height(&self) -> f64 {
        (self.height - self.title_bar_height).max(0.0)
    }

    /// Parses the `x,y,width,height` line printed by the window-geometry
    /// AppleScript.  AppleScript may print integers or reals (`12.0`).
    pub fn parse_csv(line: &str, title_bar_height: f64) -> Option<Self> {
        let values: Vec<f64> = line
            .trim()
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match values.as_slice() {
            [x, y, width, height] => Some(Self {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                title_bar_height,
            }),
            _ => None,
        }
    }
}

/// Uniform fit of a device screen inside a content rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Host points per device unit; identical on both axes.
    pub scale: f64,
    /// Horizontal padding on each side of the scaled screen.
    pub offset_x: f64,
    /// Vertical padding above (and below) the scaled screen.
    pub offset_y: f64,
}

impl Letterbox {
    /// Fits `device` inside a `content_width × content_height` rectangle.
    ///
    /// `scale = min(content_w / device_w, content_h / device_h)`; the scaled
    /// screen is centred, so both offsets are non-negative and
    /// `device_w * scale <= content_w`.
    pub fn fit(content_width: f64, content_height: f64, device: ScreenGeometry) -> Self {
        // A zero-sized device would divide by zero; treat each axis as one unit.
        let device_w = f64::from(device.width.max(1));
        let device_h = f64::from(device.height.max(1));
        let content_width = content_width.max(0.0);
        let content_height = content_height.max(0.0);

        let scale = (content_width / device_w).min(content_height / device_h);
        let offset_x = (content_width - device_w * scale) / 2.0;
        let offset_y = (content_height - device_h * scale) / 2.0;

        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Fits `device` inside the content area of `window`.
    pub fn for_window(window: &HostWindowGeometry, device: ScreenGeometry) -> Self {
        Self::fit(window.content_width(), window.content_height(), device)
    }
}

/// Absolute host screen position for a pointer click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostPoint {
    pub x: f64,
    pub y: f64,
}

impl HostPoint {
    /// Rounded to whole host points, as pointer utilities expect.
    pub fn rounded(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

/// Maps a device-native point to absolute host screen coordinates.
///
/// ```text
/// host_x = win_x + offset_x + x * scale
/// host_y = win_y + title_bar + offset_y + y * scale
/// ```
pub fn device_to_host(
    window: &HostWindowGeometry,
    device: ScreenGeometry,
    point: DevicePoint,
) -> HostPoint {
    let fit = Letterbox::for_window(window, device);
    HostPoint {
        x: window.x + fit.offset_x + f64::from(point.x) * fit.scale,
        y: window.y + window.title_bar_height + fit.offset_y + f64::from(point.y) * fit.scale,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
