//! Browser-relative position → device-native coordinates.
//!
//! The browser reports a click as a fraction of the screenshot overlay:
//! `rel = (client - overlay_origin) / overlay_size`.  This module turns that
//! fraction into integer device coordinates.  The unit of the result depends
//! on the platform (framebuffer pixels or logical points) but the arithmetic does not:
//!
//! ```text
//! x = round(clamp(rel_x, 0, 1) * screen.width)
//! y = round(clamp(rel_y, 0, 1) * screen.height)
//! ```
//!
//! On Android the result is final (framebuffer pixels for `input tap`).  On
//! iOS it is a logical point that the driver feeds through
//! [`device_to_host`](crate::domain::geometry::device_to_host) to find the
//! host click position.

use serde::{Deserialize, Serialize};

use crate::domain::geometry::ScreenGeometry;

/// A position relative to the screenshot overlay, each axis in `[0, 1]`.
///
/// Construction always clamps, so a `RelativePoint` never lies outside the
/// visible screen.  `NaN` collapses to `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePoint {
    x: f64,
    y: f64,
}

impl RelativePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Integer device-native coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

impl DevicePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Maps a relative overlay position onto `screen`, rounding to the nearest
/// device unit.  The result always lies in `[0, width] × [0, height]`.
pub fn to_device(rel: RelativePoint, screen: ScreenGeometry) -> DevicePoint {
    let x = (rel.x * f64::from(screen.width)).round();
    let y = (rel.y * f64::from(screen.height)).round();
    DevicePoint {
        x: x as i32,
        y: y as i32,
    }
}
