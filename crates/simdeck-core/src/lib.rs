//! # simdeck-core
//!
//! Shared library for SimDeck containing the device model, the coordinate
//! transform pipeline, platform key maps, the UI hierarchy parser, and the
//! JSON types spoken on the browser push channel.
//!
//! This crate has zero dependencies on processes, sockets, or async runtimes.
//! Everything here is a pure function of its inputs, which keeps the maths
//! behind every tap testable without a simulator attached.
//!
//! # Architecture overview
//!
//! SimDeck drives two very different device backends from a browser:
//!
//! - **iOS simulators** via `xcrun simctl`.  The simulator has no input
//!   injection API, so taps are delivered as host-level pointer clicks inside
//!   the Simulator.app window.  Coordinates therefore pass through two frames:
//!   browser → logical points → host screen pixels.
//! - **Android emulators** via `adb`.  Taps are injected directly in
//!   framebuffer pixels: browser → pixels.
//!
//! This crate is split into three modules:
//!
//! - **`domain`** – `Platform`, `Device`, screen/window geometry, the
//!   letterbox fit, the browser→device transform, and `UiElement` parsing.
//! - **`keymap`** – high-level key names (`home`, `back`, ...) mapped to
//!   Android key codes and the iOS host shortcut.
//! - **`protocol`** – the action catalogue with per-platform capability sets,
//!   and the push-channel messages (`startStream`, `stopStream`, `frame`).

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `simdeck_core::Platform` instead of `simdeck_core::domain::device::Platform`.
pub use domain::device::{Device, Platform};
pub use domain::elements::{parse_ui_dump, Bounds, UiElement};
pub use domain::geometry::{HostPoint, HostWindowGeometry, Letterbox, ScreenGeometry};
pub use domain::transform::{to_device, DevicePoint, RelativePoint};
pub use protocol::actions::{Action, Capabilities};
pub use protocol::stream::{PushMessage, StreamCommand};
