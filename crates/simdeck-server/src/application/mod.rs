//! Application layer for simdeck-server.
//!
//! The application layer decides *what* happens for each request; the
//! infrastructure layer decides *how* a tool is invoked or a socket is read.
//!
//! # Responsibilities
//!
//! - The [`DeviceDriver`] contract and its error taxonomy
//! - Binding one device per process and guarding the recording slot
//! - Capability checks and result envelopes for every API action
//! - The per-connection frame streamer for the push channel
//!
//! # What does NOT belong here?
//!
//! - Spawning `xcrun`, `adb` or `osascript` (infrastructure drivers)
//! - Route tables and WebSocket framing (infrastructure HTTP layer)

pub mod dispatcher;
pub mod driver;
pub mod frame_streamer;
pub mod session;

use std::time::{SystemTime, UNIX_EPOCH};

pub use dispatcher::{Command, CommandDispatcher, Envelope};
pub use driver::{DeviceDriver, DriverError, RecordingHandle, RecordingOutput};
pub use frame_streamer::{FrameSource, FrameStreamer};
pub use session::DeviceSession;

/// Milliseconds since the Unix epoch; `0` if the clock is before 1970.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
