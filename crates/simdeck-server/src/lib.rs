//! simdeck-server library crate.
//!
//! Serves a browser control surface for one iOS simulator or Android
//! emulator: an HTTP JSON API for commands, a WebSocket push channel for the
//! live screen, and the embedded single-page UI.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (HTTP JSON + WebSocket)
//!         ↕
//! [simdeck-server]
//!   ├── domain/           ServerConfig, HTTP request bodies
//!   ├── application/      DeviceDriver contract, CommandDispatcher,
//!   │                     FrameStreamer, DeviceSession
//!   └── infrastructure/
//!         ├── process/    CommandRunner seam over tokio::process
//!         ├── driver/     iOS (simctl + AppleScript), Android (adb), mock
//!         ├── discovery/  tool probes, device listing, boot
//!         ├── http_api/   axum routes under /api, static UI
//!         └── ws_session/ /ws push channel
//!         ↕
//! xcrun simctl / adb / emulator / osascript
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `simdeck-core`; it talks to
//!   devices only through the [`application::DeviceDriver`] trait.
//! - `infrastructure` implements the trait and owns every process, socket
//!   and file.

pub mod domain;

pub mod application;

pub mod infrastructure;
