//! Infrastructure layer for simdeck-server.
//!
//! Contains the OS-facing adapters: subprocess execution, the iOS and Android
//! drivers, device discovery and boot, the config file, and the HTTP and
//! WebSocket surface.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `simdeck_core`, but MUST NOT be imported by the `application` or `domain`
//! layers.

pub mod capture;
pub mod config_file;
pub mod discovery;
pub mod driver;
pub mod http_api;
pub mod process;
pub mod ws_session;
