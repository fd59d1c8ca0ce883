//! Domain layer for simdeck-server.
//!
//! Plain data: runtime configuration and the JSON bodies accepted by the HTTP
//! API.  Nothing here spawns processes or touches the network.

pub mod config;
pub mod requests;

pub use config::ServerConfig;
pub use requests::TapTarget;
