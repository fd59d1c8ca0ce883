//! Domain entities for SimDeck.
//!
//! - **`device`** – the `(platform, id)` identity of a simulator or emulator.
//! - **`geometry`** – device screen sizes, the host window of Simulator.app,
//!   and the letterbox fit that maps one onto the other.
//! - **`transform`** – browser-relative positions to device-native coordinates.
//! - **`displays`** – logical point sizes of known iOS device models.
//! - **`elements`** – clickable/labelled nodes scraped from a uiautomator dump.

pub mod device;
pub mod displays;
pub mod elements;
pub mod geometry;
pub mod transform;
