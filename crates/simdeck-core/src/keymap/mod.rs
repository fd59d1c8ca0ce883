//! High-level key names translated to platform key events.
//!
//! The browser and the HTTP API speak in names (`home`, `back`, `volumeUp`).
//! Android turns them into `input keyevent` codes; iOS has no key injection,
//! so the only name it understands is `home`, delivered as a Simulator.app
//! menu shortcut.

pub mod android;
pub mod ios;

pub use android::AndroidKeyEvent;
pub use ios::IosKeyAction;

/// Unified key mapper for both platforms.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a key name to the argument of `adb shell input keyevent`.
    ///
    /// Unknown names pass through untouched so callers can send raw codes
    /// such as `"KEYCODE_CAMERA"` or `"27"`.
    pub fn android(name: &str) -> AndroidKeyEvent {
        android::key_event(name)
    }

    /// Translates a key name to the host action that emulates it on iOS.
    pub fn ios(name: &str) -> IosKeyAction {
        ios::key_action(name)
    }
}
