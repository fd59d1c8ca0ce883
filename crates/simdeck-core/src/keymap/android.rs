//! Android `KEYCODE_*` values for named keys.

use std::fmt;

/// The argument passed to `input keyevent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AndroidKeyEvent {
    /// A known key mapped to its numeric code.
    Code(u16),
    /// Anything else, forwarded verbatim.
    Literal(String),
}

impl fmt::Display for AndroidKeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AndroidKeyEvent::Code(code) => write!(f, "{code}"),
            AndroidKeyEvent::Literal(raw) => f.write_str(raw),
        }
    }
}

const KEYCODE_HOME: u16 = 3;
const KEYCODE_BACK: u16 = 4;
const KEYCODE_VOLUME_UP: u16 = 24;
const KEYCODE_VOLUME_DOWN: u16 = 25;
const KEYCODE_POWER: u16 = 26;
const KEYCODE_TAB: u16 = 61;
const KEYCODE_ENTER: u16 = 66;
const KEYCODE_DEL: u16 = 67;
const KEYCODE_MENU: u16 = 82;

pub(crate) fn key_event(name: &str) -> AndroidKeyEvent {
    let code = match name {
        "home" => KEYCODE_HOME,
        "back" => KEYCODE_BACK,
        "menu" => KEYCODE_MENU,
        "power" => KEYCODE_POWER,
        "volumeUp" => KEYCODE_VOLUME_UP,
        "volumeDown" => KEYCODE_VOLUME_DOWN,
        "enter" => KEYCODE_ENTER,
        "delete" => KEYCODE_DEL,
        "tab" => KEYCODE_TAB,
        other => return AndroidKeyEvent::Literal(other.to_string()),
    };
    AndroidKeyEvent::Code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_map_to_codes() {
        let cases = [
            ("home", 3),
            ("back", 4),
            ("menu", 82),
            ("power", 26),
            ("volumeUp", 24),
            ("volumeDown", 25),
            ("enter", 66),
            ("delete", 67),
            ("tab", 61),
        ];
        for (name, code) in cases {
            assert_eq!(key_event(name), AndroidKeyEvent::Code(code), "key {name}");
        }
    }

    #[test]
    fn test_unknown_name_passes_through() {
        let ev = key_event("KEYCODE_CAMERA");
        assert_eq!(ev.to_string(), "KEYCODE_CAMERA");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        // "Home" is not a known name; adb receives it as-is.
        assert_eq!(key_event("Home"), AndroidKeyEvent::Literal("Home".into()));
    }
}
