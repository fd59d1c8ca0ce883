//! iOS key emulation through Simulator.app shortcuts.

/// macOS virtual key code for `H` (`kVK_ANSI_H`).
pub const MAC_KEY_CODE_H: u16 = 4;

/// What to do on the host for a named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IosKeyAction {
    /// Press `key_code` with Command+Shift held (Device → Home).
    Shortcut { key_code: u16, command: bool, shift: bool },
    /// The name is accepted but has no simulator equivalent.
    Ignored,
}

pub(crate) fn key_action(name: &str) -> IosKeyAction {
    match name {
        "home" => IosKeyAction::Shortcut {
            key_code: MAC_KEY_CODE_H,
            command: true,
            shift: true,
        },
        _ => IosKeyAction::Ignored,
    }
}

impl IosKeyAction {
    /// The AppleScript `key code` statement for this action, if any.
    pub fn applescript(&self) -> Option<String> {
        match *self {
            IosKeyAction::Shortcut { key_code, command, shift } => {
                let mut modifiers = Vec::new();
                if command {
                    modifiers.push("command down");
                }
                if shift {
                    modifiers.push("shift down");
                }
                if modifiers.is_empty() {
                    Some(format!("key code {key_code}"))
                } else {
                    Some(format!("key code {key_code} using {{{}}}", modifiers.join(", ")))
                }
            }
            IosKeyAction::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_is_command_shift_h() {
        let action = key_action("home");
        assert_eq!(
            action.applescript().as_deref(),
            Some("key code 4 using {command down, shift down}")
        );
    }

    #[test]
    fn test_other_keys_are_ignored() {
        for name in ["back", "volumeUp", "enter", "x"] {
            assert_eq!(key_action(name), IosKeyAction::Ignored);
            assert!(key_action(name).applescript().is_none());
        }
    }
}
