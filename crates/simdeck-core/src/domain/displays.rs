//! Logical point sizes of iOS device models.
//!
//! `simctl` does not report the logical resolution of a simulator, so it is
//! looked up from the device name.  Matching is by substring, first hit wins,
//! which is why the longer names ("iPhone 15 Pro Max") come before their
//! prefixes ("iPhone 15 Pro", "iPhone 15").

use crate::domain::geometry::{ScreenGeometry, IOS_DEFAULT_DISPLAY};

const IOS_DISPLAYS: &[(&str, ScreenGeometry)] = &[
    ("iPhone 15 Pro Max", ScreenGeometry::new(430, 932)),
    ("iPhone 15 Pro", ScreenGeometry::new(393, 852)),
    ("iPhone 15 Plus", ScreenGeometry::new(430, 932)),
    ("iPhone 15", ScreenGeometry::new(393, 852)),
    ("iPhone 14 Pro Max", ScreenGeometry::new(430, 932)),
    ("iPhone 14 Pro", ScreenGeometry::new(393, 852)),
    ("iPhone 14 Plus", ScreenGeometry::new(428, 926)),
    ("iPhone 14", ScreenGeometry::new(390, 844)),
    ("iPhone 13 Pro Max", ScreenGeometry::new(428, 926)),
    ("iPhone 13 Pro", ScreenGeometry::new(390, 844)),
    ("iPhone 13 mini", ScreenGeometry::new(375, 812)),
    ("iPhone 13", ScreenGeometry::new(390, 844)),
    ("iPhone 12 Pro Max", ScreenGeometry::new(428, 926)),
    ("iPhone 12 Pro", ScreenGeometry::new(390, 844)),
    ("iPhone 12 mini", ScreenGeometry::new(375, 812)),
    ("iPhone 12", ScreenGeometry::new(390, 844)),
    ("iPhone SE", ScreenGeometry::new(375, 667)),
    ("iPhone 17 Pro", ScreenGeometry::new(402, 874)),
    ("iPhone 16 Pro Max", ScreenGeometry::new(440, 956)),
    ("iPhone 16 Pro", ScreenGeometry::new(402, 874)),
    ("iPad Pro", ScreenGeometry::new(1024, 1366)),
    ("iPad Air", ScreenGeometry::new(820, 1180)),
    ("iPad mini", ScreenGeometry::new(744, 1133)),
];

/// Returns the logical size for a simulator named `name`, or 393×852.
pub fn ios_display_size(name: &str) -> ScreenGeometry {
    IOS_DISPLAYS
        .iter()
        .find(|(model, _)| name.contains(model))
        .map(|(_, size)| *size)
        .unwrap_or(IOS_DEFAULT_DISPLAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_model_name_wins() {
        assert_eq!(ios_display_size("iPhone 15 Pro Max"), ScreenGeometry::new(430, 932));
        assert_eq!(ios_display_size("iPhone 15"), ScreenGeometry::new(393, 852));
        assert_eq!(ios_display_size("iPhone 14 Plus"), ScreenGeometry::new(428, 926));
    }

    #[test]
    fn test_substring_match_inside_longer_name() {
        let size = ios_display_size("iPad Pro (12.9-inch) (6th generation)");
        assert_eq!(size, ScreenGeometry::new(1024, 1366));
    }

    #[test]
    fn test_unknown_model_uses_default() {
        assert_eq!(ios_display_size("Apple Vision Pro"), IOS_DEFAULT_DISPLAY);
        assert_eq!(ios_display_size(""), IOS_DEFAULT_DISPLAY);
    }
}
