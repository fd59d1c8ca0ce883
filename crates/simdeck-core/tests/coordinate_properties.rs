//! Integration tests for the browser → device → host coordinate pipeline.
//!
//! Sweeps the relative input space instead of checking single points, so the
//! clamping and letterbox invariants are exercised across the whole screen.

use simdeck_core::domain::displays::ios_display_size;
use simdeck_core::domain::geometry::{device_to_host, DEFAULT_TITLE_BAR_HEIGHT};
use simdeck_core::{to_device, HostWindowGeometry, Letterbox, RelativePoint, ScreenGeometry};

const SCREENS: &[ScreenGeometry] = &[
    ScreenGeometry::new(393, 852),
    ScreenGeometry::new(1080, 1920),
    ScreenGeometry::new(1440, 3120),
    ScreenGeometry::new(1024, 1366),
];

fn steps() -> impl Iterator<Item = f64> {
    (0..=40).map(|i| f64::from(i) / 40.0)
}

#[test]
fn test_output_stays_inside_screen_for_unit_inputs() {
    for screen in SCREENS {
        for rx in steps() {
            for ry in steps() {
                let p = to_device(RelativePoint::new(rx, ry), *screen);
                assert!(p.x >= 0 && p.x as u32 <= screen.width, "x={} for {screen:?}", p.x);
                assert!(p.y >= 0 && p.y as u32 <= screen.height, "y={} for {screen:?}", p.y);
            }
        }
    }
}

#[test]
fn test_pre_clamp_inputs_map_to_boundary() {
    let screen = ScreenGeometry::new(1080, 1920);
    let cases = [(-0.3, 0.5, 0.0, 0.5), (1.3, 0.5, 1.0, 0.5), (0.5, -4.0, 0.5, 0.0), (0.5, 9.0, 0.5, 1.0)];
    for (rx, ry, bx, by) in cases {
        assert_eq!(
            to_device(RelativePoint::new(rx, ry), screen),
            to_device(RelativePoint::new(bx, by), screen),
            "({rx}, {ry}) should clamp to ({bx}, {by})"
        );
    }
}

#[test]
fn test_letterbox_scale_for_reference_window() {
    // Arrange
    let device = ScreenGeometry::new(390, 844);

    // Act
    let fit = Letterbox::fit(780.0, 1600.0, device);

    // Assert
    assert!((fit.scale - 1.895_734_597_156_398).abs() < 1e-9);
    assert!(fit.offset_x >= 0.0);
    assert!(fit.offset_y >= 0.0);
    let scaled_w = 390.0 * fit.scale;
    assert!(scaled_w <= 780.0);
    assert!((scaled_w + 2.0 * fit.offset_x - 780.0).abs() < 1e-9);
}

#[test]
fn test_ios_composition_lands_inside_window_content() {
    // Arrange: an iPhone 14 window somewhere on a secondary display
    let logical = ios_display_size("iPhone 14");
    let window = HostWindowGeometry {
        x: 1920.0,
        y: 100.0,
        width: 500.0,
        height: 1100.0,
        title_bar_height: DEFAULT_TITLE_BAR_HEIGHT,
    };

    for rx in steps() {
        for ry in steps() {
            // Act
            let point = to_device(RelativePoint::new(rx, ry), logical);
            let host = device_to_host(&window, logical, point);

            // Assert
            assert!(host.x >= window.x - 1e-9 && host.x <= window.x + window.width + 1e-9);
            let top = window.y + DEFAULT_TITLE_BAR_HEIGHT;
            assert!(host.y >= top - 1e-9 && host.y <= window.y + window.height + 1e-9);
        }
    }
}

#[test]
fn test_centre_of_browser_is_centre_of_window_content() {
    let logical = ScreenGeometry::new(400, 800);
    let window = HostWindowGeometry {
        x: 0.0,
        y: 0.0,
        width: 1000.0,
        height: 828.0,
        title_bar_height: DEFAULT_TITLE_BAR_HEIGHT,
    };
    let point = to_device(RelativePoint::new(0.5, 0.5), logical);
    let host = device_to_host(&window, logical, point);
    assert_eq!(host.rounded(), (500, 428));
}
