//! Integration tests for uiautomator dump parsing through the public API.

use simdeck_core::domain::elements::find_element;
use simdeck_core::{parse_ui_dump, Bounds, DevicePoint};

const SINGLE_BUTTON: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><hierarchy rotation="0"><node index="0" text="OK" resource-id="android:id/button1" class="android.widget.Button" package="com.android.settings" content-desc="" checkable="false" checked="false" clickable="true" enabled="true" focusable="true" focused="false" scrollable="false" long-clickable="false" password="false" selected="false" bounds="[100,200][300,260]" /></hierarchy>"#;

#[test]
fn test_single_button_center() {
    // Act
    let elements = parse_ui_dump(SINGLE_BUTTON);

    // Assert
    assert_eq!(elements.len(), 1);
    let el = &elements[0];
    assert_eq!(el.center, DevicePoint::new(200, 230));
    assert_eq!(
        el.bounds,
        Bounds {
            left: 100,
            top: 200,
            right: 300,
            bottom: 260
        }
    );
    assert_eq!(el.resource_id, "button1");
}

#[test]
fn test_elements_serialize_in_camel_case() {
    let elements = parse_ui_dump(SINGLE_BUTTON);
    let json = serde_json::to_value(&elements[0]).unwrap();
    assert_eq!(json["resourceId"], "button1");
    assert_eq!(json["className"], "Button");
    assert_eq!(json["center"]["x"], 200);
    assert_eq!(json["bounds"]["bottom"], 260);
}

#[test]
fn test_each_dump_is_parsed_from_scratch() {
    let first = parse_ui_dump(SINGLE_BUTTON);
    let moved = SINGLE_BUTTON.replace("[100,200][300,260]", "[0,0][10,10]");
    let second = parse_ui_dump(&moved);
    assert_ne!(first[0].center, second[0].center);
    assert_eq!(second[0].center, DevicePoint::new(5, 5));
}

#[test]
fn test_find_by_resource_id_substring() {
    let elements = parse_ui_dump(SINGLE_BUTTON);
    assert!(find_element(&elements, "BUTTON1", false).is_some());
    assert!(find_element(&elements, "Cancel", false).is_none());
}

#[test]
fn test_empty_and_malformed_input_yield_nothing() {
    assert!(parse_ui_dump("").is_empty());
    assert!(parse_ui_dump("ERROR: null root node returned by UiTestAutomationBridge.").is_empty());
}
