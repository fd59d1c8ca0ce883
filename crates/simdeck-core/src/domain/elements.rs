//! UI elements scraped from an Android `uiautomator dump`.
//!
//! The dump is a flat-ish XML document of `<node ...>` tags.  Only the
//! attributes of each tag matter, so the parser scans tags with a regex
//! instead of building a DOM.  Elements are rebuilt on every call and carry
//! no identity between dumps.
//!
//! A node is kept when it is labelled (`text` or `content-desc`), clickable,
//! or looks interactive by name: a resource id containing `button`, or a class
//! containing `Button`, `EditText`, `TextView` or `Image`.  Nodes without a
//! parseable `bounds` attribute are skipped.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::transform::DevicePoint;

const INTERACTIVE_CLASS_HINTS: &[&str] = &["Button", "EditText", "TextView", "Image"];

/// Element rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    /// Midpoint of the rectangle, rounded half away from zero.
    pub fn center(&self) -> DevicePoint {
        let cx = (f64::from(self.left) + f64::from(self.right)) / 2.0;
        let cy = (f64::from(self.top) + f64::from(self.bottom)) / 2.0;
        DevicePoint::new(cx.round() as i32, cy.round() as i32)
    }

    /// Parses uiautomator's `[left,top][right,bottom]` notation.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = bounds_regex().captures(s)?;
        let n = |i: usize| caps.get(i)?.as_str().parse::<i32>().ok();
        Some(Self {
            left: n(1)?,
            top: n(2)?,
            right: n(3)?,
            bottom: n(4)?,
        })
    }
}

/// A labelled or interactive node from the on-device view hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiElement {
    /// `text`, or `content-desc` when the node has no text.
    pub text: String,
    /// Last path segment of `resource-id` (`com.app:id/login` → `login`).
    pub resource_id: String,
    /// Simple class name (`android.widget.Button` → `Button`).
    pub class_name: String,
    pub clickable: bool,
    pub enabled: bool,
    pub bounds: Bounds,
    pub center: DevicePoint,
}

impl UiElement {
    /// Exact match on text or resource id, or a case-insensitive substring
    /// match on text, resource id or class name.
    pub fn matches(&self, query: &str, exact: bool) -> bool {
        if exact {
            return self.text == query || self.resource_id == query;
        }
        let needle = query.to_lowercase();
        self.text.to_lowercase().contains(&needle)
            || self.resource_id.to_lowercase().contains(&needle)
            || self.class_name.to_lowercase().contains(&needle)
    }
}

/// Parses a uiautomator XML dump into the elements worth showing or tapping,
/// in document order.
pub fn parse_ui_dump(xml: &str) -> Vec<UiElement> {
    let mut scanned = 0usize;
    let elements: Vec<UiElement> = node_regex()
        .find_iter(xml)
        .inspect(|_| scanned += 1)
        .filter_map(|m| element_from_tag(m.as_str()))
        .collect();
    debug!(scanned, kept = elements.len(), "parsed ui dump");
    elements
}

/// First element in `elements` matching `query`.
pub fn find_element<'a>(elements: &'a [UiElement], query: &str, exact: bool) -> Option<&'a UiElement> {
    elements.iter().find(|el| el.matches(query, exact))
}

fn element_from_tag(tag: &str) -> Option<UiElement> {
    let attrs: HashMap<&str, String> = attr_regex()
        .captures_iter(tag)
        .filter_map(|c| Some((c.get(1)?.as_str(), decode_entities(c.get(2)?.as_str()))))
        .collect();
    let get = |name: &str| attrs.get(name).map(String::as_str).unwrap_or("");

    let bounds = Bounds::parse(get("bounds"))?;

    let text = get("text");
    let content_desc = get("content-desc");
    let resource_id = get("resource-id");
    let class_name = get("class");
    let clickable = get("clickable") == "true";

    let interesting = !text.is_empty()
        || !content_desc.is_empty()
        || clickable
        || resource_id.contains("button")
        || INTERACTIVE_CLASS_HINTS.iter().any(|h| class_name.contains(h));
    if !interesting {
        return None;
    }

    Some(UiElement {
        text: if text.is_empty() { content_desc } else { text }.to_string(),
        resource_id: resource_id.rsplit('/').next().unwrap_or("").to_string(),
        class_name: class_name.rsplit('.').next().unwrap_or("").to_string(),
        clickable,
        enabled: get("enabled") == "true",
        bounds,
        center: bounds.center(),
    })
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#10;", "\n")
        .replace("&amp;", "&")
}

// The patterns are literals; compilation cannot fail at runtime.

fn node_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<node\b[^>]*>").expect("node pattern"))
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\s([\w:-]+)="([^"]*)""#).expect("attribute pattern"))
}

fn bounds_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]").expect("bounds pattern"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
