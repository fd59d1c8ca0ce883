//! Criterion benchmarks for the tap coordinate pipeline and UI dump parsing.
//!
//! Run with:
//! ```bash
//! cargo bench --package simdeck-core --bench transform_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use simdeck_core::domain::displays::ios_display_size;
use simdeck_core::domain::geometry::{device_to_host, DEFAULT_TITLE_BAR_HEIGHT};
use simdeck_core::{parse_ui_dump, to_device, HostWindowGeometry, RelativePoint, ScreenGeometry};

fn synthetic_dump(nodes: usize) -> String {
    let mut xml = String::from(r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><hierarchy rotation="0">"#);
    for i in 0..nodes {
        let top = i * 40;
        xml.push_str(&format!(
            r#"<node index="{i}" text="Row {i}" resource-id="com.example:id/row_{i}" class="android.widget.TextView" content-desc="" clickable="{}" enabled="true" bounds="[0,{top}][1080,{}]" />"#,
            i % 2 == 0,
            top + 40
        ));
    }
    xml.push_str("</hierarchy>");
    xml
}

fn bench_android_tap(c: &mut Criterion) {
    let screen = ScreenGeometry::new(1080, 2400);
    c.bench_function("android_relative_to_pixels", |b| {
        b.iter(|| to_device(RelativePoint::new(black_box(0.37), black_box(0.81)), screen))
    });
}

fn bench_ios_tap(c: &mut Criterion) {
    let window = HostWindowGeometry {
        x: 120.0,
        y: 80.0,
        width: 460.0,
        height: 980.0,
        title_bar_height: DEFAULT_TITLE_BAR_HEIGHT,
    };
    c.bench_function("ios_relative_to_host", |b| {
        b.iter(|| {
            let logical = ios_display_size(black_box("iPhone 15 Pro"));
            let point = to_device(RelativePoint::new(black_box(0.37), black_box(0.81)), logical);
            device_to_host(&window, logical, point)
        })
    });
}

fn bench_ui_dump(c: &mut Criterion) {
    let xml = synthetic_dump(200);
    c.bench_function("parse_ui_dump_200_nodes", |b| b.iter(|| parse_ui_dump(black_box(&xml))));
}

criterion_group!(benches, bench_android_tap, bench_ios_tap, bench_ui_dump);
criterion_main!(benches);
