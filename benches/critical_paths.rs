//! Criterion benchmarks for spritecut critical paths
//!
//! Benchmarks the core performance-critical operations:
//! - Transparency: background color removal over a frame buffer
//! - Grid: slicing a sheet into frames
//! - Labeling: connected-component sprite detection
//! - Detection: margin and spacing scans

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgba, RgbaImage};
use spritecut::ccl::{apply_background_transparency, detect_sprite_bounds, label_components, BackgroundColor, Mask};
use spritecut::config::{CclSettings, DetectionSettings};
use spritecut::detect::{MarginDetector, SpacingDetector};
use spritecut::grid::{extract_grid_frames, GridConfig};

// =============================================================================
// Test Data Generators
// =============================================================================

/// A magenta-keyed sheet with a `cols` × `rows` grid of 24×24 sprites in
/// 32×32 cells.
fn make_keyed_sheet(cols: u32, rows: u32) -> RgbaImage {
    RgbaImage::from_fn(cols * 32, rows * 32, |x, y| {
        let (cx, cy) = (x % 32, y % 32);
        if (4..28).contains(&cx) && (4..28).contains(&cy) {
            Rgba([(x * 7) as u8, (y * 5) as u8, 90, 255])
        } else {
            Rgba([255, 0, 255, 255])
        }
    })
}

/// Same layout with a transparent background.
fn make_alpha_sheet(cols: u32, rows: u32) -> RgbaImage {
    let mut sheet = make_keyed_sheet(cols, rows);
    for px in sheet.pixels_mut() {
        if px[0] == 255 && px[1] == 0 && px[2] == 255 {
            px[3] = 0;
        }
    }
    sheet
}

// =============================================================================
// Transparency Benchmarks
// =============================================================================

fn bench_transparency(c: &mut Criterion) {
    let mut group = c.benchmark_group("transparency");
    let background = BackgroundColor::new([255, 0, 255], 25);

    for size in [32u32, 128, 512].iter() {
        let frame = make_keyed_sheet(size / 32, size / 32);
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(
            BenchmarkId::new("apply_background_transparency", format!("{}x{}", size, size)),
            &frame,
            |b, frame| b.iter(|| apply_background_transparency(black_box(frame), background)),
        );
    }

    group.finish();
}

// =============================================================================
// Grid Benchmarks
// =============================================================================

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");

    for cells in [4u32, 16, 32].iter() {
        let sheet = make_keyed_sheet(*cells, *cells);
        group.throughput(Throughput::Elements((*cells * *cells) as u64));
        group.bench_with_input(BenchmarkId::new("extract_32x32", cells), &sheet, |b, sheet| {
            b.iter(|| extract_grid_frames(black_box(sheet), &GridConfig::new(32, 32)))
        });
    }

    group.finish();
}

// =============================================================================
// Labeling Benchmarks
// =============================================================================

fn bench_labeling(c: &mut Criterion) {
    let mut group = c.benchmark_group("labeling");
    let settings = CclSettings::default();

    let alpha = make_alpha_sheet(16, 8);
    let mask = Mask::from_alpha(&alpha, settings.alpha_threshold);
    group.bench_function("label_components_512x256", |b| b.iter(|| label_components(black_box(&mask))));

    group.bench_function("detect_alpha_512x256", |b| {
        b.iter(|| detect_sprite_bounds(black_box(&alpha), &settings))
    });

    // Opaque sheet goes through color-key background detection first
    let keyed = make_keyed_sheet(16, 8);
    group.bench_function("detect_color_key_512x256", |b| {
        b.iter(|| detect_sprite_bounds(black_box(&keyed), &settings))
    });

    group.finish();
}

// =============================================================================
// Detection Benchmarks
// =============================================================================

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");
    let settings = DetectionSettings::default();
    let sheet = make_alpha_sheet(16, 8);

    let margins = MarginDetector::new(&settings);
    group.bench_function("margins_512x256", |b| b.iter(|| margins.scan(black_box(&sheet), Some((32, 32)))));

    let spacing = SpacingDetector::new(&settings);
    group.bench_function("spacing_512x256", |b| {
        b.iter(|| spacing.scan(black_box(&sheet), (32, 32), (0, 0)))
    });

    group.finish();
}

criterion_group!(benches, bench_transparency, bench_grid, bench_labeling, bench_detection);
criterion_main!(benches);
