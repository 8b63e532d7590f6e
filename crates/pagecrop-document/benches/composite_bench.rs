// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the overlay compositor: an all-pages overlay and
// an odd/even split over a stack of mixed-size page rasters.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use pagecrop_document::{OverlayGroup, compose};

/// Twelve rasters alternating between two sizes, as a scanned book with
/// slightly different recto/verso crops would render at low zoom.
fn page_stack() -> Vec<Option<RgbaImage>> {
    (0..12u8)
        .map(|i| {
            let (w, h) = if i % 2 == 0 { (300, 420) } else { (310, 415) };
            Some(RgbaImage::from_pixel(w, h, Rgba([i * 20, 128, 255 - i * 20, 255])))
        })
        .collect()
}

fn bench_compose(c: &mut Criterion) {
    let rasters = page_stack();

    c.bench_function("compose all (12 pages)", |b| {
        b.iter(|| black_box(compose(black_box(&rasters), OverlayGroup::All)));
    });

    c.bench_function("compose odd+even (12 pages)", |b| {
        b.iter(|| {
            black_box(compose(black_box(&rasters), OverlayGroup::Odd));
            black_box(compose(black_box(&rasters), OverlayGroup::Even));
        });
    });
}

criterion_group!(benches, bench_compose);
criterion_main!(benches);
