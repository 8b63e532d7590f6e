// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the overlay → page coordinate transformer.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pagecrop_core::{
    CanvasSet, LayoutMode, OverlayRect, PageDimensions, PageReference, to_physical_rect,
};

/// Map one selection onto every page of a 500-page mixed-size document, as a
/// crop commit does.
fn bench_crop_commit_mapping(c: &mut Criterion) {
    let pages: Vec<(PageDimensions, PageReference)> = (0..500)
        .map(|i| {
            let rotation = (i % 4) * 90;
            let reference = PageReference::from_box(595.0 + (i % 7) as f64, 842.0, rotation);
            (reference.pixel_dims(1.5), reference)
        })
        .collect();
    let canvases = CanvasSet::from_pages(pages.iter().map(|(dims, _)| *dims));
    let selection = OverlayRect::new(40.0, 60.0, 700.0, 1000.0);

    c.bench_function("to_physical_rect x500 (odd/even)", |b| {
        b.iter(|| {
            for (index, (dims, reference)) in pages.iter().enumerate() {
                black_box(to_physical_rect(
                    black_box(&selection),
                    *dims,
                    reference,
                    index,
                    LayoutMode::OddEvenSplit,
                    &canvases,
                ));
            }
        });
    });
}

criterion_group!(benches, bench_crop_commit_mapping);
criterion_main!(benches);
