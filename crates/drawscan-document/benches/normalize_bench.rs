// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page normalisation in the drawscan-document crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use drawscan_core::config::NormalizeSettings;
use drawscan_document::ImageNormalizer;
use drawscan_document::scan::normalize::clahe;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// A light-grey sheet crossed by darker dimension lines every 40 px.
fn synthetic_sheet(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if x % 40 < 2 || y % 40 < 2 {
            Luma([90u8])
        } else {
            Luma([200u8])
        }
    })
}

/// Full normalisation of a small phone snapshot, which takes the upscale path.
fn bench_normalize_upscale(c: &mut Criterion) {
    let page = DynamicImage::ImageLuma8(synthetic_sheet(800, 600));
    let normalizer = ImageNormalizer::new(NormalizeSettings::default());

    c.bench_function("normalize (800x600 -> 1500x1125)", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(&page))));
    });
}

/// CLAHE alone on an image already inside the window.
fn bench_clahe(c: &mut Criterion) {
    let gray = synthetic_sheet(2000, 1400);

    c.bench_function("clahe (2000x1400, 8x8 tiles)", |b| {
        b.iter(|| black_box(clahe(black_box(&gray), 2.0, 8)));
    });
}

criterion_group!(benches, bench_normalize_upscale, bench_clahe);
criterion_main!(benches);
