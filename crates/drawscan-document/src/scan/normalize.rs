// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image normalisation ahead of local OCR: grayscale, scale into a fixed
// long-edge window, then contrast-limited adaptive histogram equalisation.

use drawscan_core::config::NormalizeSettings;
use image::imageops;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::stats::histogram;
use tracing::{debug, instrument};

use crate::image::processor::{flatten_to_luma, resample_luma};

/// Prepares a page image for the local text detector.
///
/// Drawing scans arrive anywhere from phone snapshots to 600 dpi A0 sheets.
/// The detector works best when text strokes are a few pixels wide and local
/// contrast is even, so every page goes through the same three steps:
///
/// 1. flatten alpha onto white and convert to 8-bit luma,
/// 2. scale so the longer side lies in `[min_long_edge, max_long_edge]`,
/// 3. apply CLAHE with the configured clip limit and tile grid.
///
/// The transform is deterministic for a given input and settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageNormalizer {
    settings: NormalizeSettings,
}

impl ImageNormalizer {
    pub fn new(settings: NormalizeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NormalizeSettings {
        &self.settings
    }

    /// Run the full normalisation on a decoded page.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn normalize(&self, image: &DynamicImage) -> GrayImage {
        let gray = flatten_to_luma(image);
        let scaled = self.scale(gray);
        let equalized = clahe(
            &scaled,
            self.settings.clahe_clip_limit,
            self.settings.clahe_tiles,
        );
        debug!(
            out_w = equalized.width(),
            out_h = equalized.height(),
            "Page normalised"
        );
        equalized
    }

    /// Scale a luma image into the long-edge window, preserving aspect ratio.
    pub fn scale(&self, gray: GrayImage) -> GrayImage {
        match target_dimensions(
            gray.width(),
            gray.height(),
            self.settings.min_long_edge,
            self.settings.max_long_edge,
        ) {
            Some((w, h)) => resample_luma(&gray, w, h),
            None => gray,
        }
    }
}

/// Output size for an image of `width` x `height` given the long-edge window.
///
/// Returns `None` when the image already fits (or is empty). The scaled short
/// side never drops below one pixel.
pub fn target_dimensions(width: u32, height: u32, min_long: u32, max_long: u32) -> Option<(u32, u32)> {
    let long = width.max(height);
    if long == 0 {
        return None;
    }
    let target = if long < min_long {
        min_long
    } else if long > max_long {
        max_long
    } else {
        return None;
    };

    let scale = f64::from(target) / f64::from(long);
    let scale_side = |side: u32| -> u32 {
        if side == long {
            target
        } else {
            ((f64::from(side) * scale).round() as u32).max(1)
        }
    };
    Some((scale_side(width), scale_side(height)))
}

// -- CLAHE --------------------------------------------------------------------

/// Contrast-limited adaptive histogram equalisation.
///
/// The image is split into a `tiles` x `tiles` grid (fewer tiles on images
/// smaller than the grid). Each tile gets its own equalisation curve, with
/// histogram bins clipped at `clip_limit` times the uniform bin height and
/// the excess spread evenly across all bins. Pixels are mapped by bilinear
/// interpolation between the curves of the four nearest tile centres.
///
/// A non-positive `clip_limit` disables clipping (plain adaptive
/// equalisation).
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tile_w = width.div_ceil(tiles.clamp(1, width));
    let tile_h = height.div_ceil(tiles.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut curves: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let w = tile_w.min(width - x0);
            let h = tile_h.min(height - y0);
            let tile = imageops::crop_imm(gray, x0, y0, w, h).to_image();
            let bins = histogram(&tile).channels[0];
            curves.push(equalization_curve(&bins, w * h, clip_limit));
        }
    }

    let curve = |tx: u32, ty: u32, value: usize| -> f32 {
        f32::from(curves[(ty * tiles_x + tx) as usize][value])
    };

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, ax) = neighbours(x, tile_w, tiles_x);
        let (ty0, ty1, ay) = neighbours(y, tile_h, tiles_y);
        let value = gray.get_pixel(x, y).0[0] as usize;

        let top = lerp(curve(tx0, ty0, value), curve(tx1, ty0, value), ax);
        let bottom = lerp(curve(tx0, ty1, value), curve(tx1, ty1, value), ax);
        Luma([lerp(top, bottom, ay).round().clamp(0.0, 255.0) as u8])
    })
}

/// Clip, redistribute, and integrate one tile histogram into a lookup curve.
fn equalization_curve(bins: &[u32; 256], pixels: u32, clip_limit: f32) -> [u8; 256] {
    let mut bins = *bins;

    if clip_limit > 0.0 {
        let limit = ((clip_limit * pixels as f32 / 256.0) as u32).max(1);
        let mut excess: u32 = 0;
        for bin in bins.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }

        let per_bin = excess / 256;
        let remainder = (excess % 256) as usize;
        for bin in bins.iter_mut() {
            *bin += per_bin;
        }
        if remainder > 0 {
            let step = (256 / remainder).max(1);
            for bin in bins.iter_mut().step_by(step).take(remainder) {
                *bin += 1;
            }
        }
    }

    let mut curve = [0u8; 256];
    let mut cumulative: u64 = 0;
    let total = u64::from(pixels.max(1));
    for (slot, count) in curve.iter_mut().zip(bins.iter()) {
        cumulative += u64::from(*count);
        *slot = ((cumulative * 255 + total / 2) / total).min(255) as u8;
    }
    curve
}

/// The two tile indices along one axis whose centres bracket `pos`, and the
/// interpolation weight of the second.
fn neighbours(pos: u32, tile_size: u32, tile_count: u32) -> (u32, u32, f32) {
    let centre = (pos as f32 + 0.5) / tile_size as f32 - 0.5;
    if centre <= 0.0 {
        return (0, 0, 0.0);
    }
    let last = tile_count - 1;
    let first = (centre.floor() as u32).min(last);
    if first >= last {
        return (last, last, 0.0);
    }
    (first, first + 1, centre - first as f32)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// -- Tests --------------------------------------------------------------------
