// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode uploads, flatten transparency, resample, and encode
// page images using the `image` crate.

use drawscan_core::error::ScanError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use tracing::{debug, instrument};

/// A single decoded upload.
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    /// Create a processor from raw encoded bytes (PNG, JPEG, TIFF, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanError> {
        let img = image::load_from_memory(data)
            .map_err(|err| ScanError::Conversion(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScanError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Luma conversion that treats transparent pixels as white paper.
///
/// Scanned drawings exported with transparency would otherwise turn their
/// transparent paper black once the alpha channel is dropped.
pub fn flatten_to_luma(image: &DynamicImage) -> GrayImage {
    if image.color().has_alpha() {
        imageops::grayscale(&composite_on_white(image))
    } else {
        image.to_luma8()
    }
}

/// Resample a luma image to exactly `width` x `height`.
///
/// Enlargement uses Catmull-Rom (bicubic); reduction uses area averaging,
/// which keeps thin drawing lines from aliasing away.
pub fn resample_luma(gray: &GrayImage, width: u32, height: u32) -> GrayImage {
    let width = width.max(1);
    let height = height.max(1);
    let enlarging =
        u64::from(width) * u64::from(height) > u64::from(gray.width()) * u64::from(gray.height());
    debug!(
        from_w = gray.width(),
        from_h = gray.height(),
        width,
        height,
        enlarging,
        "Resampling page"
    );
    if enlarging {
        imageops::resize(gray, width, height, FilterType::CatmullRom)
    } else {
        imageops::thumbnail(gray, width, height)
    }
}

fn composite_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |channel: u8| -> u8 {
            ((u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
pub fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ScanError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanError::Conversion(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
