// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page loading: turn an uploaded document into one image per page.

use drawscan_core::config::PdfRenderSettings;
use drawscan_core::error::ScanError;
use drawscan_core::types::MediaType;
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::pdf::raster::PdfRasterizer;
use crate::pdf::reader::PdfReader;

/// A decoded page, numbered from 1.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub page: u32,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn new(page: u32, image: DynamicImage) -> Self {
        Self { page, image }
    }

    /// Lossless PNG encoding of the page, as sent to cloud providers.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScanError> {
        crate::image::processor::encode_to_format(&self.image, image::ImageFormat::Png)
    }
}

/// The pages of one document.
#[derive(Debug, Clone)]
pub struct PageSet {
    pub pages: Vec<PageImage>,
    /// Pages in the source document, including any beyond the render limit.
    pub total_pages: u32,
    /// Pages within the render limit that could not be rasterised.
    pub failed_pages: Vec<u32>,
}

impl PageSet {
    /// Whether pages past the render limit were left out.
    pub fn truncated(&self) -> bool {
        ((self.pages.len() + self.failed_pages.len()) as u32) < self.total_pages
    }
}

/// Decode `data` according to its declared media type.
///
/// Raster images yield a single page 1. PDFs are validated with lopdf and
/// rendered with PDFium at the configured DPI, up to `max_pages`.
#[instrument(skip(data, settings), fields(bytes_len = data.len()))]
pub fn load_pages(
    data: &[u8],
    media: MediaType,
    settings: &PdfRenderSettings,
) -> Result<PageSet, ScanError> {
    if data.is_empty() {
        return Err(ScanError::Conversion("the uploaded document is empty".into()));
    }

    if !media.is_pdf() {
        let image = ImageProcessor::from_bytes(data)?.into_dynamic();
        return Ok(PageSet {
            pages: vec![PageImage::new(1, image)],
            total_pages: 1,
            failed_pages: Vec::new(),
        });
    }

    let reader = PdfReader::from_bytes(data)?;
    if reader.is_encrypted() {
        return Err(ScanError::Conversion("the PDF is encrypted".into()));
    }
    let total_pages = reader.page_count() as u32;
    if total_pages == 0 {
        return Err(ScanError::Conversion("the PDF has no pages".into()));
    }

    let rasterizer = PdfRasterizer::new(*settings)?;
    let rendered = rasterizer.render(data)?;
    if rendered.pages.is_empty() {
        return Err(ScanError::Conversion("no page of the PDF could be rendered".into()));
    }

    let set = PageSet {
        pages: rendered
            .pages
            .into_iter()
            .map(|(page, image)| PageImage::new(page, image))
            .collect(),
        total_pages,
        failed_pages: rendered.failed,
    };
    if set.truncated() {
        warn!(
            rendered = set.pages.len(),
            total_pages, "PDF exceeds the page limit; trailing pages skipped"
        );
    }
    info!(pages = set.pages.len(), "Document pages loaded");
    Ok(set)
}
