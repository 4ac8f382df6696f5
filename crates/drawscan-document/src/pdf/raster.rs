// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasteriser: renders pages to images through the PDFium runtime.

use drawscan_core::config::PdfRenderSettings;
use drawscan_core::error::ScanError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument, warn};

/// Longest rendered side, whatever the DPI and sheet size (A0 at 200 dpi
/// would otherwise be ~9,400 px tall).
const MAX_RENDER_DIMENSION: u32 = 8000;

/// Renders PDF pages at a fixed DPI.
///
/// Binding fails on hosts without the PDFium shared library; callers turn
/// that into a conversion diagnostic.
pub struct PdfRasterizer {
    pdfium: Pdfium,
    settings: PdfRenderSettings,
}

impl PdfRasterizer {
    /// Bind to PDFium next to the executable, then in common library
    /// directories, then on the system search path.
    pub fn new(settings: PdfRenderSettings) -> Result<Self, ScanError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/usr/local/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| ScanError::Conversion(format!("could not bind PDFium library: {}", err)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            settings,
        })
    }

    /// Render up to `max_pages` pages, in document order.
    ///
    /// A page that fails to render is logged and skipped; the rest of the
    /// document still renders.
    #[instrument(skip_all, fields(bytes_len = data.len(), dpi = self.settings.dpi))]
    pub fn render(&self, data: &[u8]) -> Result<RenderedPages, ScanError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|err| ScanError::Conversion(format!("PDFium could not open the document: {}", err)))?;

        let limit = self.settings.max_pages.max(1) as usize;
        let rendered = render_each(document.pages().iter(), limit, |page| self.render_page(page));
        info!(
            rendered = rendered.pages.len(),
            failed = rendered.failed.len(),
            "PDF rasterised"
        );
        Ok(rendered)
    }

    fn render_page(&self, page: &PdfPage) -> Result<DynamicImage, PdfiumError> {
        let (width_px, height_px) = render_size(
            page.width().value,
            page.height().value,
            self.settings.dpi,
        );

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .render_form_data(true)
            .render_annotations(true);

        Ok(page.render_with_config(&render_config)?.as_image())
    }
}

/// Pages that rendered, numbered from 1, and the numbers of those that did not.
#[derive(Debug, Default)]
pub struct RenderedPages {
    pub pages: Vec<(u32, DynamicImage)>,
    pub failed: Vec<u32>,
}

/// Render the first `limit` of `pages` with `render`, one page at a time.
pub fn render_each<P, E: std::fmt::Display>(
    pages: impl IntoIterator<Item = P>,
    limit: usize,
    mut render: impl FnMut(&P) -> Result<DynamicImage, E>,
) -> RenderedPages {
    let mut out = RenderedPages::default();
    for (page, number) in pages.into_iter().take(limit).zip(1u32..) {
        match render(&page) {
            Ok(image) => {
                debug!(
                    page = number,
                    width = image.width(),
                    height = image.height(),
                    "Page rendered"
                );
                out.pages.push((number, image));
            }
            Err(err) => {
                warn!(page = number, error = %err, "Page failed to render; skipping");
                out.failed.push(number);
            }
        }
    }
    out
}

/// Pixel size of a page of `width_pt` x `height_pt` points at `dpi`.
pub fn render_size(width_pt: f32, height_pt: f32, dpi: f32) -> (u32, u32) {
    let scale = dpi.max(1.0) / 72.0;
    let mut width = (width_pt * scale).max(1.0);
    let mut height = (height_pt * scale).max(1.0);

    let long = width.max(height);
    if long > MAX_RENDER_DIMENSION as f32 {
        let ratio = MAX_RENDER_DIMENSION as f32 / long;
        width *= ratio;
        height *= ratio;
    }
    ((width.round() as u32).max(1), (height.round() as u32).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_at_200_dpi() {
        assert_eq!(render_size(595.0, 842.0, 200.0), (1653, 2339));
    }

    #[test]
    fn a0_is_capped() {
        let (w, h) = render_size(2384.0, 3370.0, 200.0);
        assert_eq!(h, MAX_RENDER_DIMENSION);
        assert!(w < h);
    }

    #[test]
    fn failed_page_does_not_stop_the_rest() {
        let rendered = render_each([10u32, 20, 30], 10, |&width| {
            if width == 20 {
                Err("bad content stream")
            } else {
                Ok(DynamicImage::new_luma8(width, 5))
            }
        });
        let numbers: Vec<u32> = rendered.pages.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(rendered.pages[1].1.width(), 30);
        assert_eq!(rendered.failed, vec![2]);
    }

    #[test]
    fn render_each_honours_the_limit() {
        let rendered = render_each(0..5u32, 2, |_| Ok::<_, String>(DynamicImage::new_luma8(1, 1)));
        assert_eq!(rendered.pages.len(), 2);
        assert!(rendered.failed.is_empty());
    }

    #[test]
    fn degenerate_page_is_one_pixel() {
        assert_eq!(render_size(0.0, 0.0, 200.0), (1, 1));
    }
}
