// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document handling for drawing extraction.
//
// Decodes uploads into page images (PDF rasterisation through PDFium, raster
// formats through `image`), normalises pages for OCR (grayscale, long-edge
// window, CLAHE), and runs the local ocrs engine behind the `ocr` feature.

pub mod image;
pub mod pages;
pub mod pdf;
pub mod scan;

pub use image::processor::ImageProcessor;
pub use pages::{PageImage, PageSet, load_pages};
pub use pdf::reader::PdfReader;
pub use scan::models::OcrModelPaths;
pub use scan::normalize::ImageNormalizer;
pub use scan::spans::{OcrTuning, TextSpan};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
