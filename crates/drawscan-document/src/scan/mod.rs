// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: page normalisation, OCR model lookup, line scoring, and
// optical character recognition (OCR).

pub mod models;
pub mod normalize;
pub mod spans;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use models::OcrModelPaths;
pub use normalize::ImageNormalizer;
pub use spans::{OcrTuning, TextSpan};

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
