// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition providers and the extraction pipeline.
//
// Two cloud vision models and an optional on-device OCR engine sit behind one
// trait. The cascade tries them in priority order; the pipeline wraps it with
// page decoding, deduplication, and ISO fit enrichment.
//
// # Example
//
// ```no_run
// use drawscan_core::ExtractionConfig;
// use drawscan_recognition::DrawingExtractor;
//
// # async fn run() {
// let extractor = DrawingExtractor::from_config(&ExtractionConfig::from_env());
// let report = extractor.extract_file("bracket.pdf", None).await;
// println!("{}", report.to_response());
// # }
// ```

pub mod cascade;
pub mod cloud;
pub mod pipeline;

#[cfg(feature = "ocr")]
pub mod local;

#[cfg(test)]
mod testing;

pub use cascade::{
    Availability, CascadeOutcome, EngineStatus, RecognitionCascade, RecognitionEngine,
    select_providers,
};
pub use cloud::{GeminiClient, QwenClient};
pub use pipeline::{DrawingExtractor, fingerprint};

#[cfg(feature = "ocr")]
pub use local::LocalOcrEngine;
