// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local OCR engine built on `ocrs`, a pure-Rust OCR engine whose neural
// network models run on `rten`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// drawscan-document = { path = "crates/drawscan-document", features = ["ocr"] }
// ```
//
// Model lookup lives in [`super::models`].

use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use rten_tensor::prelude::*;
use tracing::{debug, info, instrument};

use drawscan_core::error::ScanError;
use drawscan_core::types::ProviderKind;

use super::models::OcrModelPaths;
use super::spans::{OcrTuning, TextProbabilityMap, TextSpan, WordBox, retain_confident, score_line};

fn local_error(message: String) -> ScanError {
    ScanError::recognition(ProviderKind::Local, message)
}

/// Text-line recogniser for normalised drawing pages.
///
/// Model loading is the expensive step; build one engine and reuse it for
/// every page. Inference is CPU-bound and blocking.
///
/// **Important:** `ocrs` and `rten` must be compiled in release mode. Debug
/// builds are 10-100x slower.
pub struct OcrEngine {
    engine: OcrsEngine,
    tuning: OcrTuning,
}

impl OcrEngine {
    /// Load both models from `paths`.
    #[instrument(skip_all, fields(
        detection = %paths.detection.display(),
        recognition = %paths.recognition.display(),
    ))]
    pub fn new(paths: &OcrModelPaths, tuning: OcrTuning) -> Result<Self, ScanError> {
        paths.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&paths.detection).map_err(|err| {
            local_error(format!(
                "failed to load detection model from {}: {}",
                paths.detection.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model = Model::load_file(&paths.recognition).map_err(|err| {
            local_error(format!(
                "failed to load recognition model from {}: {}",
                paths.recognition.display(),
                err
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| local_error(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine initialised");
        Ok(Self { engine, tuning })
    }

    /// Recognise scored text lines on a normalised page.
    ///
    /// Lines at or below the configured confidence floor are already removed.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn recognize_spans(&self, page: &GrayImage) -> Result<Vec<TextSpan>, ScanError> {
        let rgb = DynamicImage::ImageLuma8(page.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            local_error(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| local_error(format!("OCR preprocessing failed: {}", err)))?;

        let text_map = self
            .engine
            .detect_text_pixels(&input)
            .map_err(|err| local_error(format!("text pixel detection failed: {}", err)))?;
        let [map_h, map_w] = text_map.shape();
        let probability = TextProbabilityMap::new(map_w, map_h, text_map.iter().copied().collect())
            .ok_or_else(|| local_error("text probability map has an unexpected size".into()))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| local_error(format!("word detection failed: {}", err)))?;
        debug!(word_count = word_rects.len(), "Words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        debug!(line_count = line_rects.len(), "Text lines found");

        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| local_error(format!("line recognition failed: {}", err)))?;

        let mut spans = Vec::with_capacity(lines.len());
        for line in lines.iter().flatten() {
            let words: Vec<WordBox> = line
                .words()
                .map(|word| {
                    let rect = word.bounding_rect();
                    WordBox {
                        text: word.to_string(),
                        left: rect.left() as f32,
                        top: rect.top() as f32,
                        right: rect.right() as f32,
                        bottom: rect.bottom() as f32,
                    }
                })
                .collect();
            if let Some(span) = score_line(&words, &probability, &self.tuning) {
                spans.push(span);
            }
        }

        let detected = spans.len();
        let spans = retain_confident(spans, self.tuning.min_line_confidence);
        info!(detected, kept = spans.len(), "Local OCR complete");
        Ok(spans)
    }
}
