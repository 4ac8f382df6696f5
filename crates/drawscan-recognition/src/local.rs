// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local provider: normalise, run ocrs on a blocking thread, classify lines.

use std::sync::Arc;

use async_trait::async_trait;
use drawscan_core::config::NormalizeSettings;
use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::{ExtractedRecord, ProviderKind};
use drawscan_document::{ImageNormalizer, OcrEngine, OcrModelPaths, OcrTuning, PageImage};
use drawscan_extract::TextPatternExtractor;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::cascade::RecognitionEngine;

const PROVIDER: ProviderKind = ProviderKind::Local;

fn join_error(err: tokio::task::JoinError) -> ScanError {
    ScanError::recognition(PROVIDER, format!("OCR task failed: {err}"))
}

/// On-device recogniser. Models load on first use, or on [`warm_up`].
///
/// [`warm_up`]: RecognitionEngine::warm_up
pub struct LocalOcrEngine {
    paths: OcrModelPaths,
    tuning: OcrTuning,
    normalizer: ImageNormalizer,
    extractor: TextPatternExtractor,
    engine: OnceCell<Arc<OcrEngine>>,
}

impl LocalOcrEngine {
    pub fn new(paths: OcrModelPaths, normalize: NormalizeSettings) -> Self {
        Self {
            paths,
            tuning: OcrTuning::default(),
            normalizer: ImageNormalizer::new(normalize),
            extractor: TextPatternExtractor::new(),
            engine: OnceCell::new(),
        }
    }

    pub fn with_tuning(mut self, tuning: OcrTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// The shared engine. Concurrent first callers wait on a single load.
    async fn engine(&self) -> Result<Arc<OcrEngine>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                let paths = self.paths.clone();
                let tuning = self.tuning;
                tokio::task::spawn_blocking(move || OcrEngine::new(&paths, tuning).map(Arc::new))
                    .await
                    .map_err(join_error)?
            })
            .await?;
        Ok(Arc::clone(engine))
    }
}

#[async_trait]
impl RecognitionEngine for LocalOcrEngine {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    #[instrument(skip(self, page), fields(page = page.page))]
    async fn recognize_page(&self, page: &PageImage) -> Result<Vec<ExtractedRecord>> {
        let engine = self.engine().await?;
        let normalizer = self.normalizer;
        let image = page.image.clone();

        let spans = tokio::task::spawn_blocking(move || {
            let gray = normalizer.normalize(&image);
            engine.recognize_spans(&gray)
        })
        .await
        .map_err(join_error)??;
        debug!(spans = spans.len(), "Spans recognised");

        Ok(self
            .extractor
            .extract_lines(spans.iter().map(|span| span.text.as_str()), page.page))
    }

    async fn warm_up(&self) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }
        self.engine().await?;
        info!("Local OCR models loaded");
        Ok(())
    }
}
