// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document pipeline: fingerprint, decode pages, cascade, dedup, enrich.

use std::path::Path;

use drawscan_core::config::{ExtractionConfig, PdfRenderSettings};
use drawscan_core::diagnostics::diagnose;
use drawscan_core::error::ScanError;
use drawscan_core::types::{ExtractedRecord, ExtractionReport, MediaType, RecordKind};
use drawscan_document::{PageSet, load_pages};
use drawscan_extract::{deduplicate, enrich_records};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::cascade::RecognitionCascade;

/// Hex SHA-256 of a document.
pub fn fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Record `err` on the report as an operator diagnostic.
fn note(report: &mut ExtractionReport, err: &ScanError) {
    let diagnostic = diagnose(err);
    warn!(error = %err, severity = ?diagnostic.severity, "{}", diagnostic.message);
    report.diagnostics.push(diagnostic.to_string());
}

/// Drop dimensions whose value carries no number ("see note", "TYP").
fn retain_measurable(records: Vec<ExtractedRecord>) -> Vec<ExtractedRecord> {
    records
        .into_iter()
        .filter(|record| {
            let measurable = record.kind != RecordKind::Dimension || record.numeric_value().is_some();
            if !measurable {
                warn!(
                    page = record.page,
                    value = %record.value,
                    original_text = %record.original_text,
                    "Dropping dimension without a numeric value"
                );
            }
            measurable
        })
        .collect()
}

/// Entry point for the upload layer. Every call returns a report; document
/// problems end up in `diagnostics`, never as errors.
pub struct DrawingExtractor {
    cascade: RecognitionCascade,
    pdf: PdfRenderSettings,
}

impl DrawingExtractor {
    pub fn new(cascade: RecognitionCascade) -> Self {
        Self {
            cascade,
            pdf: PdfRenderSettings::default(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            cascade: RecognitionCascade::from_config(config),
            pdf: config.pdf,
        }
    }

    pub fn with_pdf_settings(mut self, pdf: PdfRenderSettings) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn cascade(&self) -> &RecognitionCascade {
        &self.cascade
    }

    #[instrument(skip(self, data), fields(bytes_len = data.len()))]
    pub async fn extract_bytes(&self, data: &[u8], media: MediaType) -> ExtractionReport {
        let mut report = ExtractionReport::new(fingerprint(data));

        let pages = match self.decode(data.to_vec(), media).await {
            Ok(pages) => pages,
            Err(err) => {
                note(&mut report, &err);
                return report;
            }
        };

        report.page_count = pages.total_pages;
        if !pages.failed_pages.is_empty() {
            let list: Vec<String> = pages.failed_pages.iter().map(u32::to_string).collect();
            report.diagnostics.push(format!(
                "Page(s) {} could not be rendered and were skipped.",
                list.join(", ")
            ));
        }
        if pages.truncated() {
            report.diagnostics.push(format!(
                "Only the first {} of {} pages were processed.",
                pages.pages.len(),
                pages.total_pages
            ));
        }

        let outcome = self.cascade.extract_document(&pages.pages).await;
        for err in &outcome.errors {
            note(&mut report, err);
        }

        let extracted = outcome.records.len();
        report.engine = outcome.engine;
        report.results = enrich_records(deduplicate(retain_measurable(outcome.records)));
        info!(
            sha256 = %report.document_sha256,
            engine = ?report.engine,
            extracted,
            kept = report.results.len(),
            "Document processed"
        );
        report
    }

    /// Read `path` and extract it. A missing media type is inferred from the
    /// file extension.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn extract_file(&self, path: impl AsRef<Path>, media: Option<MediaType>) -> ExtractionReport {
        let path = path.as_ref();
        let media = media.or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(MediaType::from_extension)
        });

        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(err) => {
                let mut report = ExtractionReport::new(String::new());
                note(&mut report, &ScanError::Io(err));
                return report;
            }
        };

        match media {
            Some(media) => self.extract_bytes(&data, media).await,
            None => {
                let mut report = ExtractionReport::new(fingerprint(&data));
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                note(&mut report, &ScanError::UnsupportedMedia(name));
                report
            }
        }
    }

    /// Decoding and rasterising are CPU-bound; keep them off the runtime.
    async fn decode(&self, data: Vec<u8>, media: MediaType) -> Result<PageSet, ScanError> {
        let settings = self.pdf;
        tokio::task::spawn_blocking(move || load_pages(&data, media, &settings))
            .await
            .map_err(|err| ScanError::Conversion(format!("page decoding task failed: {err}")))?
    }
}
