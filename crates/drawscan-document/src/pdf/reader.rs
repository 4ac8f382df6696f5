// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: structural inspection of uploaded PDFs using the `lopdf` crate.

use drawscan_core::error::ScanError;
use lopdf::Document;
use tracing::{debug, instrument};

/// Check if bytes represent a PDF file (magic bytes: `%PDF`).
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == b"%PDF"
}

/// Parses a PDF well enough to validate it and count its pages.
///
/// Rendering needs the PDFium runtime; inspection does not, so malformed
/// uploads are rejected with a precise message even on hosts without it.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanError> {
        if !is_pdf_bytes(data) {
            return Err(ScanError::Conversion(
                "declared as PDF but the %PDF header is missing".into(),
            ));
        }

        let document = Document::load_mem(data)
            .map_err(|err| ScanError::Conversion(format!("failed to load PDF from memory: {}", err)))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn is_encrypted(&self) -> bool {
        self.document.is_encrypted()
    }
}
