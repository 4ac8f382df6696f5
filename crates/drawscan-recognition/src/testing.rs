// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process engines and fixtures for cascade and pipeline tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::{ExtractedRecord, ProviderKind};
use drawscan_document::PageImage;
use image::{DynamicImage, RgbImage};

use crate::cascade::RecognitionEngine;

type Respond = dyn Fn(u32) -> Result<Vec<ExtractedRecord>> + Send + Sync;

/// Engine answering from a closure over the page number.
pub struct MockEngine {
    kind: ProviderKind,
    respond: Box<Respond>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    warmups: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new(
        kind: ProviderKind,
        respond: impl Fn(u32) -> Result<Vec<ExtractedRecord>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            respond: Box::new(respond),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            warmups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The same records for every page.
    pub fn returning(kind: ProviderKind, records: Vec<ExtractedRecord>) -> Self {
        Self::new(kind, move |_| Ok(records.clone()))
    }

    /// A recognition failure for every page.
    pub fn failing(kind: ProviderKind, message: &'static str) -> Self {
        Self::new(kind, move |_| Err(ScanError::recognition(kind, message)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn warmups(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.warmups)
    }
}

#[async_trait]
impl RecognitionEngine for MockEngine {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn recognize_page(&self, page: &PageImage) -> Result<Vec<ExtractedRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(page.page)
    }

    async fn warm_up(&self) -> Result<()> {
        self.warmups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `count` white pages numbered from 1.
pub fn blank_pages(count: u32) -> Vec<PageImage> {
    (1..=count)
        .map(|page| PageImage::new(page, white(32, 32)))
        .collect()
}

/// A small PNG upload.
pub fn png_upload() -> Vec<u8> {
    let mut bytes = Vec::new();
    white(64, 48)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn white(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255])))
}
