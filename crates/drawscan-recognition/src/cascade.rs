// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition cascade: ordered providers with fall-through on failure or
// empty output.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use drawscan_core::config::ExtractionConfig;
use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::{ExtractedRecord, ProviderKind};
use drawscan_document::{OcrModelPaths, PageImage};
use tracing::{info, instrument, warn};

use crate::cloud::{GeminiClient, QwenClient};

/// One recognition provider.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Records found on one page. The cascade assigns `page` afterwards.
    async fn recognize_page(&self, page: &PageImage) -> Result<Vec<ExtractedRecord>>;

    /// Load anything expensive ahead of the first page.
    async fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}

/// Which providers this deployment can use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    pub cloud_a: bool,
    pub cloud_b: bool,
    pub local: bool,
}

impl Availability {
    /// Cloud providers need a key; the local one needs the `ocr` feature and
    /// both model files on disk.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            cloud_a: config.qwen.is_some(),
            cloud_b: config.gemini.is_some(),
            local: cfg!(feature = "ocr")
                && config.local.enabled
                && OcrModelPaths::from_settings(&config.local).available(),
        }
    }
}

/// Provider order for a deployment: A, then B, then local, skipping any that
/// are unavailable.
pub fn select_providers(availability: &Availability) -> Result<Vec<ProviderKind>> {
    let order: Vec<ProviderKind> = [
        (ProviderKind::CloudA, availability.cloud_a),
        (ProviderKind::CloudB, availability.cloud_b),
        (ProviderKind::Local, availability.local),
    ]
    .into_iter()
    .filter_map(|(kind, available)| available.then_some(kind))
    .collect();

    if order.is_empty() {
        return Err(ScanError::Configuration(
            "no cloud API key is set and local OCR models are unavailable".into(),
        ));
    }
    Ok(order)
}

/// What the status endpoint reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Active(ProviderKind),
    Unconfigured(String),
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(kind) => write!(f, "{kind}"),
            Self::Unconfigured(reason) => write!(f, "No engine configured ({reason})"),
        }
    }
}

/// Result of running one document through the cascade.
#[derive(Debug, Default)]
pub struct CascadeOutcome {
    /// Records from the first provider that produced any, with `page` set.
    pub records: Vec<ExtractedRecord>,
    pub engine: Option<ProviderKind>,
    /// Every failure seen along the way, oldest first.
    pub errors: Vec<ScanError>,
}

impl CascadeOutcome {
    pub fn last_error(&self) -> Option<&ScanError> {
        self.errors.last()
    }
}

pub struct RecognitionCascade {
    engines: Vec<Box<dyn RecognitionEngine>>,
    call_timeout: Duration,
    unconfigured: Option<String>,
}

impl RecognitionCascade {
    /// Build every available provider in priority order.
    ///
    /// Never fails: with nothing available the cascade still exists, reports
    /// [`EngineStatus::Unconfigured`], and extracts nothing.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let availability = Availability::from_config(config);
        let order = match select_providers(&availability) {
            Ok(order) => order,
            Err(err) => {
                warn!(error = %err, "Recognition cascade is unconfigured");
                return Self::unconfigured(err.to_string(), config.call_timeout());
            }
        };

        let timeout = config.call_timeout();
        let mut engines: Vec<Box<dyn RecognitionEngine>> = Vec::with_capacity(order.len());
        for kind in order {
            match build_engine(kind, config, timeout) {
                Ok(Some(engine)) => engines.push(engine),
                Ok(None) => {}
                Err(err) => warn!(provider = %kind, error = %err, "Provider could not be built"),
            }
        }

        if engines.is_empty() {
            return Self::unconfigured("every available provider failed to initialise".into(), timeout);
        }

        info!(
            providers = ?engines.iter().map(|e| e.kind()).collect::<Vec<_>>(),
            "Recognition cascade ready"
        );
        Self {
            engines,
            call_timeout: timeout,
            unconfigured: None,
        }
    }

    /// Use the given providers, in the given order.
    pub fn with_engines(engines: Vec<Box<dyn RecognitionEngine>>) -> Self {
        let call_timeout = ExtractionConfig::default().call_timeout();
        if engines.is_empty() {
            return Self::unconfigured("no engines were supplied".into(), call_timeout);
        }
        Self {
            engines,
            call_timeout,
            unconfigured: None,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    fn unconfigured(reason: String, call_timeout: Duration) -> Self {
        Self {
            engines: Vec::new(),
            call_timeout,
            unconfigured: Some(reason),
        }
    }

    pub fn providers(&self) -> Vec<ProviderKind> {
        self.engines.iter().map(|engine| engine.kind()).collect()
    }

    /// The provider tried first, or why there is none.
    pub fn active_engine(&self) -> EngineStatus {
        match (self.engines.first(), &self.unconfigured) {
            (Some(engine), _) => EngineStatus::Active(engine.kind()),
            (None, Some(reason)) => EngineStatus::Unconfigured(reason.clone()),
            (None, None) => EngineStatus::Unconfigured("no engines".into()),
        }
    }

    /// Load local models now instead of on the first page.
    pub async fn warm_up(&self) -> Result<()> {
        for engine in &self.engines {
            if engine.kind() == ProviderKind::Local {
                engine.warm_up().await?;
            }
        }
        Ok(())
    }

    /// Run pages through each provider in order until one yields records.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn extract_document(&self, pages: &[PageImage]) -> CascadeOutcome {
        let mut outcome = CascadeOutcome::default();
        if self.engines.is_empty() {
            let reason = self.unconfigured.clone().unwrap_or_default();
            outcome.errors.push(ScanError::Configuration(reason));
            return outcome;
        }

        for engine in &self.engines {
            let provider = engine.kind();
            let mut records = Vec::new();

            for page in pages {
                match self.recognize(engine.as_ref(), page).await {
                    Ok(found) => records.extend(found.into_iter().map(|mut record| {
                        record.page = page.page;
                        record
                    })),
                    Err(err) => {
                        warn!(%provider, page = page.page, error = %err, "Page recognition failed");
                        outcome.errors.push(err);
                    }
                }
            }

            if !records.is_empty() {
                info!(%provider, records = records.len(), "Provider produced records");
                outcome.records = records;
                outcome.engine = Some(provider);
                return outcome;
            }
            info!(%provider, "Provider produced no records, falling through");
        }

        outcome
    }

    async fn recognize(&self, engine: &dyn RecognitionEngine, page: &PageImage) -> Result<Vec<ExtractedRecord>> {
        match tokio::time::timeout(self.call_timeout, engine.recognize_page(page)).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::Timeout {
                provider: engine.kind(),
                seconds: self.call_timeout.as_secs(),
            }),
        }
    }
}

fn build_engine(
    kind: ProviderKind,
    config: &ExtractionConfig,
    timeout: Duration,
) -> Result<Option<Box<dyn RecognitionEngine>>> {
    let engine: Box<dyn RecognitionEngine> = match kind {
        ProviderKind::CloudA => match &config.qwen {
            Some(settings) => Box::new(QwenClient::new(settings.clone(), timeout)?),
            None => return Ok(None),
        },
        ProviderKind::CloudB => match &config.gemini {
            Some(settings) => Box::new(GeminiClient::new(settings.clone(), timeout)?),
            None => return Ok(None),
        },
        ProviderKind::Local => return Ok(local_engine(config)),
    };
    Ok(Some(engine))
}

#[cfg(feature = "ocr")]
fn local_engine(config: &ExtractionConfig) -> Option<Box<dyn RecognitionEngine>> {
    let paths = OcrModelPaths::from_settings(&config.local);
    Some(Box::new(crate::local::LocalOcrEngine::new(paths, config.normalize)))
}

#[cfg(not(feature = "ocr"))]
fn local_engine(_config: &ExtractionConfig) -> Option<Box<dyn RecognitionEngine>> {
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use drawscan_core::config::QwenSettings;
    use drawscan_core::types::Subtype;

    use super::*;
    use crate::testing::{MockEngine, blank_pages};

    fn record(value: &str) -> ExtractedRecord {
        ExtractedRecord::dimension(Subtype::Linear, value, "±0.1", value, 0)
    }

    #[test]
    fn providers_keep_priority_order() {
        let all = Availability {
            cloud_a: true,
            cloud_b: true,
            local: true,
        };
        assert_eq!(
            select_providers(&all).unwrap(),
            vec![ProviderKind::CloudA, ProviderKind::CloudB, ProviderKind::Local]
        );

        let partial = Availability {
            cloud_b: true,
            local: true,
            ..Availability::default()
        };
        assert_eq!(
            select_providers(&partial).unwrap(),
            vec![ProviderKind::CloudB, ProviderKind::Local]
        );
    }

    #[test]
    fn nothing_available_is_a_configuration_error() {
        let err = select_providers(&Availability::default()).unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
    }

    #[test]
    fn unconfigured_cascade_reports_status() {
        let mut config = ExtractionConfig::default();
        config.local.enabled = false;
        let cascade = RecognitionCascade::from_config(&config);
        assert!(matches!(cascade.active_engine(), EngineStatus::Unconfigured(_)));
        assert!(cascade.providers().is_empty());
    }

    #[test]
    fn configured_key_makes_provider_a_active() {
        let mut config = ExtractionConfig::default();
        config.local.enabled = false;
        config.qwen = Some(QwenSettings {
            api_key: "sk-test".into(),
            base_url: "http://127.0.0.1:9".into(),
            model: "m".into(),
        });
        let cascade = RecognitionCascade::from_config(&config);
        assert_eq!(cascade.active_engine(), EngineStatus::Active(ProviderKind::CloudA));
        assert_eq!(cascade.active_engine().to_string(), "Qwen 2.5 VL (Cloud)");
    }

    #[tokio::test]
    async fn first_productive_provider_short_circuits() {
        let first = MockEngine::returning(ProviderKind::CloudA, vec![record("50")]);
        let second = MockEngine::returning(ProviderKind::CloudB, vec![record("20")]);
        let second_calls = second.calls();
        let cascade = RecognitionCascade::with_engines(vec![Box::new(first), Box::new(second)]);

        let outcome = cascade.extract_document(&blank_pages(2)).await;
        assert_eq!(outcome.engine, Some(ProviderKind::CloudA));
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_output_falls_through() {
        let first = MockEngine::returning(ProviderKind::CloudA, Vec::new());
        let second = MockEngine::returning(ProviderKind::Local, vec![record("20")]);
        let cascade = RecognitionCascade::with_engines(vec![Box::new(first), Box::new(second)]);

        let outcome = cascade.extract_document(&blank_pages(1)).await;
        assert_eq!(outcome.engine, Some(ProviderKind::Local));
        assert_eq!(outcome.records[0].value, "20");
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn failure_falls_through_and_is_recorded() {
        let first = MockEngine::failing(ProviderKind::CloudA, "HTTP 401");
        let second = MockEngine::returning(ProviderKind::CloudB, vec![record("20")]);
        let cascade = RecognitionCascade::with_engines(vec![Box::new(first), Box::new(second)]);

        let outcome = cascade.extract_document(&blank_pages(1)).await;
        assert_eq!(outcome.engine, Some(ProviderKind::CloudB));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].provider(), Some(ProviderKind::CloudA));
    }

    #[tokio::test]
    async fn exhaustion_returns_empty_with_last_error() {
        let first = MockEngine::failing(ProviderKind::CloudA, "HTTP 500");
        let second = MockEngine::failing(ProviderKind::CloudB, "HTTP 503");
        let cascade = RecognitionCascade::with_engines(vec![Box::new(first), Box::new(second)]);

        let outcome = cascade.extract_document(&blank_pages(1)).await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.engine, None);
        let last = outcome.last_error().unwrap();
        assert_eq!(last.provider(), Some(ProviderKind::CloudB));
    }

    #[tokio::test]
    async fn failed_page_does_not_discard_other_pages() {
        let engine = MockEngine::new(ProviderKind::CloudA, |page| {
            if page == 1 {
                Err(ScanError::recognition(ProviderKind::CloudA, "HTTP 500"))
            } else {
                Ok(vec![ExtractedRecord::dimension(Subtype::Basic, "12", "Basic", "(12)", 0)])
            }
        });
        let cascade = RecognitionCascade::with_engines(vec![Box::new(engine)]);

        let outcome = cascade.extract_document(&blank_pages(2)).await;
        assert_eq!(outcome.engine, Some(ProviderKind::CloudA));
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].page, 2);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn pages_are_assigned_to_records() {
        let engine = MockEngine::returning(ProviderKind::CloudB, vec![record("50")]);
        let cascade = RecognitionCascade::with_engines(vec![Box::new(engine)]);

        let outcome = cascade.extract_document(&blank_pages(3)).await;
        let pages: Vec<u32> = outcome.records.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn slow_provider_times_out_and_falls_through() {
        let slow = MockEngine::returning(ProviderKind::CloudA, vec![record("50")])
            .with_delay(Duration::from_secs(5));
        let fast = MockEngine::returning(ProviderKind::Local, vec![record("20")]);
        let cascade = RecognitionCascade::with_engines(vec![Box::new(slow), Box::new(fast)])
            .with_call_timeout(Duration::from_millis(50));

        let outcome = cascade.extract_document(&blank_pages(1)).await;
        assert_eq!(outcome.engine, Some(ProviderKind::Local));
        assert!(matches!(
            outcome.errors[0],
            ScanError::Timeout {
                provider: ProviderKind::CloudA,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn no_engines_extracts_nothing() {
        let cascade = RecognitionCascade::with_engines(Vec::new());
        let outcome = cascade.extract_document(&blank_pages(1)).await;
        assert!(outcome.records.is_empty());
        assert!(matches!(outcome.last_error(), Some(ScanError::Configuration(_))));
    }

    #[tokio::test]
    async fn warm_up_only_touches_the_local_engine() {
        let cloud = MockEngine::returning(ProviderKind::CloudA, Vec::new());
        let local = MockEngine::returning(ProviderKind::Local, Vec::new());
        let cloud_warmups = cloud.warmups();
        let local_warmups = local.warmups();
        let cascade = RecognitionCascade::with_engines(vec![Box::new(cloud), Box::new(local)]);

        cascade.warm_up().await.unwrap();
        assert_eq!(cloud_warmups.load(Ordering::SeqCst), 0);
        assert_eq!(local_warmups.load(Ordering::SeqCst), 1);
    }
}
