// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction configuration.
//
// The hosting service owns secrets loading; it hands us either a JSON file or
// a process environment. Absence of every credential is not an error here;
// the recognition cascade reports it through its status query instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default OpenAI-compatible gateway for provider A.
pub const DEFAULT_QWEN_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Default vision model served through the gateway.
pub const DEFAULT_QWEN_MODEL: &str = "qwen/qwen-2.5-vl-72b-instruct";
/// Default Gemini REST root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";

/// Credentials and model selection for the OpenAI-compatible provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct QwenSettings {
    pub api_key: String,
    #[serde(default = "default_qwen_base_url")]
    pub base_url: String,
    #[serde(default = "default_qwen_model")]
    pub model: String,
}

/// Credentials and model selection for Gemini.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    pub api_key: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

impl std::fmt::Debug for QwenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QwenSettings")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Local OCR model location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalOcrSettings {
    /// Set to false to keep the local engine out of the cascade entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    /// `None` means the ocrs cache directory.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

impl Default for LocalOcrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: None,
        }
    }
}

/// Image normalisation window and contrast parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    /// Images whose longer side is below this are upscaled to it.
    pub min_long_edge: u32,
    /// Images whose longer side exceeds this are downscaled to it.
    pub max_long_edge: u32,
    /// CLAHE clip limit, relative to the uniform histogram height.
    pub clahe_clip_limit: f32,
    /// CLAHE grid size per axis.
    pub clahe_tiles: u32,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            min_long_edge: 1500,
            max_long_edge: 3072,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
        }
    }
}

/// PDF rasterisation parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfRenderSettings {
    pub dpi: f32,
    /// Pages beyond this are ignored (and reported in diagnostics).
    pub max_pages: u32,
}

impl Default for PdfRenderSettings {
    fn default() -> Self {
        Self {
            dpi: 200.0,
            max_pages: 50,
        }
    }
}

/// Everything the extraction core needs from its host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub qwen: Option<QwenSettings>,
    #[serde(default)]
    pub gemini: Option<GeminiSettings>,
    #[serde(default)]
    pub local: LocalOcrSettings,
    #[serde(default)]
    pub normalize: NormalizeSettings,
    #[serde(default)]
    pub pdf: PdfRenderSettings,
    /// Upper bound on a single provider call, network or inference.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            qwen: None,
            gemini: None,
            local: LocalOcrSettings::default(),
            normalize: NormalizeSettings::default(),
            pdf: PdfRenderSettings::default(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl ExtractionConfig {
    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let qwen = get("QWEN_API_KEY").map(|api_key| QwenSettings {
            api_key,
            base_url: get("QWEN_BASE_URL").unwrap_or_else(default_qwen_base_url),
            model: get("QWEN_MODEL").unwrap_or_else(default_qwen_model),
        });

        let gemini = get("GEMINI_API_KEY").map(|api_key| GeminiSettings {
            api_key,
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(default_gemini_base_url),
            model: get("GEMINI_MODEL").unwrap_or_else(default_gemini_model),
        });

        let local = LocalOcrSettings {
            enabled: get("DRAWSCAN_LOCAL_OCR")
                .map(|flag| !matches!(flag.to_ascii_lowercase().as_str(), "0" | "false" | "off"))
                .unwrap_or(true),
            model_dir: get("DRAWSCAN_OCR_MODEL_DIR").map(PathBuf::from),
        };

        let call_timeout_secs = get("DRAWSCAN_CALL_TIMEOUT_SECS")
            .and_then(|secs| secs.trim().parse().ok())
            .unwrap_or_else(default_call_timeout_secs);

        Self {
            qwen,
            gemini,
            local,
            call_timeout_secs,
            ..Self::default()
        }
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }
}

fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}***")
}

fn default_true() -> bool {
    true
}

fn default_call_timeout_secs() -> u64 {
    120
}

fn default_qwen_base_url() -> String {
    DEFAULT_QWEN_BASE_URL.to_owned()
}

fn default_qwen_model() -> String {
    DEFAULT_QWEN_MODEL.to_owned()
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_owned()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_owned()
}
