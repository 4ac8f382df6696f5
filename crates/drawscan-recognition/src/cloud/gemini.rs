// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provider B: Google Gemini `generateContent`.

use std::time::Duration;

use async_trait::async_trait;
use drawscan_core::config::GeminiSettings;
use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::{ExtractedRecord, ProviderKind};
use drawscan_document::PageImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::prompt::{SYSTEM_PROMPT, USER_PROMPT};
use super::response::parse_records;
use super::{encode_page, http_client, read_body, transport_error};
use crate::cascade::RecognitionEngine;

const PROVIDER: ProviderKind = ProviderKind::CloudB;
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    settings: GeminiSettings,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            settings,
            timeout,
        })
    }

    /// Endpoint without the key; the key travels as a query parameter.
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn request_body(image_base64: String) -> GenerateRequest<'static> {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text { text: SYSTEM_PROMPT }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text { text: USER_PROMPT },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: image_base64,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                candidate_count: 1,
            },
        }
    }
}

/// Concatenated text of the first candidate.
fn candidate_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|err| ScanError::parse(PROVIDER, format!("unexpected response body: {err}")))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ScanError::recognition(PROVIDER, format!("request blocked: {reason}")));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ScanError::parse(PROVIDER, "response has no candidate text"));
    }
    Ok(text)
}

#[async_trait]
impl RecognitionEngine for GeminiClient {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    #[instrument(skip(self, page), fields(page = page.page, model = %self.settings.model))]
    async fn recognize_page(&self, page: &PageImage) -> Result<Vec<ExtractedRecord>> {
        let image = encode_page(page)?;
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&Self::request_body(image))
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER, self.timeout, err))?;

        let body = read_body(PROVIDER, self.timeout, response).await?;
        let records = parse_records(PROVIDER, &candidate_text(&body)?)?;
        debug!(records = records.len(), "Candidate parsed");
        Ok(records)
    }
}
