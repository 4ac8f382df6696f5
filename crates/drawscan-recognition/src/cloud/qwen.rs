// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provider A: Qwen 2.5 VL through an OpenAI-compatible chat completions API.

use std::time::Duration;

use async_trait::async_trait;
use drawscan_core::config::QwenSettings;
use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::{ExtractedRecord, ProviderKind};
use drawscan_document::PageImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::prompt::{SYSTEM_PROMPT, USER_PROMPT};
use super::response::parse_records;
use super::{encode_page, http_client, read_body, transport_error};
use crate::cascade::RecognitionEngine;

const PROVIDER: ProviderKind = ProviderKind::CloudA;
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    n: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<Part<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible gateway serving a vision model.
pub struct QwenClient {
    client: reqwest::Client,
    settings: QwenSettings,
    timeout: Duration,
}

impl QwenClient {
    pub fn new(settings: QwenSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            settings,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, image_base64: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT),
                },
                Message {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        Part::Text { text: USER_PROMPT },
                        Part::ImageUrl {
                            image_url: ImageUrl {
                                url: format!("data:image/png;base64,{image_base64}"),
                                detail: "high",
                            },
                        },
                    ]),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            n: 1,
        }
    }
}

/// The first choice's text, or a parse error if the completion is empty.
fn completion_text(body: &str) -> Result<String> {
    let completion: ChatResponse = serde_json::from_str(body)
        .map_err(|err| ScanError::parse(PROVIDER, format!("unexpected completion body: {err}")))?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ScanError::parse(PROVIDER, "completion has no content"))
}

#[async_trait]
impl RecognitionEngine for QwenClient {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    #[instrument(skip(self, page), fields(page = page.page, model = %self.settings.model))]
    async fn recognize_page(&self, page: &PageImage) -> Result<Vec<ExtractedRecord>> {
        let image = encode_page(page)?;
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&self.request_body(&image))
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER, self.timeout, err))?;

        let body = read_body(PROVIDER, self.timeout, response).await?;
        let records = parse_records(PROVIDER, &completion_text(&body)?)?;
        debug!(records = records.len(), "Completion parsed");
        Ok(records)
    }
}
