// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cloud vision providers.
//
// Both providers receive the page as an in-memory PNG, base64 encoded, plus
// the shared instruction text, and answer with a JSON record array.

pub mod gemini;
pub mod prompt;
pub mod qwen;
pub mod response;

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose;
use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::ProviderKind;
use drawscan_document::PageImage;

pub use gemini::GeminiClient;
pub use qwen::QwenClient;

/// HTTP client whose own timeout matches the per-call budget.
pub(crate) fn http_client(provider: ProviderKind, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ScanError::recognition(provider, format!("HTTP client setup failed: {err}")))
}

/// Base64 PNG payload for one page.
pub(crate) fn encode_page(page: &PageImage) -> Result<String> {
    let png = page.to_png_bytes()?;
    Ok(general_purpose::STANDARD.encode(png))
}

/// Map a transport failure, keeping timeouts distinguishable. The URL is
/// dropped from the message because Gemini carries its key in the query.
pub(crate) fn transport_error(provider: ProviderKind, timeout: Duration, err: reqwest::Error) -> ScanError {
    let err = err.without_url();
    if err.is_timeout() {
        ScanError::Timeout {
            provider,
            seconds: timeout.as_secs(),
        }
    } else {
        ScanError::recognition(provider, format!("request failed: {err}"))
    }
}

/// Read a response body, turning non-2xx statuses into recognition errors
/// that carry the status code.
pub(crate) async fn read_body(
    provider: ProviderKind,
    timeout: Duration,
    response: reqwest::Response,
) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| transport_error(provider, timeout, err))?;
    if !status.is_success() {
        let excerpt: String = body.chars().take(300).collect();
        return Err(ScanError::recognition(
            provider,
            format!("HTTP {}: {excerpt}", status.as_u16()),
        ));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use image::{DynamicImage, RgbImage};

    use super::*;

    #[test]
    fn encoded_page_is_png() {
        let page = PageImage::new(1, DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        let encoded = encode_page(&page).unwrap();
        let bytes = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
