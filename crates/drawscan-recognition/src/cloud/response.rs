// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Turning a model's free-text answer into records.

use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::{ExtractedRecord, ProviderKind};
use serde_json::Value;
use tracing::{debug, warn};

/// Remove a surrounding ```` ```json ```` or ```` ``` ```` fence, if any.
pub fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let body = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text;
    };
    body.split_once("```").map_or(body, |(inner, _)| inner).trim()
}

/// Everything from the first `[` to the last `]`.
fn array_slice(text: &str) -> Option<&str> {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
        _ => None,
    }
}

/// The answer as a JSON array, recovered from surrounding prose if needed.
fn parse_array(text: &str) -> serde_json::Result<Vec<Value>> {
    let direct = match serde_json::from_str(text) {
        Ok(elements) => return Ok(elements),
        Err(err) => err,
    };
    match array_slice(text) {
        Some(slice) if slice.len() < text.len() => serde_json::from_str(slice),
        _ => Err(direct),
    }
}

/// Parse a provider's answer into records.
///
/// An answer with no JSON array in it becomes a [`ScanError::Parse`].
/// Elements that are not valid records are logged and skipped.
pub fn parse_records(provider: ProviderKind, text: &str) -> Result<Vec<ExtractedRecord>> {
    let elements = parse_array(strip_fences(text)).map_err(|err| {
        let preview: String = text.chars().take(200).collect();
        warn!(%provider, %preview, "Provider response is not a record array");
        ScanError::parse(provider, err.to_string())
    })?;

    let total = elements.len();
    let records: Vec<ExtractedRecord> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value(element) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(%provider, index, error = %err, "Skipping malformed record");
                None
            }
        })
        .collect();
    debug!(%provider, total, kept = records.len(), "Provider records parsed");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use drawscan_core::types::{RecordKind, Subtype};

    use super::*;

    const RECORD: &str = r#"[{"type": "Dimension", "subtype": "Linear", "value": "50", "tolerance": "±0.1", "original_text": "50 ± 0.1"}]"#;

    #[test]
    fn bare_array_parses() {
        let records = parse_records(ProviderKind::CloudA, RECORD).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Dimension);
        assert_eq!(records[0].subtype, Some(Subtype::Linear));
    }

    #[test]
    fn json_fence_is_stripped() {
        let fenced = format!("```json\n{RECORD}\n```");
        assert_eq!(parse_records(ProviderKind::CloudB, &fenced).unwrap().len(), 1);
    }

    #[test]
    fn plain_fence_is_stripped() {
        let fenced = format!("Here you go:\n```\n{RECORD}\n```\nAnything else?");
        assert_eq!(parse_records(ProviderKind::CloudB, &fenced).unwrap().len(), 1);
    }

    #[test]
    fn surrounding_prose_is_sliced_off() {
        let chatty = format!("I found these annotations: {RECORD} Let me know.");
        assert_eq!(parse_records(ProviderKind::CloudA, &chatty).unwrap().len(), 1);
    }

    #[test]
    fn trailing_prose_after_array_is_dropped() {
        let chatty = format!("{RECORD}\nNote: values read at 200 dpi.");
        let records = parse_records(ProviderKind::CloudA, &chatty).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "50");
    }

    #[test]
    fn unknown_record_type_is_skipped_not_fatal() {
        let mixed = r#"[
            {"type": "Dimension", "subtype": "Diameter", "value": "Ø10", "tolerance": "H7", "original_text": "Ø10 H7"},
            {"type": "Surface Finish", "value": "Ra 1.6", "original_text": "Ra 1.6"},
            "stray string"
        ]"#;
        let records = parse_records(ProviderKind::CloudB, mixed).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "Ø10");
    }

    #[test]
    fn empty_array_is_not_an_error() {
        assert!(parse_records(ProviderKind::CloudA, "[]").unwrap().is_empty());
    }

    #[test]
    fn prose_only_is_a_parse_error() {
        let err = parse_records(ProviderKind::CloudB, "I cannot read this drawing.").unwrap_err();
        assert!(matches!(err, ScanError::Parse { provider: ProviderKind::CloudB, .. }));
    }
}
