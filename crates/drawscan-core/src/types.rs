// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for drawing annotation extraction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Top-level classification of an extracted annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A size: linear, diameter, basic, fit, chamfer.
    Dimension,
    /// A geometric tolerance (feature control frame or bare symbol).
    #[serde(rename = "GD&T", alias = "GDT", alias = "GD&T Frame")]
    Gdt,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension => f.write_str("Dimension"),
            Self::Gdt => f.write_str("GD&T"),
        }
    }
}

/// Finer classification of a record.
///
/// Providers are free to invent subtypes, so anything unrecognised is kept
/// verbatim in [`Subtype::Other`] and serialised back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Subtype {
    Linear,
    Diameter,
    Basic,
    Fit,
    Radius,
    Chamfer,
    Position,
    Perpendicularity,
    Parallelism,
    Concentricity,
    Runout,
    TotalRunout,
    Flatness,
    Straightness,
    Circularity,
    Cylindricity,
    Angularity,
    Symmetry,
    ProfileOfLine,
    ProfileOfSurface,
    Other(String),
}

impl Subtype {
    /// Human-readable name, also the serialised form.
    pub fn name(&self) -> &str {
        match self {
            Self::Linear => "Linear",
            Self::Diameter => "Diameter",
            Self::Basic => "Basic",
            Self::Fit => "Fit",
            Self::Radius => "Radius",
            Self::Chamfer => "Chamfer",
            Self::Position => "Position",
            Self::Perpendicularity => "Perpendicularity",
            Self::Parallelism => "Parallelism",
            Self::Concentricity => "Concentricity",
            Self::Runout => "Runout",
            Self::TotalRunout => "Total Runout",
            Self::Flatness => "Flatness",
            Self::Straightness => "Straightness",
            Self::Circularity => "Circularity",
            Self::Cylindricity => "Cylindricity",
            Self::Angularity => "Angularity",
            Self::Symmetry => "Symmetry",
            Self::ProfileOfLine => "Profile of a Line",
            Self::ProfileOfSurface => "Profile of a Surface",
            Self::Other(name) => name,
        }
    }

    /// Subtypes that carry a plain nominal size eligible for ISO fit lookup.
    pub fn is_enrichable(&self) -> bool {
        matches!(self, Self::Diameter | Self::Linear | Self::Basic)
    }
}

impl From<String> for Subtype {
    fn from(raw: String) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "linear" => Self::Linear,
            "diameter" => Self::Diameter,
            "basic" => Self::Basic,
            "fit" => Self::Fit,
            "radius" => Self::Radius,
            "chamfer" => Self::Chamfer,
            "position" | "truposition" | "trueposition" => Self::Position,
            "perpendicularity" => Self::Perpendicularity,
            "parallelism" => Self::Parallelism,
            "concentricity" => Self::Concentricity,
            "runout" | "circularrunout" => Self::Runout,
            "totalrunout" => Self::TotalRunout,
            "flatness" => Self::Flatness,
            "straightness" => Self::Straightness,
            "circularity" | "roundness" => Self::Circularity,
            "cylindricity" => Self::Cylindricity,
            "angularity" => Self::Angularity,
            "symmetry" => Self::Symmetry,
            "profileofaline" | "profileofline" | "lineprofile" => Self::ProfileOfLine,
            "profileofasurface" | "profileofsurface" | "surfaceprofile" => {
                Self::ProfileOfSurface
            }
            _ => Self::Other(raw),
        }
    }
}

impl From<Subtype> for String {
    fn from(subtype: Subtype) -> Self {
        match subtype {
            Subtype::Other(name) => name,
            known => known.name().to_owned(),
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalised bounding box `[ymin, xmin, ymax, xmax]` on a 0–1000 scale.
///
/// Only ever copied from a provider response; the pipeline never computes one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox(pub [f32; 4]);

/// One extracted annotation, the unit of output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Subtype>,
    /// Raw measured quantity with diameter notation preserved ("Ø10").
    #[serde(default, deserialize_with = "text_or_number")]
    pub value: String,
    /// "±0.1", "H7", "Basic", "General"; empty for GD&T frames.
    #[serde(default, deserialize_with = "text_or_number")]
    pub tolerance: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "datum_letters")]
    pub datum: Option<Vec<String>>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub original_text: String,
    /// 1-based page index, assigned by the pipeline.
    #[serde(default)]
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_limits: Option<String>,
    #[serde(rename = "box_2d", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl ExtractedRecord {
    /// Build a dimension record.
    pub fn dimension(
        subtype: Subtype,
        value: impl Into<String>,
        tolerance: impl Into<String>,
        original_text: impl Into<String>,
        page: u32,
    ) -> Self {
        Self {
            kind: RecordKind::Dimension,
            subtype: Some(subtype),
            value: value.into(),
            tolerance: tolerance.into(),
            datum: None,
            original_text: original_text.into(),
            page,
            calculated_limits: None,
            bounding_box: None,
        }
    }

    /// Build a GD&T record. An empty datum list is stored as `None`.
    pub fn gdt(
        subtype: Subtype,
        value: impl Into<String>,
        datum: Vec<String>,
        original_text: impl Into<String>,
        page: u32,
    ) -> Self {
        Self {
            kind: RecordKind::Gdt,
            subtype: Some(subtype),
            value: value.into(),
            tolerance: String::new(),
            datum: if datum.is_empty() { None } else { Some(datum) },
            original_text: original_text.into(),
            page,
            calculated_limits: None,
            bounding_box: None,
        }
    }

    /// The first numeric token of `value` once symbol glyphs are ignored.
    ///
    /// `"Ø10"` → `10.0`, `"12,5"` → `12.5`, `"Position symbol"` → `None`.
    pub fn numeric_value(&self) -> Option<f64> {
        first_number(&self.value)
    }
}

/// Parse the first decimal number embedded in `text`, accepting `,` as the
/// decimal separator.
pub fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let token: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let token = token.trim_end_matches('.');
    token.parse().ok()
}

/// Providers sometimes send numbers where strings are expected, or `null`.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => text,
        Some(Raw::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

/// Datums arrive either as `"A, B, C"` or as `["A", "B", "C"]`.
fn datum_letters<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    let letters: Vec<String> = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::One(joined)) => joined
            .split(|c: char| c == ',' || c == '|' || c.is_whitespace())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(Raw::Many(list)) => list
            .into_iter()
            .map(|part| part.trim().to_owned())
            .filter(|part| !part.is_empty())
            .collect(),
        None => Vec::new(),
    };

    Ok(if letters.is_empty() { None } else { Some(letters) })
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Webp,
}

impl MediaType {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
        }
    }

    /// Parse a declared content type, ignoring parameters such as `charset`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" | "application/x-pdf" => Some(Self::Pdf),
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/tiff" | "image/tif" => Some(Self::Tiff),
            "image/bmp" | "image/x-bmp" => Some(Self::Bmp),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Infer media type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// The recognition providers, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderKind {
    /// OpenAI-compatible multimodal endpoint serving Qwen 2.5 VL.
    CloudA,
    /// Google Gemini `generateContent`.
    CloudB,
    /// On-device `ocrs` detector and recogniser.
    Local,
}

impl ProviderKind {
    /// Name shown in operator diagnostics.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CloudA => "Qwen 2.5 VL (Cloud)",
            Self::CloudB => "Gemini Flash (Cloud)",
            Self::Local => "ocrs (Local)",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub id: Uuid,
    /// SHA-256 of the input bytes.
    pub document_sha256: String,
    pub processed_at: DateTime<Utc>,
    pub page_count: u32,
    /// Provider whose output was kept, if any produced records.
    pub engine: Option<ProviderKind>,
    pub results: Vec<ExtractedRecord>,
    /// Operator-facing notes about skipped pages or failed providers.
    pub diagnostics: Vec<String>,
}

impl ExtractionReport {
    pub fn new(document_sha256: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_sha256,
            processed_at: Utc::now(),
            page_count: 0,
            engine: None,
            results: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// The `{"results": [...]}` body handed back to the upload layer.
    pub fn to_response(&self) -> serde_json::Value {
        serde_json::json!({ "results": self.results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serialises_with_wire_names() {
        let record = ExtractedRecord::dimension(Subtype::Diameter, "Ø20", "H7", "Ø20 H7", 1);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Dimension");
        assert_eq!(json["subtype"], "Diameter");
        assert_eq!(json["value"], "Ø20");
        assert!(json.get("calculated_limits").is_none());
        assert!(json.get("box_2d").is_none());
    }

    #[test]
    fn gdt_kind_uses_ampersand_name() {
        let record = ExtractedRecord::gdt(Subtype::Position, "0.1", vec!["A".into()], "⌖ 0.1 A", 2);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "GD&T");
        assert_eq!(json["datum"], serde_json::json!(["A"]));
    }

    #[test]
    fn provider_record_tolerates_loose_fields() {
        let raw = r#"{
            "type": "GD&T",
            "subtype": "Concentricity",
            "value": 0.05,
            "datum": "A, B",
            "original_text": "[◎|Ø0.05|A|B]",
            "box_2d": [100, 200, 150, 260]
        }"#;
        let record: ExtractedRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.kind, RecordKind::Gdt);
        assert_eq!(record.subtype, Some(Subtype::Concentricity));
        assert_eq!(record.value, "0.05");
        assert_eq!(record.tolerance, "");
        assert_eq!(record.datum, Some(vec!["A".to_owned(), "B".to_owned()]));
        assert_eq!(record.bounding_box, Some(BoundingBox([100.0, 200.0, 150.0, 260.0])));
        assert_eq!(record.page, 0);
    }

    #[test]
    fn unknown_subtype_round_trips() {
        let subtype = Subtype::from("Thread Callout".to_owned());
        assert_eq!(subtype, Subtype::Other("Thread Callout".into()));
        assert_eq!(String::from(subtype), "Thread Callout");
        assert_eq!(Subtype::from("total runout".to_owned()), Subtype::TotalRunout);
    }

    #[test]
    fn numeric_value_ignores_glyphs() {
        let record = ExtractedRecord::dimension(Subtype::Diameter, "Ø 12,5", "General", "", 1);
        assert_eq!(record.numeric_value(), Some(12.5));
        let symbol = ExtractedRecord::gdt(Subtype::Position, "Position symbol", vec![], "⌖", 1);
        assert_eq!(symbol.numeric_value(), None);
    }

    #[test]
    fn media_type_from_mime_ignores_parameters() {
        assert_eq!(MediaType::from_mime("application/pdf; name=a.pdf"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_mime("IMAGE/JPG"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("application/msword"), None);
    }

    #[test]
    fn response_wraps_results() {
        let mut report = ExtractionReport::new("00".into());
        report
            .results
            .push(ExtractedRecord::dimension(Subtype::Basic, "12", "Basic", "(12)", 1));
        let body = report.to_response();
        assert_eq!(body["results"][0]["tolerance"], "Basic");
        assert_eq!(body.as_object().map(|o| o.len()), Some(1));
    }
}
