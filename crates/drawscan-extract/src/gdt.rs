// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// GD&T detection: control-frame symbols, keyword fallback, and structural
// feature control frames.

use std::sync::LazyLock;

use drawscan_core::types::Subtype;
use regex::{Captures, Regex};

use crate::normalize::clean_number;

/// Characteristic symbols and their ASCII approximations. Multi-character
/// entries come first so `_|_` is never read as something shorter.
pub const SYMBOLS: &[(&str, Subtype)] = &[
    ("_|_", Subtype::Perpendicularity),
    ("(+)", Subtype::Position),
    ("//", Subtype::Parallelism),
    ("⌖", Subtype::Position),
    ("⏊", Subtype::Perpendicularity),
    ("⟂", Subtype::Perpendicularity),
    ("⊥", Subtype::Perpendicularity),
    ("∥", Subtype::Parallelism),
    ("◎", Subtype::Concentricity),
    ("↗", Subtype::Runout),
    ("⌰", Subtype::TotalRunout),
    ("⏥", Subtype::Flatness),
    ("○", Subtype::Circularity),
    ("⌭", Subtype::Cylindricity),
    ("⌒", Subtype::ProfileOfLine),
    ("⌓", Subtype::ProfileOfSurface),
    ("∠", Subtype::Angularity),
    ("⌯", Subtype::Symmetry),
    ("⏤", Subtype::Straightness),
];

/// Letters usable as datum references (I, O and Q are excluded by ISO/ASME).
pub fn is_datum_letter(c: char) -> bool {
    c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q')
}

static KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:TRUE\s+)?(POSITION|PERPENDICULAR(?:ITY)?|PARALLEL(?:ISM)?|CONCENTRIC(?:ITY)?|TOTAL\s+RUNOUT|RUNOUT|FLATNESS|STRAIGHTNESS|CIRCULARITY|ROUNDNESS|CYLINDRICITY|ANGULARITY|SYMMETRY)\b",
    )
    .expect("valid gdt keyword regex")
});

/// What may follow a symbol or keyword: zone, material modifier, datums.
static FRAME_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\s|!\[\]:;]*(?:(Ø)?(\d+(?:[.,]\d+)?))?(?:\s*\(([MLS])\)|\s*([ⓂⓁⓈ])|([MLS])\b)?((?:[\s|!\[\]:;]*[A-Z]\b)*)",
    )
    .expect("valid frame tail regex")
});

/// A decimal zone, separator noise, then a capital letter: `0.05 | A`.
static STRUCTURAL_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(Ø)?(\d+[.,]\d+)(?:\s*\(([MLS])\)|\s*([ⓂⓁⓈ])|([MLS])\b)?\s*[|!\[\]:;]+\s*([A-Z])\b((?:[\s|!\[\]:;]*[A-Z]\b)*)",
    )
    .expect("valid structural frame regex")
});

static LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("valid letter regex"));

/// A GD&T annotation found on a line. `start..end` is the byte span it
/// claims, so dimension rules never reuse its numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct GdtHit {
    pub start: usize,
    pub end: usize,
    pub subtype: Subtype,
    pub value: String,
    pub datum: Vec<String>,
}

/// Find GD&T annotations on a normalised line.
///
/// Symbols are authoritative. Keywords are consulted only when the line has
/// no symbol, and the structural frame shape only when neither matched.
pub fn detect(line: &str) -> Vec<GdtHit> {
    let symbols = detect_symbols(line);
    if !symbols.is_empty() {
        return symbols;
    }
    let keywords = detect_keywords(line);
    if !keywords.is_empty() {
        return keywords;
    }
    detect_structural(line)
}

fn detect_symbols(line: &str) -> Vec<GdtHit> {
    let mut found: Vec<(usize, usize, &Subtype)> = Vec::new();
    for (symbol, subtype) in SYMBOLS {
        for (start, _) in line.match_indices(symbol) {
            let end = start + symbol.len();
            if found.iter().all(|(s, e, _)| end <= *s || start >= *e) {
                found.push((start, end, subtype));
            }
        }
    }
    found.sort_by_key(|(start, _, _)| *start);

    let mut hits = Vec::with_capacity(found.len());
    for (index, (start, end, subtype)) in found.iter().enumerate() {
        let limit = found.get(index + 1).map_or(line.len(), |next| next.0);
        hits.push(with_tail(line, *start, *end, limit, (*subtype).clone()));
    }
    hits
}

fn detect_keywords(line: &str) -> Vec<GdtHit> {
    let matches: Vec<(usize, usize, Subtype)> = KEYWORD
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let subtype = keyword_subtype(caps.get(1)?.as_str())?;
            Some((whole.start(), whole.end(), subtype))
        })
        .collect();

    matches
        .iter()
        .enumerate()
        .map(|(index, (start, end, subtype))| {
            let limit = matches.get(index + 1).map_or(line.len(), |next| next.0);
            with_tail(line, *start, *end, limit, subtype.clone())
        })
        .collect()
}

fn detect_structural(line: &str) -> Vec<GdtHit> {
    STRUCTURAL_FRAME
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if !starts_token(line, whole.start()) {
                return None;
            }
            let first = caps.get(6)?.as_str().chars().next()?;
            if !is_datum_letter(first) {
                return None;
            }
            let mut datum = vec![first.to_string()];
            datum.extend(datum_letters(caps.get(7).map_or("", |m| m.as_str())));
            Some(GdtHit {
                start: whole.start(),
                end: whole.end(),
                subtype: Subtype::Position,
                value: zone_value(&caps, 1, 2).unwrap_or_default(),
                datum,
            })
        })
        .collect()
}

/// Attach the zone, modifier and datums that follow `line[..end]`, never
/// reading past `limit` (the next symbol or keyword).
fn with_tail(line: &str, start: usize, end: usize, limit: usize, subtype: Subtype) -> GdtHit {
    let tail = &line[end..limit];
    let (value, datum, consumed) = match FRAME_TAIL.captures(tail) {
        Some(caps) => {
            let consumed = caps.get(0).map_or(0, |m| m.end());
            let datum = datum_letters(caps.get(6).map_or("", |m| m.as_str()));
            (zone_value(&caps, 1, 2), datum, consumed)
        }
        None => (None, Vec::new(), 0),
    };

    GdtHit {
        start,
        end: end + consumed,
        value: value.unwrap_or_else(|| format!("{} symbol", subtype.name())),
        subtype,
        datum,
    }
}

/// Zone text from the diameter/number groups, plus any material modifier in
/// the three groups after them (`0.1 (M)`).
fn zone_value(caps: &Captures<'_>, diameter_group: usize, number_group: usize) -> Option<String> {
    let number = caps.get(number_group)?;
    let mut value = String::new();
    if caps.get(diameter_group).is_some() {
        value.push('Ø');
    }
    value.push_str(&clean_number(number.as_str()));

    let modifier = (number_group + 1..=number_group + 3)
        .find_map(|group| caps.get(group))
        .and_then(|m| match m.as_str() {
            "Ⓜ" => Some('M'),
            "Ⓛ" => Some('L'),
            "Ⓢ" => Some('S'),
            other => other.chars().next(),
        });
    if let Some(letter) = modifier {
        value.push_str(&format!(" ({letter})"));
    }
    Some(value)
}

fn datum_letters(raw: &str) -> Vec<String> {
    LETTER
        .find_iter(raw)
        .filter_map(|m| m.as_str().chars().next())
        .filter(|c| is_datum_letter(*c))
        .map(|c| c.to_string())
        .collect()
}

fn keyword_subtype(keyword: &str) -> Option<Subtype> {
    let key: String = keyword
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    let subtype = match key.as_str() {
        "position" => Subtype::Position,
        k if k.starts_with("perpendicular") => Subtype::Perpendicularity,
        k if k.starts_with("parallel") => Subtype::Parallelism,
        k if k.starts_with("concentric") => Subtype::Concentricity,
        "totalrunout" => Subtype::TotalRunout,
        "runout" => Subtype::Runout,
        "flatness" => Subtype::Flatness,
        "straightness" => Subtype::Straightness,
        "circularity" | "roundness" => Subtype::Circularity,
        "cylindricity" => Subtype::Cylindricity,
        "angularity" => Subtype::Angularity,
        "symmetry" => Subtype::Symmetry,
        _ => return None,
    };
    Some(subtype)
}

/// True when `start` does not split a number or word.
pub(crate) fn starts_token(line: &str, start: usize) -> bool {
    line[..start]
        .chars()
        .next_back()
        .is_none_or(|prev| !prev.is_alphanumeric() && prev != '.' && prev != ',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_symbol_alone() {
        let hits = detect("⌖");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subtype, Subtype::Position);
        assert_eq!(hits[0].value, "Position symbol");
        assert!(hits[0].datum.is_empty());
    }

    #[test]
    fn full_control_frame() {
        let hits = detect("⌖ Ø0.1 (M) | A | B | C");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, "Ø0.1 (M)");
        assert_eq!(hits[0].datum, vec!["A", "B", "C"]);
    }

    #[test]
    fn ascii_perpendicularity() {
        let hits = detect("_|_ 0.05 A");
        assert_eq!(hits[0].subtype, Subtype::Perpendicularity);
        assert_eq!(hits[0].value, "0.05");
        assert_eq!(hits[0].datum, vec!["A"]);
    }

    #[test]
    fn two_symbols_on_one_line_keep_their_own_tails() {
        let hits = detect("⏥ 0.02 ⊥ 0.05 B");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].subtype, Subtype::Flatness);
        assert_eq!(hits[0].value, "0.02");
        assert!(hits[0].datum.is_empty());
        assert_eq!(hits[1].subtype, Subtype::Perpendicularity);
        assert_eq!(hits[1].datum, vec!["B"]);
    }

    #[test]
    fn keyword_fallback() {
        let hits = detect("PERPENDICULARITY 0.05 A");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subtype, Subtype::Perpendicularity);
        assert_eq!(hits[0].value, "0.05");
        assert_eq!(hits[0].datum, vec!["A"]);

        let hits = detect("true position 0,2");
        assert_eq!(hits[0].subtype, Subtype::Position);
        assert_eq!(hits[0].value, "0.2");
    }

    #[test]
    fn keywords_ignored_when_a_symbol_is_present() {
        let hits = detect("⏥ 0.02 FLATNESS");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subtype, Subtype::Flatness);
    }

    #[test]
    fn structural_frame_with_valid_datum() {
        let hits = detect("0.05 | A");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subtype, Subtype::Position);
        assert_eq!(hits[0].value, "0.05");
        assert_eq!(hits[0].datum, vec!["A"]);
    }

    #[test]
    fn structural_frame_rejects_non_datum_letters() {
        assert!(detect("0.05 | O").is_empty());
        assert!(detect("2.5 : I").is_empty());
    }

    #[test]
    fn plain_sentence_is_not_a_frame() {
        assert!(detect("SEE NOTE 3 FOR DETAILS").is_empty());
        assert!(detect("12.5 A").is_empty());
    }

    #[test]
    fn claimed_span_covers_tail() {
        let line = "⊥ 0.05 A 50 H7";
        let hits = detect(line);
        assert_eq!(&line[hits[0].start..hits[0].end].trim_end(), &"⊥ 0.05 A");
    }
}
