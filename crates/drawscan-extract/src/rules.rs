// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dimension rules: the ordered pattern table that classifies numeric tokens.
//
// Each row pairs a pattern with the record shape it produces. Rows are tried
// in precedence order; every match claims its span of the line, so a number
// is classified at most once.

use std::ops::Range;
use std::sync::LazyLock;

use drawscan_core::types::Subtype;
use regex::{Captures, Regex};

use crate::gdt::starts_token;
use crate::normalize::clean_number;

/// Byte written over claimed spans. Not whitespace, so `\s*` cannot bridge a
/// claimed region, and not a word character, so `\b` still holds at its edges.
pub(crate) const CLAIMED: char = '\u{1f}';

/// Rule families, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    /// `50.0 ± 0.1`
    TolerancePair,
    /// `20 +0.1 -0.2`
    LimitDeviation,
    /// `1 x 45°`
    Chamfer,
    /// `50 H7`, `Ø20g6`, `Ø20 H7/g6`. Hole class R is left out so radius
    /// callouts such as `Ø8 R2` are not read as fits.
    FitCode,
    /// `(12)`, `[12]`
    Boxed,
    /// A `±0.1` or `+0.1 -0.2` token with no nominal of its own. Claimed so
    /// its number is not read as a dimension, but produces no record.
    DetachedTolerance,
    /// A standalone number with 3 or 4 decimals.
    HighPrecision,
    /// A standalone number with up to 2 decimals, or a prefixed integer.
    LowPrecision,
}

/// When a rule is allowed to run on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Always,
    /// Only if no explicit family (pair, deviation, chamfer, fit, boxed) matched.
    NoExplicitMatch,
    /// Only if [`Family::HighPrecision`] matched nothing.
    NoHighPrecisionMatch,
}

/// The record a rule produces for one match.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub subtype: Subtype,
    pub value: String,
    pub tolerance: String,
}

pub struct Rule {
    pub family: Family,
    pub precedence: u8,
    pub gate: Gate,
    pub pattern: &'static str,
    /// `None` claims matches without producing records.
    pub shape: Option<fn(&Captures<'_>) -> Option<Shape>>,
}

pub static RULES: &[Rule] = &[
    Rule {
        family: Family::TolerancePair,
        precedence: 10,
        gate: Gate::Always,
        pattern: r"(Ø)?(\d+(?:[.,]\d+)?)\s*±\s*(\d+(?:[.,]\d+)?)",
        shape: Some(tolerance_pair),
    },
    Rule {
        family: Family::LimitDeviation,
        precedence: 20,
        gate: Gate::Always,
        pattern: r"(Ø)?(\d+(?:[.,]\d+)?)\s*\+\s*(\d+(?:[.,]\d+)?)\s*/?\s*-\s*(\d+(?:[.,]\d+)?)",
        shape: Some(limit_deviation),
    },
    Rule {
        family: Family::Chamfer,
        precedence: 30,
        gate: Gate::Always,
        pattern: r"(\d+(?:[.,]\d+)?)\s*[xX×]\s*(\d+(?:[.,]\d+)?)\s*°",
        shape: Some(chamfer),
    },
    Rule {
        family: Family::FitCode,
        precedence: 40,
        gate: Gate::Always,
        pattern: r"(Ø)?(\d+(?:[.,]\d+)?) ?((?:CD|EF|FG|JS|ZA|ZB|ZC|cd|ef|fg|js|za|zb|zc|[A-HJKMNPSTUVXYZ]|[a-hjkmnprstuvxyz])(?:1[0-8]|[1-9]))(?:/((?:CD|EF|FG|JS|ZA|ZB|ZC|cd|ef|fg|js|za|zb|zc|[A-HJKMNPSTUVXYZ]|[a-hjkmnprstuvxyz])(?:1[0-8]|[1-9])))?\b",
        shape: Some(fit_code),
    },
    Rule {
        family: Family::Boxed,
        precedence: 50,
        gate: Gate::Always,
        pattern: r"[(\[]\s*(Ø)?(\d+(?:[.,]\d+)?)\s*[)\]]",
        shape: Some(boxed),
    },
    Rule {
        family: Family::DetachedTolerance,
        precedence: 55,
        gate: Gate::Always,
        pattern: r"±\s*\d+(?:[.,]\d+)?|[+-]\s*\d+(?:[.,]\d+)?(?:\s*/?\s*-\s*\d+(?:[.,]\d+)?)?",
        shape: None,
    },
    Rule {
        family: Family::HighPrecision,
        precedence: 60,
        gate: Gate::NoExplicitMatch,
        pattern: r"(Ø|R)?(\d+[.,]\d{3,4})\b",
        shape: Some(high_precision),
    },
    Rule {
        family: Family::LowPrecision,
        precedence: 70,
        gate: Gate::NoHighPrecisionMatch,
        pattern: r"(Ø|R)?(\d+(?:[.,]\d{1,2})?)\b",
        shape: Some(low_precision),
    },
];

static COMPILED: LazyLock<Vec<(&'static Rule, Regex)>> = LazyLock::new(|| {
    let mut rules: Vec<&'static Rule> = RULES.iter().collect();
    rules.sort_by_key(|rule| rule.precedence);
    rules
        .into_iter()
        .map(|rule| (rule, Regex::new(rule.pattern).expect("valid dimension rule regex")))
        .collect()
});

/// A dimension found on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub span: Range<usize>,
    pub family: Family,
    pub shape: Shape,
}

/// Run the rule table over `line`, skipping anything inside `claimed`.
///
/// Results are in left-to-right order.
pub fn classify(line: &str, claimed: &[Range<usize>]) -> Vec<Classified> {
    let mut working = mask(line, claimed);
    let mut found: Vec<Classified> = Vec::new();

    for (rule, regex) in COMPILED.iter() {
        let open = match rule.gate {
            Gate::Always => true,
            Gate::NoExplicitMatch => found.iter().all(|c| c.family >= Family::HighPrecision),
            Gate::NoHighPrecisionMatch => found.iter().all(|c| c.family != Family::HighPrecision),
        };
        if !open {
            continue;
        }

        let mut spans = Vec::new();
        for caps in regex.captures_iter(&working) {
            let Some(whole) = caps.get(0) else { continue };
            let diameter_led = working[whole.start()..].starts_with('Ø');
            if !diameter_led && !starts_token(&working, whole.start()) {
                continue;
            }
            let Some(shape_fn) = rule.shape else {
                spans.push(whole.range());
                continue;
            };
            if let Some(shape) = shape_fn(&caps) {
                spans.push(whole.range());
                found.push(Classified {
                    span: whole.range(),
                    family: rule.family,
                    shape,
                });
            }
        }
        if !spans.is_empty() {
            working = mask(&working, &spans);
        }
    }

    found.sort_by_key(|c| c.span.start);
    found
}

/// Overwrite `ranges` with [`CLAIMED`], keeping every byte offset valid.
pub(crate) fn mask(line: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(line.len());
    for (index, ch) in line.char_indices() {
        if ranges.iter().any(|r| r.contains(&index)) {
            out.extend(std::iter::repeat_n(CLAIMED, ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    out
}

// -- Shapes -------------------------------------------------------------------

fn nominal(caps: &Captures<'_>, diameter_group: usize, number_group: usize) -> Option<(bool, String)> {
    let number = clean_number(caps.get(number_group)?.as_str());
    let diameter = caps.get(diameter_group).is_some_and(|m| m.as_str() == "Ø");
    Some((diameter, number))
}

fn sized(diameter: bool, number: String) -> (Subtype, String) {
    if diameter {
        (Subtype::Diameter, format!("Ø{number}"))
    } else {
        (Subtype::Linear, number)
    }
}

fn tolerance_pair(caps: &Captures<'_>) -> Option<Shape> {
    let (diameter, number) = nominal(caps, 1, 2)?;
    let (subtype, value) = sized(diameter, number);
    Some(Shape {
        subtype,
        value,
        tolerance: format!("±{}", clean_number(caps.get(3)?.as_str())),
    })
}

fn limit_deviation(caps: &Captures<'_>) -> Option<Shape> {
    let (diameter, number) = nominal(caps, 1, 2)?;
    let (subtype, value) = sized(diameter, number);
    Some(Shape {
        subtype,
        value,
        tolerance: format!(
            "+{}/-{}",
            clean_number(caps.get(3)?.as_str()),
            clean_number(caps.get(4)?.as_str())
        ),
    })
}

fn chamfer(caps: &Captures<'_>) -> Option<Shape> {
    Some(Shape {
        subtype: Subtype::Chamfer,
        value: format!(
            "{}x{}°",
            clean_number(caps.get(1)?.as_str()),
            clean_number(caps.get(2)?.as_str())
        ),
        tolerance: "General".into(),
    })
}

fn fit_code(caps: &Captures<'_>) -> Option<Shape> {
    let (diameter, number) = nominal(caps, 1, 2)?;
    let value = if diameter { format!("Ø{number}") } else { number };
    let mut tolerance = caps.get(3)?.as_str().to_owned();
    if let Some(shaft) = caps.get(4) {
        tolerance.push('/');
        tolerance.push_str(shaft.as_str());
    }
    Some(Shape {
        subtype: Subtype::Fit,
        value,
        tolerance,
    })
}

fn boxed(caps: &Captures<'_>) -> Option<Shape> {
    let (diameter, number) = nominal(caps, 1, 2)?;
    let value = if diameter { format!("Ø{number}") } else { number };
    Some(Shape {
        subtype: Subtype::Basic,
        value,
        tolerance: "Basic".into(),
    })
}

fn prefixed(caps: &Captures<'_>) -> Option<(Subtype, String, bool)> {
    let number = clean_number(caps.get(2)?.as_str());
    let has_decimals = number.contains('.');
    let shaped = match caps.get(1).map(|m| m.as_str()) {
        Some("Ø") => (Subtype::Diameter, format!("Ø{number}"), true),
        Some("R") => (Subtype::Radius, format!("R{number}"), true),
        _ => (Subtype::Linear, number, has_decimals),
    };
    Some(shaped)
}

fn high_precision(caps: &Captures<'_>) -> Option<Shape> {
    let (subtype, value, _) = prefixed(caps)?;
    Some(Shape {
        subtype,
        value,
        tolerance: "Basic".into(),
    })
}

fn low_precision(caps: &Captures<'_>) -> Option<Shape> {
    // Bare integers are item counts, note numbers and the like.
    let (subtype, value, qualifies) = prefixed(caps)?;
    qualifies.then(|| Shape {
        subtype,
        value,
        tolerance: "General".into(),
    })
}
