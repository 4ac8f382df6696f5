// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ISO fit enrichment: attach calculated limit deviations to fit-coded sizes.

use drawscan_core::error::{Result, ScanError};
use drawscan_core::types::{ExtractedRecord, RecordKind, first_number};
use tracing::debug;

use crate::tolerance_table;

/// Longest tolerance string treated as a fit code ("H7", "g6", "js16").
const MAX_CODE_LEN: usize = 5;

/// Deviations for `code` at `nominal_mm`, formatted `"+0.012 / +0.000"`
/// (upper then lower, in millimetres).
pub fn calculate_limits(nominal_mm: f64, code: &str) -> Result<String> {
    let class = tolerance_table::lookup(code)
        .ok_or_else(|| ScanError::Enrichment(format!("unknown tolerance class {code}")))?;
    let bracket = class.bracket_for(nominal_mm).ok_or_else(|| {
        ScanError::Enrichment(format!("{nominal_mm} mm is outside the {code} table"))
    })?;
    let upper = f64::from(bracket.upper_um) / 1000.0;
    let lower = f64::from(bracket.lower_um) / 1000.0;
    Ok(format!("{upper:+.3} / {lower:+.3}"))
}

/// Whether a record is a candidate for enrichment at all.
fn is_candidate(record: &ExtractedRecord) -> bool {
    record.kind == RecordKind::Dimension
        && record.subtype.as_ref().is_some_and(|s| s.is_enrichable())
        && record.tolerance.chars().count() <= MAX_CODE_LEN
        && record
            .tolerance
            .chars()
            .next()
            .is_some_and(char::is_alphabetic)
}

/// Nominal size of a value that is only a number once diameter glyphs and
/// whitespace are removed. `"12.5 TYP"` has no nominal.
fn nominal(value: &str) -> Result<f64> {
    let bare: String = value
        .chars()
        .filter(|c| !matches!(c, 'Ø' | 'ø' | '⌀' | '∅') && !c.is_whitespace())
        .collect();
    let plain = bare.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',');
    first_number(&bare)
        .filter(|_| plain)
        .ok_or_else(|| ScanError::Enrichment(format!("nominal {value:?} is not a number")))
}

/// Fill `calculated_limits` on one record. Anything that cannot be enriched
/// is left untouched.
pub fn enrich_record(record: &mut ExtractedRecord) {
    if !is_candidate(record) {
        return;
    }
    let limits = nominal(&record.value).and_then(|v| calculate_limits(v, &record.tolerance));
    match limits {
        Ok(limits) => record.calculated_limits = Some(limits),
        Err(e) => debug!(value = %record.value, tolerance = %record.tolerance, "{e}"),
    }
}

/// Enrich every record in place and hand the list back.
pub fn enrich_records(mut records: Vec<ExtractedRecord>) -> Vec<ExtractedRecord> {
    records.iter_mut().for_each(enrich_record);
    records
}
