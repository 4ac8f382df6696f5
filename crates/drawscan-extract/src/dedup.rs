// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page deduplication of extracted records.

use std::collections::HashSet;

use drawscan_core::types::{ExtractedRecord, RecordKind, Subtype};

/// Identity of a record for duplicate detection.
type Signature = (u32, RecordKind, String, String, Option<Subtype>);

fn signature(record: &ExtractedRecord) -> Signature {
    (
        record.page,
        record.kind,
        record.value.clone(),
        record.tolerance.clone(),
        record.subtype.clone(),
    )
}

/// Drop records repeating an earlier `(kind, value, tolerance, subtype)` on
/// the same page. The first occurrence and overall order are kept; the same
/// annotation on another page survives.
pub fn deduplicate(records: Vec<ExtractedRecord>) -> Vec<ExtractedRecord> {
    let mut seen: HashSet<Signature> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(signature(record)))
        .collect()
}
