// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Turning recognised text into dimension and GD&T records.
//
// Classification of OCR lines, per-page deduplication, and ISO 286 fit
// enrichment for records from any provider.

pub mod dedup;
pub mod enrich;
pub mod extractor;
pub mod gdt;
pub mod normalize;
pub mod rules;
pub mod tolerance_table;

pub use dedup::deduplicate;
pub use enrich::{calculate_limits, enrich_records};
pub use extractor::TextPatternExtractor;
