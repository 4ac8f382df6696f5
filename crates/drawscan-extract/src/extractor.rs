// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text pattern extractor: recognised lines in, annotation records out.

use drawscan_core::types::ExtractedRecord;
use tracing::{debug, instrument};

use crate::gdt;
use crate::normalize::normalize_line;
use crate::rules;

/// Classifies raw OCR lines into dimension and GD&T records.
///
/// Each line is normalised first, then GD&T detection claims its spans, then
/// the dimension rule table runs over what is left. Records come out in
/// line order and, within a line, left to right.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPatternExtractor;

impl TextPatternExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every line of one page.
    #[instrument(skip(self, lines))]
    pub fn extract_lines<I, S>(&self, lines: I, page: u32) -> Vec<ExtractedRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut records = Vec::new();
        let mut line_count = 0usize;
        for line in lines {
            line_count += 1;
            records.extend(self.extract_line(line.as_ref(), page));
        }
        debug!(line_count, records = records.len(), "Lines classified");
        records
    }

    /// Extract one line.
    pub fn extract_line(&self, raw: &str, page: u32) -> Vec<ExtractedRecord> {
        let line = normalize_line(raw);
        if line.is_empty() {
            return Vec::new();
        }

        let hits = gdt::detect(&line);
        let claimed: Vec<_> = hits.iter().map(|hit| hit.start..hit.end).collect();

        let mut positioned: Vec<(usize, ExtractedRecord)> = hits
            .into_iter()
            .map(|hit| {
                let record = ExtractedRecord::gdt(hit.subtype, hit.value, hit.datum, line.as_str(), page);
                (hit.start, record)
            })
            .collect();

        positioned.extend(rules::classify(&line, &claimed).into_iter().map(|dimension| {
            let shape = dimension.shape;
            let record = ExtractedRecord::dimension(
                shape.subtype,
                shape.value,
                shape.tolerance,
                line.as_str(),
                page,
            );
            (dimension.span.start, record)
        }));

        positioned.sort_by_key(|(start, _)| *start);
        positioned.into_iter().map(|(_, record)| record).collect()
    }
}

#[cfg(test)]
mod tests {
    use drawscan_core::types::{RecordKind, Subtype};

    use super::*;

    fn extract(line: &str) -> Vec<ExtractedRecord> {
        TextPatternExtractor::new().extract_line(line, 1)
    }

    #[test]
    fn plus_minus_pair() {
        let records = extract("50.0 +/- 0.1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Dimension);
        assert_eq!(records[0].value, "50.0");
        assert_eq!(records[0].tolerance, "±0.1");
        assert_eq!(records[0].original_text, "50.0 ± 0.1");
        assert_eq!(records[0].page, 1);
    }

    #[test]
    fn parenthesized_basic() {
        let records = extract("(12)");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subtype, Some(Subtype::Basic));
        assert_eq!(records[0].value, "12");
        assert_eq!(records[0].tolerance, "Basic");
    }

    #[test]
    fn fit_code_without_standalone_duplicate() {
        let records = extract("20 H7");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subtype, Some(Subtype::Fit));
        assert_eq!(records[0].value, "20");
        assert_eq!(records[0].tolerance, "H7");
    }

    #[test]
    fn position_symbol_alone() {
        let records = extract("⌖");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Gdt);
        assert_eq!(records[0].subtype, Some(Subtype::Position));
        assert_eq!(records[0].tolerance, "");
    }

    #[test]
    fn frame_numbers_are_not_reused_as_dimensions() {
        let records = extract("⌖ Ø0.1 (M) A B");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "Ø0.1 (M)");
        assert_eq!(
            records[0].datum,
            Some(vec!["A".to_owned(), "B".to_owned()])
        );
    }

    #[test]
    fn mixed_line_is_left_to_right() {
        let records = extract("Ø25 H7 ⊥ 0.05 A");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subtype, Some(Subtype::Fit));
        assert_eq!(records[0].value, "Ø25");
        assert_eq!(records[1].subtype, Some(Subtype::Perpendicularity));
        assert_eq!(records[1].value, "0.05");
    }

    #[test]
    fn misread_diameter_is_recovered() {
        let records = extract("O12.5");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subtype, Some(Subtype::Diameter));
        assert_eq!(records[0].value, "Ø12.5");
        assert_eq!(records[0].tolerance, "General");

        let records = extract("010");
        assert_eq!(records[0].value, "Ø10");
    }

    #[test]
    fn tolerance_next_to_a_basic_is_not_a_second_dimension() {
        let records = extract("(12.5) +/- 0.1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "12.5");
        assert_eq!(records[0].tolerance, "Basic");
    }

    #[test]
    fn title_block_dates_are_not_diameters() {
        assert!(extract("DATE 2024-01-05").is_empty());
        assert!(extract("10:05").is_empty());
    }

    #[test]
    fn prose_yields_nothing() {
        assert!(extract("ALL DIMENSIONS IN MM").is_empty());
        assert!(extract("").is_empty());
        assert!(extract("   ").is_empty());
    }

    #[test]
    fn lines_keep_order_and_page() {
        let records = TextPatternExtractor::new().extract_lines(["(12)", "50.0 ± 0.1"], 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, "12");
        assert_eq!(records[1].value, "50.0");
        assert!(records.iter().all(|r| r.page == 3));
    }

    #[test]
    fn records_serialise_with_wire_names() {
        let records = extract("20 H7");
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["type"], "Dimension");
        assert_eq!(json["subtype"], "Fit");
        assert!(json.get("calculated_limits").is_none());
    }
}
