// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR error normalisation for drawing annotation lines.

use std::sync::LazyLock;

use regex::Regex;

/// Malformed plus/minus ligatures as OCR reads them.
static PLUS_MINUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+\s?/\s?-|-\s?/\s?\+|\+\s?-|土|∓").expect("valid plus/minus regex")
});

/// A word-initial O, o or Q directly before a digit, optionally one space apart.
static LETTER_DIAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\p{L}\p{N}])[OoQ] ?(\d)").expect("valid letter diameter regex")
});

/// Diameter sign separated from its number.
static SPACED_DIAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Ø\s+(\d)").expect("valid spaced diameter regex"));

static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid number regex"));

const DIAMETER_LOOKALIKES: [char; 5] = ['ø', '⌀', '∅', 'Φ', 'φ'];

/// Canonicalise one recognised line.
///
/// * runs of whitespace collapse to one space,
/// * `+/-`, `+-`, `-/+` and `土` become `±`, and `−` becomes `-`,
/// * diameter look-alikes (`ø ⌀ ∅ Φ φ`) become `Ø`,
/// * a word-initial `O`/`o`/`Q` before a digit becomes `Ø`,
/// * a leading `0` followed by more digits, on a token without a decimal
///   part that starts a word, becomes `Ø` (`010` → `Ø10`, while `0.5`,
///   `010.5` and the parts of `2024-01-05` stay).
///
/// `Ø` is always glued to the number that follows it.
pub fn normalize_line(line: &str) -> String {
    let collapsed = line
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('−', "-");

    let signed = PLUS_MINUS.replace_all(&collapsed, "±");

    let diameters: String = signed
        .chars()
        .map(|c| if DIAMETER_LOOKALIKES.contains(&c) { 'Ø' } else { c })
        .collect();

    let lettered = LETTER_DIAMETER.replace_all(&diameters, "${1}Ø${2}");
    let zeroed = fold_leading_zero(&lettered);
    SPACED_DIAMETER.replace_all(&zeroed, "Ø${1}").into_owned()
}

/// Decimal comma to decimal point.
pub fn clean_number(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

fn fold_leading_zero(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 2);
    let mut last = 0;
    for token in NUMBER_TOKEN.find_iter(line) {
        let text = token.as_str();
        let integer_only = !text.contains(['.', ',']);
        let misread = integer_only && text.len() > 1 && text.starts_with('0');
        // Dates and times ("2024-01-05", "10:05") keep their zeros.
        let word_start = line[..token.start()]
            .chars()
            .next_back()
            .is_none_or(|prev| prev.is_whitespace() || prev == '(' || prev == '[');
        let joined = line[token.end()..]
            .chars()
            .next()
            .is_some_and(|next| matches!(next, ':' | '-' | '/'));
        if misread && word_start && !joined {
            out.push_str(&line[last..token.start()]);
            out.push('Ø');
            out.push_str(&text[1..]);
            last = token.end();
        }
    }
    out.push_str(&line[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_minus_ligatures_fold() {
        assert_eq!(normalize_line("50.0 +/- 0.1"), "50.0 ± 0.1");
        assert_eq!(normalize_line("50.0 +- 0.1"), "50.0 ± 0.1");
        assert_eq!(normalize_line("50.0 -/+ 0.1"), "50.0 ± 0.1");
        assert_eq!(normalize_line("50.0 土0.1"), "50.0 ±0.1");
    }

    #[test]
    fn limit_deviations_are_not_folded() {
        assert_eq!(normalize_line("20 +0.1 −0.2"), "20 +0.1 -0.2");
    }

    #[test]
    fn diameter_lookalikes_fold() {
        assert_eq!(normalize_line("⌀12"), "Ø12");
        assert_eq!(normalize_line("ø 12.5"), "Ø12.5");
        assert_eq!(normalize_line("Φ8"), "Ø8");
    }

    #[test]
    fn word_initial_o_before_digit_is_diameter() {
        assert_eq!(normalize_line("O10 H7"), "Ø10 H7");
        assert_eq!(normalize_line("o 6"), "Ø6");
        assert_eq!(normalize_line("Q25"), "Ø25");
        assert_eq!(normalize_line("TO 5"), "TO 5");
        assert_eq!(normalize_line("POSITION 0.05"), "POSITION 0.05");
    }

    #[test]
    fn leading_zero_integer_is_diameter() {
        assert_eq!(normalize_line("010"), "Ø10");
        assert_eq!(normalize_line("2X 012 THRU"), "2X Ø12 THRU");
        assert_eq!(normalize_line("0.5"), "0.5");
        assert_eq!(normalize_line("010.5"), "010.5");
        assert_eq!(normalize_line("100"), "100");
        assert_eq!(normalize_line("0"), "0");
    }

    #[test]
    fn dates_and_times_keep_leading_zeros() {
        assert_eq!(normalize_line("DATE 2024-01-05"), "DATE 2024-01-05");
        assert_eq!(normalize_line("10:05"), "10:05");
        assert_eq!(normalize_line("05/11/2026"), "05/11/2026");
        assert_eq!(normalize_line("(012)"), "(Ø12)");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize_line("  12.5 \t ±  0.1 "), "12.5 ± 0.1");
    }

    #[test]
    fn comma_decimal_is_cleaned() {
        assert_eq!(clean_number("12,5"), "12.5");
        assert_eq!(clean_number(" 3.25 "), "3.25");
    }
}
