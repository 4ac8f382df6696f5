// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ISO 286-2 limit deviations for common hole and shaft classes, nominal sizes
// up to 500 mm.

/// One nominal size range `(min_mm, max_mm]` and its deviations in µm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub min_mm: f64,
    pub max_mm: f64,
    pub lower_um: i32,
    pub upper_um: i32,
}

impl Bracket {
    pub fn contains(&self, nominal_mm: f64) -> bool {
        self.min_mm < nominal_mm && nominal_mm <= self.max_mm
    }
}

/// A tolerance class such as `H7` with its brackets in ascending order.
#[derive(Debug)]
pub struct ToleranceClass {
    pub code: &'static str,
    pub brackets: &'static [Bracket],
}

impl ToleranceClass {
    /// The unique bracket holding `nominal_mm`.
    pub fn bracket_for(&self, nominal_mm: f64) -> Option<&'static Bracket> {
        self.brackets.iter().find(|b| b.contains(nominal_mm))
    }
}

const fn b(min_mm: f64, max_mm: f64, lower_um: i32, upper_um: i32) -> Bracket {
    Bracket {
        min_mm,
        max_mm,
        lower_um,
        upper_um,
    }
}

static H6: [Bracket; 13] = [
    b(0.0, 3.0, 0, 6),
    b(3.0, 6.0, 0, 8),
    b(6.0, 10.0, 0, 9),
    b(10.0, 18.0, 0, 11),
    b(18.0, 30.0, 0, 13),
    b(30.0, 50.0, 0, 16),
    b(50.0, 80.0, 0, 19),
    b(80.0, 120.0, 0, 22),
    b(120.0, 180.0, 0, 25),
    b(180.0, 250.0, 0, 29),
    b(250.0, 315.0, 0, 32),
    b(315.0, 400.0, 0, 36),
    b(400.0, 500.0, 0, 40),
];

static H7: [Bracket; 13] = [
    b(0.0, 3.0, 0, 10),
    b(3.0, 6.0, 0, 12),
    b(6.0, 10.0, 0, 15),
    b(10.0, 18.0, 0, 18),
    b(18.0, 30.0, 0, 21),
    b(30.0, 50.0, 0, 25),
    b(50.0, 80.0, 0, 30),
    b(80.0, 120.0, 0, 35),
    b(120.0, 180.0, 0, 40),
    b(180.0, 250.0, 0, 46),
    b(250.0, 315.0, 0, 52),
    b(315.0, 400.0, 0, 57),
    b(400.0, 500.0, 0, 63),
];

static H8: [Bracket; 13] = [
    b(0.0, 3.0, 0, 14),
    b(3.0, 6.0, 0, 18),
    b(6.0, 10.0, 0, 22),
    b(10.0, 18.0, 0, 27),
    b(18.0, 30.0, 0, 33),
    b(30.0, 50.0, 0, 39),
    b(50.0, 80.0, 0, 46),
    b(80.0, 120.0, 0, 54),
    b(120.0, 180.0, 0, 63),
    b(180.0, 250.0, 0, 72),
    b(250.0, 315.0, 0, 81),
    b(315.0, 400.0, 0, 89),
    b(400.0, 500.0, 0, 97),
];

static SHAFT_H6: [Bracket; 13] = [
    b(0.0, 3.0, -6, 0),
    b(3.0, 6.0, -8, 0),
    b(6.0, 10.0, -9, 0),
    b(10.0, 18.0, -11, 0),
    b(18.0, 30.0, -13, 0),
    b(30.0, 50.0, -16, 0),
    b(50.0, 80.0, -19, 0),
    b(80.0, 120.0, -22, 0),
    b(120.0, 180.0, -25, 0),
    b(180.0, 250.0, -29, 0),
    b(250.0, 315.0, -32, 0),
    b(315.0, 400.0, -36, 0),
    b(400.0, 500.0, -40, 0),
];

static SHAFT_H7: [Bracket; 13] = [
    b(0.0, 3.0, -10, 0),
    b(3.0, 6.0, -12, 0),
    b(6.0, 10.0, -15, 0),
    b(10.0, 18.0, -18, 0),
    b(18.0, 30.0, -21, 0),
    b(30.0, 50.0, -25, 0),
    b(50.0, 80.0, -30, 0),
    b(80.0, 120.0, -35, 0),
    b(120.0, 180.0, -40, 0),
    b(180.0, 250.0, -46, 0),
    b(250.0, 315.0, -52, 0),
    b(315.0, 400.0, -57, 0),
    b(400.0, 500.0, -63, 0),
];

static G6: [Bracket; 9] = [
    b(0.0, 3.0, -8, -2),
    b(3.0, 6.0, -12, -4),
    b(6.0, 10.0, -14, -5),
    b(10.0, 18.0, -17, -6),
    b(18.0, 30.0, -20, -7),
    b(30.0, 50.0, -25, -9),
    b(50.0, 80.0, -29, -10),
    b(80.0, 120.0, -34, -12),
    b(120.0, 180.0, -39, -14),
];

static F7: [Bracket; 7] = [
    b(0.0, 3.0, -16, -6),
    b(3.0, 6.0, -22, -10),
    b(6.0, 10.0, -28, -13),
    b(10.0, 18.0, -34, -16),
    b(18.0, 30.0, -41, -20),
    b(30.0, 50.0, -50, -25),
    b(50.0, 80.0, -60, -30),
];

static K6: [Bracket; 13] = [
    b(0.0, 3.0, 0, 6),
    b(3.0, 6.0, 1, 9),
    b(6.0, 10.0, 1, 10),
    b(10.0, 18.0, 1, 12),
    b(18.0, 30.0, 2, 15),
    b(30.0, 50.0, 2, 18),
    b(50.0, 80.0, 2, 21),
    b(80.0, 120.0, 3, 25),
    b(120.0, 180.0, 3, 28),
    b(180.0, 250.0, 4, 33),
    b(250.0, 315.0, 4, 36),
    b(315.0, 400.0, 4, 40),
    b(400.0, 500.0, 5, 45),
];

/// Every class the enrichment step knows.
pub static CLASSES: &[ToleranceClass] = &[
    ToleranceClass { code: "H6", brackets: &H6 },
    ToleranceClass { code: "H7", brackets: &H7 },
    ToleranceClass { code: "H8", brackets: &H8 },
    ToleranceClass { code: "h6", brackets: &SHAFT_H6 },
    ToleranceClass { code: "h7", brackets: &SHAFT_H7 },
    ToleranceClass { code: "g6", brackets: &G6 },
    ToleranceClass { code: "f7", brackets: &F7 },
    ToleranceClass { code: "k6", brackets: &K6 },
];

/// Case-sensitive lookup: `H7` is a hole class, `h7` a shaft class.
pub fn lookup(code: &str) -> Option<&'static ToleranceClass> {
    CLASSES.iter().find(|class| class.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_are_contiguous_and_ordered() {
        for class in CLASSES {
            assert_eq!(class.brackets[0].min_mm, 0.0, "{}", class.code);
            for pair in class.brackets.windows(2) {
                assert_eq!(pair[0].max_mm, pair[1].min_mm, "{}", class.code);
            }
            for bracket in class.brackets {
                assert!(bracket.lower_um <= bracket.upper_um, "{}", class.code);
            }
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(lookup("H7").map(|c| c.code), Some("H7"));
        assert_eq!(lookup("h7").map(|c| c.code), Some("h7"));
        assert!(lookup("Z9").is_none());
    }

    #[test]
    fn upper_bound_is_inclusive() {
        let h7 = lookup("H7").unwrap();
        assert_eq!(h7.bracket_for(3.0).map(|b| b.max_mm), Some(3.0));
        assert_eq!(h7.bracket_for(6.0).map(|b| b.max_mm), Some(6.0));
        assert!(h7.bracket_for(0.0).is_none());
        assert!(h7.bracket_for(1000.0).is_none());
    }
}
