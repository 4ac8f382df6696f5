// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text spans: assembling OCR word boxes into scored lines.
//
// Kept free of any OCR engine types so line assembly and confidence scoring
// can be tested without model files.

use serde::{Deserialize, Serialize};

/// One recognised line of text with a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub confidence: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Pixel probability the ocrs word detector binarises at. Word boxes never
/// hold text fainter than this, so it is also the lowest useful
/// [`OcrTuning::text_threshold`].
pub const DETECTOR_TEXT_THRESHOLD: f32 = 0.2;

/// Local OCR tuning for sparse, symbol-heavy drawing text.
///
/// Drawing annotations are short and isolated, so the detector floors sit
/// below the engine's document-text defaults, and fragments closer than
/// `merge_width_ratio` x the glyph height are joined without a space
/// (`Ø` `10` becomes `Ø10`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrTuning {
    /// Per-pixel text probability above which a pixel counts as text when
    /// scoring words. Values below [`DETECTOR_TEXT_THRESHOLD`] act as that
    /// floor.
    pub text_threshold: f32,
    /// Words scoring at or below this are dropped before line assembly.
    pub min_word_score: f32,
    /// Horizontal gap, relative to glyph height, under which words merge.
    pub merge_width_ratio: f32,
    /// Lines scoring at or below this never reach pattern extraction.
    pub min_line_confidence: f32,
}

impl Default for OcrTuning {
    fn default() -> Self {
        Self {
            text_threshold: DETECTOR_TEXT_THRESHOLD,
            min_word_score: 0.2,
            merge_width_ratio: 0.25,
            min_line_confidence: 0.3,
        }
    }
}

impl OcrTuning {
    /// The threshold word scoring actually uses.
    pub fn scoring_threshold(&self) -> f32 {
        self.text_threshold.max(DETECTOR_TEXT_THRESHOLD)
    }
}

/// A recognised word and its axis-aligned box in image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl WordBox {
    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

/// Row-major per-pixel text probability produced by the detection model.
#[derive(Debug, Clone)]
pub struct TextProbabilityMap {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl TextProbabilityMap {
    /// Returns `None` when `data` does not hold exactly `width * height` values.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Mean probability of the text pixels inside a box.
    ///
    /// Only pixels above `threshold` contribute; background between strokes
    /// would otherwise drag every thin glyph towards zero. Boxes outside the
    /// map, or holding no text pixels, score 0.
    pub fn region_confidence(&self, word: &WordBox, threshold: f32) -> f32 {
        let clamp_x = |v: f32| (v.max(0.0) as usize).min(self.width);
        let clamp_y = |v: f32| (v.max(0.0) as usize).min(self.height);
        let (x0, x1) = (clamp_x(word.left.floor()), clamp_x(word.right.ceil()));
        let (y0, y1) = (clamp_y(word.top.floor()), clamp_y(word.bottom.ceil()));

        let mut sum = 0.0f32;
        let mut count = 0usize;
        for y in y0..y1 {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            for &p in &row[x0..x1] {
                if p > threshold {
                    sum += p;
                    count += 1;
                }
            }
        }
        if count == 0 { 0.0 } else { sum / count as f32 }
    }
}

/// Join the words of one line left to right.
///
/// Words whose horizontal gap is under `merge_width_ratio` times the taller
/// glyph height are concatenated directly; wider gaps get one space.
pub fn assemble_line(words: &[WordBox], merge_width_ratio: f32) -> String {
    let mut ordered: Vec<&WordBox> = words.iter().filter(|w| !w.text.trim().is_empty()).collect();
    ordered.sort_by(|a, b| a.left.total_cmp(&b.left));

    let mut text = String::new();
    let mut previous: Option<&WordBox> = None;
    for word in ordered {
        if let Some(prev) = previous {
            let gap = word.left - prev.right;
            let glyph = prev.height().max(word.height());
            if gap >= merge_width_ratio * glyph {
                text.push(' ');
            }
        }
        text.push_str(word.text.trim());
        previous = Some(word);
    }
    text
}

/// Score and assemble one detected line.
///
/// Word confidences come from the probability map; weak words are dropped,
/// and the line confidence is the width-weighted mean of the survivors.
/// Returns `None` when no word survives.
pub fn score_line(words: &[WordBox], map: &TextProbabilityMap, tuning: &OcrTuning) -> Option<TextSpan> {
    let mut kept = Vec::with_capacity(words.len());
    let mut weighted = 0.0f32;
    let mut total_width = 0.0f32;

    for word in words {
        let score = map.region_confidence(word, tuning.scoring_threshold());
        if score <= tuning.min_word_score {
            continue;
        }
        let weight = word.width().max(1.0);
        weighted += score * weight;
        total_width += weight;
        kept.push(word.clone());
    }

    if kept.is_empty() {
        return None;
    }
    let text = assemble_line(&kept, tuning.merge_width_ratio);
    if text.is_empty() {
        return None;
    }
    Some(TextSpan::new(text, weighted / total_width))
}

/// Drop spans at or below `min_confidence`.
pub fn retain_confident(spans: Vec<TextSpan>, min_confidence: f32) -> Vec<TextSpan> {
    spans
        .into_iter()
        .filter(|span| span.confidence > min_confidence)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, left: f32, right: f32) -> WordBox {
        WordBox {
            text: text.into(),
            left,
            top: 0.0,
            right,
            bottom: 20.0,
        }
    }

    fn map_with(width: usize, height: usize, value: f32) -> TextProbabilityMap {
        TextProbabilityMap::new(width, height, vec![value; width * height]).unwrap()
    }

    #[test]
    fn close_fragments_merge_without_space() {
        let words = [word("10", 24.0, 50.0), word("Ø", 0.0, 20.0)];
        assert_eq!(assemble_line(&words, 0.25), "Ø10");
    }

    #[test]
    fn distant_words_keep_a_space() {
        let words = [word("Perpendicularity", 0.0, 200.0), word("0.05", 220.0, 260.0)];
        assert_eq!(assemble_line(&words, 0.25), "Perpendicularity 0.05");
    }

    #[test]
    fn probability_map_rejects_bad_length() {
        assert!(TextProbabilityMap::new(4, 4, vec![0.0; 15]).is_none());
    }

    #[test]
    fn region_confidence_ignores_background() {
        let mut data = vec![0.0; 10 * 10];
        data[5 * 10 + 5] = 0.9;
        data[5 * 10 + 6] = 0.7;
        let map = TextProbabilityMap::new(10, 10, data).unwrap();
        let score = map.region_confidence(&word("x", 0.0, 10.0), 0.2);
        assert!((score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn region_outside_map_scores_zero() {
        let map = map_with(10, 10, 0.9);
        let far = WordBox {
            text: "x".into(),
            left: 50.0,
            top: 50.0,
            right: 60.0,
            bottom: 60.0,
        };
        assert_eq!(map.region_confidence(&far, 0.2), 0.0);
    }

    #[test]
    fn weak_lines_are_dropped() {
        let map = map_with(300, 30, 0.1);
        let words = [word("0.05", 0.0, 40.0)];
        assert!(score_line(&words, &map, &OcrTuning::default()).is_none());
    }

    #[test]
    fn text_threshold_below_detector_floor_is_clamped() {
        let tuning = OcrTuning {
            text_threshold: 0.05,
            min_word_score: 0.05,
            ..OcrTuning::default()
        };
        assert_eq!(tuning.scoring_threshold(), DETECTOR_TEXT_THRESHOLD);

        let map = map_with(300, 30, 0.1);
        let words = [word("0.05", 0.0, 40.0)];
        assert!(score_line(&words, &map, &tuning).is_none());
    }

    #[test]
    fn strong_line_is_scored() {
        let map = map_with(300, 30, 0.8);
        let words = [word("Ø", 0.0, 20.0), word("10", 22.0, 50.0)];
        let span = score_line(&words, &map, &OcrTuning::default()).unwrap();
        assert_eq!(span.text, "Ø10");
        assert!((span.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn retain_confident_is_strict() {
        let spans = vec![
            TextSpan::new("a", 0.3),
            TextSpan::new("b", 0.31),
            TextSpan::new("c", 0.05),
        ];
        let kept = retain_confident(spans, 0.3);
        assert_eq!(kept, vec![TextSpan::new("b", 0.31)]);
    }
}
