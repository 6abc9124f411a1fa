// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Run shaping
//!
//! Turns one line, already analyzed by [`crate::bidi`], into a sequence of
//! visual segments in left-to-right order, each with its advance from the
//! line start.
//!
//! This module *does not* perform line-breaking, kerning or ligature
//! substitution: chars are the atomic unit of reordering, and each segment is
//! measured as a sequence of grapheme clusters.

use crate::bidi::{run_owners, BidiLine};
use crate::fonts::Engine;
use crate::measure::Measurer;
use unicode_bidi::Level;
use unicode_segmentation::UnicodeSegmentation;

/// A visual segment of one line
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedSegment {
    /// Text in visual order
    pub text: String,
    /// Offset of the left edge from the line start
    pub x: f32,
    pub width: f32,
    /// Baseline of this segment's own line box
    pub baseline: f32,
    /// Height of this segment's own line box
    pub height: f32,
    pub level: Level,
    /// Segment is a single image grapheme
    pub is_image: bool,
}

/// A line of segments in visual order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedLine {
    pub segments: Vec<ShapedSegment>,
    /// Sum of segment widths
    pub width: f32,
    /// Max distance from line top to any segment baseline
    pub ascent: f32,
    /// Max extent of any segment below its baseline
    pub descent: f32,
}

impl ShapedLine {
    #[inline]
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Shapes lines against one engine
pub struct Shaper<'a, E: Engine> {
    engine: &'a E,
    measurer: &'a mut Measurer,
    letter_spacing: f32,
    split_words: bool,
}

impl<'a, E: Engine> Shaper<'a, E> {
    pub fn new(engine: &'a E, measurer: &'a mut Measurer, letter_spacing: f32) -> Self {
        Shaper {
            engine,
            measurer,
            letter_spacing,
            split_words: false,
        }
    }

    /// Also split segments at word boundaries (used for justification)
    pub fn split_words(mut self, split: bool) -> Self {
        self.split_words = split;
        self
    }

    /// Shape `line`, given its bidi analysis
    pub fn shape(&mut self, line: &str, bidi: &BidiLine) -> ShapedLine {
        let mut out = ShapedLine::default();
        if bidi.is_empty() {
            out.ascent = self.engine.baseline("");
            out.descent = self.engine.height("") - out.ascent;
            return out;
        }

        let chars: Vec<char> = line.chars().collect();
        let owners = run_owners(bidi);

        // Walk the visual order, closing a segment each time the owning run
        // changes.
        let mut current = None;
        let mut text = String::new();
        for &index in &bidi.order {
            let run = owners[index];
            if current != Some(run) {
                if let Some(prev) = current {
                    let level = bidi.runs[prev as usize].level;
                    self.close(&mut out, std::mem::take(&mut text), level);
                }
                current = Some(run);
            }
            let mut c = chars[index];
            if bidi.levels[index].is_rtl() {
                // Unicode TR#9 rule L4
                c = unicode_bidi_mirroring::get_mirrored(c).unwrap_or(c);
            }
            text.push(c);
        }
        if let Some(prev) = current {
            let level = bidi.runs[prev as usize].level;
            self.close(&mut out, text, level);
        }

        if out.segments.is_empty() {
            out.ascent = self.engine.baseline("");
            out.descent = self.engine.height("") - out.ascent;
        }
        out
    }

    /// Measure and append the pieces of one visual run
    fn close(&mut self, line: &mut ShapedLine, text: String, level: Level) {
        for (piece, is_image) in pieces(&text, self.measurer, self.split_words) {
            // Re-measured: reordering may regroup graphemes
            let width = self
                .measurer
                .measure_text(self.engine, piece, self.letter_spacing);
            let metrics_text = if is_image { "" } else { piece };
            let baseline = self.engine.baseline(metrics_text);
            let height = self.engine.height(metrics_text);

            line.ascent = line.ascent.max(baseline);
            line.descent = line.descent.max(height - baseline);
            line.segments.push(ShapedSegment {
                text: piece.to_string(),
                x: line.width,
                width,
                baseline,
                height,
                level,
                is_image,
            });
            line.width += width;
        }
    }
}

/// Split a visual run into image graphemes and text pieces
fn pieces<'t>(text: &'t str, measurer: &Measurer, split_words: bool) -> Vec<(&'t str, bool)> {
    let mut out = Vec::new();
    let push_text = |out: &mut Vec<(&'t str, bool)>, chunk: &'t str| {
        if split_words {
            out.extend(chunk.split_word_bounds().map(|w| (w, false)));
        } else {
            out.push((chunk, false));
        }
    };

    let mut start = 0;
    for (i, g) in text.grapheme_indices(true) {
        if measurer.is_image(g) {
            if start < i {
                push_text(&mut out, &text[start..i]);
            }
            out.push((g, true));
            start = i + g.len();
        }
    }
    if start < text.len() {
        push_text(&mut out, &text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidi::analyze;
    use crate::fonts::MonoEngine;
    use crate::GraphemeImages;
    use unicode_bidi::LTR_LEVEL;

    fn shape(text: &str, measurer: &mut Measurer, split: bool) -> ShapedLine {
        let engine = MonoEngine::new(10.0);
        let bidi = analyze(text, LTR_LEVEL);
        Shaper::new(&engine, measurer, 0.0)
            .split_words(split)
            .shape(text, &bidi)
    }

    #[test]
    fn empty_line() {
        let line = shape("", &mut Measurer::default(), false);
        assert!(line.segments.is_empty());
        assert_eq!(line.width, 0.0);
        assert_eq!(line.height(), 10.0);
    }

    #[test]
    fn single_ltr_run() {
        let line = shape("The quick", &mut Measurer::default(), false);
        assert_eq!(line.segments.len(), 1);
        assert_eq!(line.segments[0].text, "The quick");
        assert_eq!(line.width, 45.0);
        assert_eq!(line.ascent, 7.5);
    }

    #[test]
    fn mixed_direction() {
        let line = shape("abcאבג", &mut Measurer::default(), false);
        assert_eq!(line.segments.len(), 2);
        let (ltr, rtl) = (&line.segments[0], &line.segments[1]);
        assert_eq!(ltr.text, "abc");
        assert_eq!(rtl.text, "גבא");
        assert!(rtl.level.is_rtl());
        assert_eq!(ltr.width, 15.0);
        assert_eq!(rtl.width, 15.0);
        assert_eq!(rtl.x, 15.0);
        assert_eq!(line.width, 30.0);
    }

    #[test]
    fn rtl_brackets_are_mirrored() {
        let engine = MonoEngine::new(10.0);
        let bidi = analyze("א(ב)", unicode_bidi::RTL_LEVEL);
        let mut measurer = Measurer::default();
        let line = Shaper::new(&engine, &mut measurer, 0.0).shape("א(ב)", &bidi);
        assert_eq!(line.segments.len(), 1);
        // visual order reverses, mirroring restores bracket shapes
        assert_eq!(line.segments[0].text, "(ב)א");
    }

    #[test]
    fn images_are_isolated() {
        let mut images = GraphemeImages::new();
        images.insert("🦀".to_string(), "crab.svg".to_string());
        let mut measurer = Measurer::new(images);
        let line = shape("ab🦀cd", &mut measurer, false);
        let texts: Vec<_> = line.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["ab", "🦀", "cd"]);
        assert!(line.segments[1].is_image);
        assert_eq!(line.segments[1].width, 10.0);
        assert_eq!(line.segments[2].x, 20.0);
        assert_eq!(line.width, 30.0);
    }

    #[test]
    fn word_split() {
        let line = shape("ab cd", &mut Measurer::default(), true);
        let texts: Vec<_> = line.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["ab", " ", "cd"]);
        assert_eq!(line.segments[2].x, 15.0);
    }
}
