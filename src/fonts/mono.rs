// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Fixed-advance engine

use super::{half_leading_baseline, needs_glyph, Engine};
use crate::{LineHeight, Vec2};
use std::collections::HashSet;
use std::fmt::Write;
use unicode_segmentation::UnicodeSegmentation;

/// An [`Engine`] giving every grapheme the same advance
///
/// Metrics are expressed in ems: by default each grapheme advances `0.5em`,
/// with an ascent of `0.75em` and descent of `0.25em`. Glyphs are drawn as
/// boxes. Useful for headless measurement and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct MonoEngine {
    font_size: f32,
    advance: f32,
    ascent: f32,
    descent: f32,
    line_height: Option<f32>,
    charset: Option<HashSet<char>>,
}

impl MonoEngine {
    pub fn new(font_size: f32) -> Self {
        MonoEngine {
            font_size,
            advance: 0.5,
            ascent: 0.75,
            descent: 0.25,
            line_height: None,
            charset: None,
        }
    }

    /// Set the advance of each grapheme, in ems
    pub fn with_advance(mut self, advance: f32) -> Self {
        self.advance = advance;
        self
    }

    /// Set ascent and descent, in ems
    pub fn with_extents(mut self, ascent: f32, descent: f32) -> Self {
        self.ascent = ascent;
        self.descent = descent;
        self
    }

    pub fn with_line_height(mut self, line_height: LineHeight) -> Self {
        self.line_height = line_height.resolve(self.font_size);
        self
    }

    /// Restrict the chars reported by [`Engine::has`]
    ///
    /// Measurement is unaffected.
    pub fn with_charset(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.charset = Some(chars.into_iter().collect());
        self
    }

    fn natural_height(&self) -> f32 {
        (self.ascent + self.descent) * self.font_size
    }
}

impl Engine for MonoEngine {
    #[inline]
    fn font_size(&self) -> f32 {
        self.font_size
    }

    fn measure(&self, grapheme: &str, letter_spacing: f32) -> f32 {
        if grapheme.chars().all(|c| c.is_control()) {
            return 0.0;
        }
        self.advance * self.font_size + letter_spacing
    }

    fn has(&self, grapheme: &str) -> bool {
        match self.charset {
            None => true,
            Some(ref set) => grapheme
                .chars()
                .filter(|c| needs_glyph(*c))
                .all(|c| set.contains(&c)),
        }
    }

    fn baseline(&self, _: &str) -> f32 {
        let ascent = self.ascent * self.font_size;
        let descent = self.descent * self.font_size;
        let height = self.line_height.unwrap_or(ascent + descent);
        half_leading_baseline(ascent, descent, height)
    }

    fn height(&self, _: &str) -> f32 {
        self.line_height.unwrap_or_else(|| self.natural_height())
    }

    fn path(&self, text: &str, origin: Vec2, letter_spacing: f32) -> String {
        let mut d = String::new();
        let mut caret = origin.0;
        let top = origin.1 - self.ascent * self.font_size;
        let h = self.natural_height();
        for grapheme in text.graphemes(true) {
            let w = self.measure(grapheme, letter_spacing);
            if grapheme.chars().any(needs_glyph) {
                let bw = w - letter_spacing;
                let _ = write!(d, "M{caret:.2} {top:.2}h{bw:.2}v{h:.2}h{:.2}Z", -bw);
            }
            caret += w;
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics() {
        let e = MonoEngine::new(10.0);
        assert_eq!(e.measure("a", 0.0), 5.0);
        assert_eq!(e.measure("a", 1.5), 6.5);
        assert_eq!(e.measure("\n", 1.5), 0.0);
        assert_eq!(e.height("abc"), 10.0);
        assert_eq!(e.baseline("abc"), 7.5);
    }

    #[test]
    fn half_leading() {
        let e = MonoEngine::new(10.0).with_line_height(LineHeight::Px(20.0));
        assert_eq!(e.height(""), 20.0);
        assert_eq!(e.baseline(""), 12.5);
    }

    #[test]
    fn charset() {
        let e = MonoEngine::new(10.0).with_charset("ab".chars());
        assert!(e.has("a"));
        assert!(e.has(" "));
        assert!(!e.has("c"));
    }

    #[test]
    fn box_path() {
        let e = MonoEngine::new(10.0);
        assert_eq!(
            e.path("a b", Vec2(0.0, 8.0), 0.0),
            "M0.00 0.50h5.00v10.00h-5.00ZM10.00 0.50h5.00v10.00h-5.00Z"
        );
    }
}
