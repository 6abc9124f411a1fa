// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text layout: the measure / render handshake
//!
//! Layout of one text node proceeds in explicit steps, each consuming the
//! previous state:
//!
//! 1.  [`TextLayout::begin_measure`] preprocesses the text and reports the
//!     graphemes the supplied engine cannot draw. The caller may now load
//!     extra fonts.
//! 2.  [`ResumeToken::finish_measure`] takes an [`EngineBuilder`] (which
//!     should cover the missing glyphs) and yields a [`MeasuredText`].
//! 3.  The box-layout engine calls [`MeasuredText::measure`] as often as it
//!     likes.
//! 4.  [`MeasuredText::render`] places the text in its final box.
//!
//! Nothing here blocks or performs I/O.

use crate::bidi::base_level;
use crate::flow::{resolve, FlowResult};
use crate::fonts::{Engine, EngineBuilder};
use crate::measure::{GraphemeImages, Measurer};
use crate::output::Output;
use crate::place::Placer;
use crate::words::{preprocess, Word};
use crate::{Environment, Vec2};
use thiserror::Error;
use unicode_bidi::Level;
use unicode_segmentation::UnicodeSegmentation;

/// Invalid configuration
#[derive(Error, Clone, Copy, Debug, PartialEq)]
pub enum LayoutError {
    #[error("invalid font size: {0}")]
    InvalidFontSize(f32),
    #[error("invalid letter spacing: {0}")]
    InvalidLetterSpacing(f32),
}

/// Graphemes which the measuring engine has no glyph for
///
/// Each grapheme is listed once, in order of first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MissingGlyphs(Vec<String>);

impl MissingGlyphs {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, grapheme: &str) -> bool {
        self.0.iter().any(|g| g == grapheme)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Final position and size assigned by box layout
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxLayout {
    /// Top-left corner of the content box
    pub origin: Vec2,
    /// Size of the content box
    pub size: Vec2,
}

/// A text node awaiting measurement
#[derive(Clone, Debug)]
pub struct TextLayout {
    text: String,
    env: Environment,
    images: GraphemeImages,
}

impl TextLayout {
    pub fn new(text: impl Into<String>, env: Environment) -> Self {
        TextLayout {
            text: text.into(),
            env,
            images: GraphemeImages::new(),
        }
    }

    /// Set graphemes to be drawn as inline images
    pub fn with_images(mut self, images: GraphemeImages) -> Self {
        self.images = images;
        self
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Preprocess and find graphemes `engine` cannot draw
    pub fn begin_measure<E: Engine>(self, engine: &E) -> (MissingGlyphs, ResumeToken) {
        let words = preprocess(&self.text, &self.env);
        let base = base_level(&self.text, self.env.direction);

        let mut missing = MissingGlyphs::default();
        for word in &words {
            for grapheme in word.text.graphemes(true) {
                if self.images.contains_key(grapheme)
                    || grapheme.chars().all(char::is_whitespace)
                    || missing.contains(grapheme)
                {
                    continue;
                }
                if !engine.has(grapheme) {
                    missing.0.push(grapheme.to_string());
                }
            }
        }
        if !missing.is_empty() {
            log::debug!("begin_measure: missing glyphs {:?}", missing.0);
        }

        let token = ResumeToken {
            words,
            env: self.env,
            images: self.images,
            base,
        };
        (missing, token)
    }
}

/// State suspended between [`TextLayout::begin_measure`] and
/// [`ResumeToken::finish_measure`]
#[derive(Clone, Debug)]
pub struct ResumeToken {
    words: Vec<Word>,
    env: Environment,
    images: GraphemeImages,
    base: Level,
}

impl ResumeToken {
    /// The preprocessed word sequence
    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Resume with an engine builder
    ///
    /// Fails only if the environment holds an unusable font size or letter
    /// spacing.
    pub fn finish_measure<B: EngineBuilder>(self, builder: B) -> Result<MeasuredText<B>, LayoutError> {
        let size = self.env.font_size;
        if !size.is_finite() || size <= 0.0 {
            return Err(LayoutError::InvalidFontSize(size));
        }
        if !self.env.letter_spacing.is_finite() {
            return Err(LayoutError::InvalidLetterSpacing(self.env.letter_spacing));
        }

        Ok(MeasuredText {
            builder,
            words: self.words,
            env: self.env,
            base: self.base,
            measurer: Measurer::new(self.images),
        })
    }
}

/// A text node ready for measurement and rendering
///
/// Every method re-runs the flow from the preprocessed words; only the width
/// cache persists between calls.
pub struct MeasuredText<B: EngineBuilder> {
    builder: B,
    words: Vec<Word>,
    env: Environment,
    base: Level,
    measurer: Measurer,
}

impl<B: EngineBuilder> MeasuredText<B> {
    #[inline]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// True if the paragraph direction is right-to-left
    #[inline]
    pub fn is_rtl(&self) -> bool {
        self.base.is_rtl()
    }

    /// Number of cached grapheme widths
    #[inline]
    pub fn cached_widths(&self) -> usize {
        self.measurer.cached()
    }

    /// Measure size given the available space
    ///
    /// Either dimension of `available` may be infinite. Repeated calls with
    /// the same input yield the same result.
    pub fn measure(&mut self, available: Vec2) -> Vec2 {
        self.flow(available).size(available.0)
    }

    /// Flow the text, resolving font size and wrap width
    pub fn flow(&mut self, available: Vec2) -> FlowResult {
        resolve(
            &self.builder,
            &self.words,
            &self.env,
            &mut self.measurer,
            self.base,
            available,
        )
        .flow
    }

    /// Place the text in its final box
    pub fn render(&mut self, layout: &BoxLayout) -> Output {
        let resolved = resolve(
            &self.builder,
            &self.words,
            &self.env,
            &mut self.measurer,
            self.base,
            layout.size,
        );
        Placer::new(&self.env, &resolved.engine, self.measurer.images()).place(
            &resolved.flow,
            layout.origin,
            layout.size.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::MonoEngine;
    use crate::LineHeight;

    fn mono(size: f32, lh: LineHeight) -> MonoEngine {
        MonoEngine::new(size).with_line_height(lh)
    }

    #[test]
    fn missing_glyphs_are_deduplicated() {
        let engine = MonoEngine::new(16.0).with_charset("abc".chars());
        let layout = TextLayout::new("abc xyx a", Environment::default());
        let (missing, token) = layout.begin_measure(&engine);
        assert_eq!(missing.into_vec(), ["x", "y"]);
        assert_eq!(token.words().len(), 3);
    }

    #[test]
    fn images_are_never_missing() {
        let engine = MonoEngine::new(16.0).with_charset("ab".chars());
        let mut images = GraphemeImages::new();
        images.insert("🦀".to_string(), "crab.svg".to_string());
        let layout = TextLayout::new("a🦀b", Environment::default()).with_images(images);
        let (missing, _) = layout.begin_measure(&engine);
        assert!(missing.is_empty());
    }

    #[test]
    fn invalid_configuration() {
        let env = Environment {
            font_size: 0.0,
            ..Default::default()
        };
        let (_, token) = TextLayout::new("a", env).begin_measure(&MonoEngine::new(16.0));
        assert_eq!(
            token.finish_measure(mono).err(),
            Some(LayoutError::InvalidFontSize(0.0))
        );

        let env = Environment {
            letter_spacing: f32::NAN,
            ..Default::default()
        };
        let (_, token) = TextLayout::new("a", env).begin_measure(&MonoEngine::new(16.0));
        assert!(matches!(
            token.finish_measure(mono),
            Err(LayoutError::InvalidLetterSpacing(_))
        ));
    }

    #[test]
    fn measure_then_render() {
        let env = Environment {
            font_size: 10.0,
            ..Default::default()
        };
        let (_, token) = TextLayout::new("Hello", env).begin_measure(&MonoEngine::new(10.0));
        let mut text = token.finish_measure(mono).unwrap();
        let size = text.measure(Vec2::INFINITY);
        assert_eq!(size, Vec2(25.0, 10.0));

        let output = text.render(&BoxLayout {
            origin: Vec2(10.0, 20.0),
            size,
        });
        assert_eq!(output.items.len(), 1);
        assert_eq!(output.color, "black");
    }
}
