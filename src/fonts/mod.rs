// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font metrics engines
//!
//! Layout never touches font files directly. Instead it queries an
//! [`Engine`]: an immutable handle bound to one font size and line height.
//! When a different size is needed (see [`crate::TextFit::Multiline`]) a new
//! engine is constructed through an [`EngineBuilder`]; engines are never
//! mutated in place.
//!
//! ### Units
//!
//! All engine values are in pixels, with the y-axis pointing down:
//!
//! -   *font size* is pixels per em
//! -   the *baseline* of a text is its distance from the top of the line box
//!     (ascent plus half the leading)
//! -   the *height* of a text is the height of its line box
//!
//! Font files use their own *font units*; see [`crate::DPU`].

use crate::conv::LineMetrics;
use crate::{LineHeight, Vec2};

mod face;
mod mono;

pub use face::{FaceEngine, SvgPathBuilder};
pub use mono::MonoEngine;

/// Positions of decoration lines
///
/// Positions are measured upwards from the baseline (font convention).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecorationMetrics {
    pub underline: LineMetrics,
    pub strikethrough: LineMetrics,
}

impl DecorationMetrics {
    /// Metrics for fonts without underline or strikeout tables
    pub fn fallback(font_size: f32) -> Self {
        let thickness = (font_size / 14.0).max(1.0);
        DecorationMetrics {
            underline: LineMetrics {
                position: -0.1 * font_size,
                thickness,
            },
            strikethrough: LineMetrics {
                position: 0.3 * font_size,
                thickness,
            },
        }
    }
}

/// A font-metrics provider for one font size and line height
///
/// Implementations must be deterministic: identical queries yield identical
/// results. No method may fail; unknown glyphs resolve to a fallback.
pub trait Engine {
    /// Font size in pixels per em
    fn font_size(&self) -> f32;

    /// Advance width of a single grapheme cluster
    ///
    /// `letter_spacing` is added once. Graphemes without a glyph resolve to
    /// the font's missing-glyph advance, or zero.
    fn measure(&self, grapheme: &str, letter_spacing: f32) -> f32;

    /// True if every char of `grapheme` which needs a glyph has one
    fn has(&self, grapheme: &str) -> bool;

    /// Distance from the top of the line box to the baseline of `text`
    fn baseline(&self, text: &str) -> f32;

    /// Height of the line box of `text`
    ///
    /// For empty `text` this is the nominal line height.
    fn height(&self, text: &str) -> f32;

    fn decoration_metrics(&self) -> DecorationMetrics {
        DecorationMetrics::fallback(self.font_size())
    }

    /// Generate SVG path data for `text` with its baseline origin at `origin`
    fn path(&self, text: &str, origin: Vec2, letter_spacing: f32) -> String;
}

impl<E: Engine + ?Sized> Engine for &E {
    #[inline]
    fn font_size(&self) -> f32 {
        (**self).font_size()
    }
    #[inline]
    fn measure(&self, grapheme: &str, letter_spacing: f32) -> f32 {
        (**self).measure(grapheme, letter_spacing)
    }
    #[inline]
    fn has(&self, grapheme: &str) -> bool {
        (**self).has(grapheme)
    }
    #[inline]
    fn baseline(&self, text: &str) -> f32 {
        (**self).baseline(text)
    }
    #[inline]
    fn height(&self, text: &str) -> f32 {
        (**self).height(text)
    }
    #[inline]
    fn decoration_metrics(&self) -> DecorationMetrics {
        (**self).decoration_metrics()
    }
    #[inline]
    fn path(&self, text: &str, origin: Vec2, letter_spacing: f32) -> String {
        (**self).path(text, origin, letter_spacing)
    }
}

/// Constructs an [`Engine`] for a given font size and line height
///
/// Implemented for closures `Fn(f32, LineHeight) -> E`.
pub trait EngineBuilder {
    type Engine: Engine;

    fn build(&self, font_size: f32, line_height: LineHeight) -> Self::Engine;
}

impl<E: Engine, F: Fn(f32, LineHeight) -> E> EngineBuilder for F {
    type Engine = E;

    #[inline]
    fn build(&self, font_size: f32, line_height: LineHeight) -> E {
        self(font_size, line_height)
    }
}

/// True if `c` is drawn with a glyph
///
/// Whitespace, controls, joiners and variation selectors never count as
/// missing.
pub(crate) fn needs_glyph(c: char) -> bool {
    !(c.is_whitespace()
        || c.is_control()
        || matches!(c, '\u{200B}'..='\u{200F}' | '\u{FE00}'..='\u{FE0F}' | '\u{E0100}'..='\u{E01EF}'))
}

/// Split line leading evenly above and below the text
#[inline]
pub(crate) fn half_leading_baseline(ascent: f32, descent: f32, height: f32) -> f32 {
    ascent + 0.5 * (height - ascent - descent)
}
