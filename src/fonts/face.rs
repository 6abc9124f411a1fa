// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Engine over parsed font faces

use super::{half_leading_baseline, needs_glyph, DecorationMetrics, Engine};
use crate::conv::{LineMetrics, DPU};
use crate::{LineHeight, Vec2};
use smallvec::SmallVec;
use std::fmt::Write;
use ttf_parser::{Face, GlyphId, OutlineBuilder};
use unicode_segmentation::UnicodeSegmentation;

/// A face at a fixed scale
#[derive(Copy, Clone, Debug)]
struct ScaledFace<'a>(&'a Face<'a>, DPU);

impl<'a> ScaledFace<'a> {
    fn new(face: &'a Face<'a>, font_size: f32) -> Self {
        ScaledFace(face, DPU::new(font_size, face.units_per_em()))
    }

    /// Pixels per font unit
    #[inline]
    fn scale(&self) -> f32 {
        self.1 .0
    }

    /// Horizontal advancement after this glyph, without shaping or kerning
    #[inline]
    fn h_advance(&self, id: GlyphId) -> f32 {
        self.1.px(self.0.glyph_hor_advance(id).unwrap_or(0))
    }

    #[inline]
    fn ascent(&self) -> f32 {
        self.1.px(self.0.ascender())
    }

    /// Descent below the baseline, as a positive value
    #[inline]
    fn descent(&self) -> f32 {
        -self.1.px(self.0.descender())
    }

    #[inline]
    fn line_gap(&self) -> f32 {
        self.1.px(self.0.line_gap())
    }

    /// Declared underline, unless the font leaves it zero-sized
    #[inline]
    fn underline_metrics(&self) -> Option<LineMetrics> {
        self.0
            .underline_metrics()
            .filter(|m| m.thickness > 0)
            .map(|m| self.1.decoration(m))
    }

    #[inline]
    fn strikethrough_metrics(&self) -> Option<LineMetrics> {
        self.0
            .strikeout_metrics()
            .filter(|m| m.thickness > 0)
            .map(|m| self.1.decoration(m))
    }
}

/// An [`Engine`] backed by one or more `ttf_parser` faces
///
/// The first face is the primary face; further faces are fallbacks, tried in
/// order for each char without a glyph in the primary face. Chars found in no
/// face use the primary face's missing glyph (`GlyphId(0)`).
#[derive(Clone, Debug)]
pub struct FaceEngine<'a> {
    faces: SmallVec<[&'a Face<'a>; 2]>,
    font_size: f32,
    line_height: Option<f32>,
}

impl<'a> FaceEngine<'a> {
    /// Construct with a primary face
    pub fn new(face: &'a Face<'a>, font_size: f32) -> Self {
        let mut faces = SmallVec::new();
        faces.push(face);
        FaceEngine {
            faces,
            font_size,
            line_height: None,
        }
    }

    /// Append a fallback face
    pub fn with_fallback(mut self, face: &'a Face<'a>) -> Self {
        self.faces.push(face);
        self
    }

    pub fn with_line_height(mut self, line_height: LineHeight) -> Self {
        self.line_height = line_height.resolve(self.font_size);
        self
    }

    fn scaled(&self, face: &'a Face<'a>) -> ScaledFace<'a> {
        ScaledFace::new(face, self.font_size)
    }

    /// Index of the face drawing `c`, and its glyph
    fn face_for_char(&self, c: char) -> (usize, GlyphId) {
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(id) = face.glyph_index(c) {
                return (i, id);
            }
        }
        // GlyphId 0 is the 'missing glyph' of the primary face
        (0, GlyphId(0))
    }

    /// Max ascent and descent over faces used by `text`
    fn vertical_metrics(&self, text: &str) -> (f32, f32, f32) {
        let mut used = SmallVec::<[usize; 2]>::new();
        for c in text.chars().filter(|c| needs_glyph(*c)) {
            let (i, _) = self.face_for_char(c);
            if !used.contains(&i) {
                used.push(i);
            }
        }
        if used.is_empty() {
            used.push(0);
        }

        let (mut ascent, mut descent, mut gap) = (0f32, 0f32, 0f32);
        for i in used {
            let sf = self.scaled(self.faces[i]);
            ascent = ascent.max(sf.ascent());
            descent = descent.max(sf.descent());
            gap = gap.max(sf.line_gap());
        }
        (ascent, descent, gap)
    }
}

impl<'a> Engine for FaceEngine<'a> {
    #[inline]
    fn font_size(&self) -> f32 {
        self.font_size
    }

    fn measure(&self, grapheme: &str, letter_spacing: f32) -> f32 {
        let advance: f32 = grapheme
            .chars()
            .filter(|c| !c.is_control())
            .map(|c| {
                let (i, id) = self.face_for_char(c);
                self.scaled(self.faces[i]).h_advance(id)
            })
            .sum();
        advance + letter_spacing
    }

    fn has(&self, grapheme: &str) -> bool {
        grapheme
            .chars()
            .filter(|c| needs_glyph(*c))
            .all(|c| self.faces.iter().any(|face| face.glyph_index(c).is_some()))
    }

    fn baseline(&self, text: &str) -> f32 {
        let (ascent, descent, gap) = self.vertical_metrics(text);
        let height = self.line_height.unwrap_or(ascent + descent + gap);
        half_leading_baseline(ascent, descent, height)
    }

    fn height(&self, text: &str) -> f32 {
        if let Some(height) = self.line_height {
            return height;
        }
        let (ascent, descent, gap) = self.vertical_metrics(text);
        ascent + descent + gap
    }

    fn decoration_metrics(&self) -> DecorationMetrics {
        let sf = self.scaled(self.faces[0]);
        let fallback = DecorationMetrics::fallback(self.font_size);
        DecorationMetrics {
            underline: sf.underline_metrics().unwrap_or(fallback.underline),
            strikethrough: sf
                .strikethrough_metrics()
                .unwrap_or(fallback.strikethrough),
        }
    }

    fn path(&self, text: &str, origin: Vec2, letter_spacing: f32) -> String {
        let mut d = String::new();
        let mut caret = origin.0;
        for grapheme in text.graphemes(true) {
            for c in grapheme.chars().filter(|c| !c.is_control()) {
                let (i, id) = self.face_for_char(c);
                let sf = self.scaled(self.faces[i]);
                let mut builder = SvgPathBuilder::new(&mut d, Vec2(caret, origin.1), sf.scale());
                let _ = sf.0.outline_glyph(id, &mut builder);
                caret += sf.h_advance(id);
            }
            caret += letter_spacing;
        }
        d
    }
}

/// Writes glyph outlines as SVG path data
///
/// Font units are scaled by `scale` and flipped so that y points down, with
/// the glyph origin placed at `origin`.
pub struct SvgPathBuilder<'a> {
    d: &'a mut String,
    origin: Vec2,
    scale: f32,
}

impl<'a> SvgPathBuilder<'a> {
    pub fn new(d: &'a mut String, origin: Vec2, scale: f32) -> Self {
        SvgPathBuilder { d, origin, scale }
    }

    #[inline]
    fn x(&self, x: f32) -> f32 {
        self.origin.0 + x * self.scale
    }

    #[inline]
    fn y(&self, y: f32) -> f32 {
        self.origin.1 - y * self.scale
    }
}

// Writing to a String cannot fail
impl<'a> OutlineBuilder for SvgPathBuilder<'a> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.x(x), self.y(y));
        let _ = write!(self.d, "M{x:.2} {y:.2}");
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.x(x), self.y(y));
        let _ = write!(self.d, "L{x:.2} {y:.2}");
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1, x, y) = (self.x(x1), self.y(y1), self.x(x), self.y(y));
        let _ = write!(self.d, "Q{x1:.2} {y1:.2} {x:.2} {y:.2}");
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = (self.x(x1), self.y(y1));
        let (x2, y2) = (self.x(x2), self.y(y2));
        let (x, y) = (self.x(x), self.y(y));
        let _ = write!(self.d, "C{x1:.2} {y1:.2} {x2:.2} {y2:.2} {x:.2} {y:.2}");
    }

    fn close(&mut self) {
        self.d.push('Z');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: &[u8] = include_bytes!("../../tests/data/DejaVuSansMono.ttf");
    // Only maps private-use chars, from U+F0100
    const FALLBACK: &[u8] = include_bytes!("../../tests/data/colr_1.ttf");
    const PUA: char = '\u{F0100}';

    fn faces() -> (Face<'static>, Face<'static>) {
        let primary = Face::parse(PRIMARY, 0).unwrap();
        let fallback = Face::parse(FALLBACK, 0).unwrap();
        assert!(primary.glyph_index(PUA).is_none());
        assert!(fallback.glyph_index('a').is_none());
        (primary, fallback)
    }

    fn dpu(face: &Face) -> DPU {
        DPU::new(20.0, face.units_per_em())
    }

    fn advance(face: &Face, c: char) -> f32 {
        let id = face.glyph_index(c).unwrap_or(GlyphId(0));
        dpu(face).px(face.glyph_hor_advance(id).unwrap())
    }

    #[test]
    fn fallback_per_char() {
        let (primary, fallback) = faces();
        let single = FaceEngine::new(&primary, 20.0);
        let engine = FaceEngine::new(&primary, 20.0).with_fallback(&fallback);
        let pua = PUA.to_string();

        assert!(single.has("a"));
        assert!(!single.has(&pua));
        assert!(engine.has(&pua));
        assert!(!engine.has("\u{F0000}"));

        assert_eq!(engine.measure("a", 0.0), advance(&primary, 'a'));
        assert_eq!(engine.measure(&pua, 0.0), advance(&fallback, PUA));
        assert_eq!(engine.measure(&pua, 2.0), advance(&fallback, PUA) + 2.0);
        // found in no face: the primary face's missing glyph
        assert_eq!(single.measure(&pua, 0.0), advance(&primary, PUA));
        assert_ne!(single.measure(&pua, 0.0), engine.measure(&pua, 0.0));
    }

    #[test]
    fn vertical_metrics_over_used_faces() {
        let (primary, fallback) = faces();
        let engine = FaceEngine::new(&primary, 20.0).with_fallback(&fallback);
        let metrics = |face: &Face| {
            let dpu = dpu(face);
            (
                dpu.px(face.ascender()),
                -dpu.px(face.descender()),
                dpu.px(face.line_gap()),
            )
        };
        let (a0, d0, g0) = metrics(&primary);
        let (a1, d1, g1) = metrics(&fallback);

        assert_eq!(engine.height("a"), a0 + d0 + g0);
        assert_eq!(engine.height(""), a0 + d0 + g0);
        assert_eq!(
            engine.baseline("a"),
            half_leading_baseline(a0, d0, a0 + d0 + g0)
        );

        let mixed = format!("a{PUA}");
        let (ascent, descent, gap) = (a0.max(a1), d0.max(d1), g0.max(g1));
        assert_eq!(engine.height(&mixed), ascent + descent + gap);

        let fixed = engine.clone().with_line_height(LineHeight::Px(40.0));
        assert_eq!(fixed.height(&mixed), 40.0);
        assert_eq!(
            fixed.baseline(&mixed),
            half_leading_baseline(ascent, descent, 40.0)
        );
    }

    #[test]
    fn decoration_metrics() {
        let (primary, fallback) = faces();
        let engine = FaceEngine::new(&primary, 20.0).with_fallback(&fallback);
        let dpu = dpu(&primary);
        let metrics = engine.decoration_metrics();
        assert_eq!(
            metrics.underline,
            dpu.decoration(primary.underline_metrics().unwrap())
        );
        assert_eq!(
            metrics.strikethrough,
            dpu.decoration(primary.strikeout_metrics().unwrap())
        );

        // zero-sized lines are replaced
        let engine = FaceEngine::new(&fallback, 20.0);
        assert_eq!(engine.decoration_metrics(), DecorationMetrics::fallback(20.0));
    }

    #[test]
    fn path_follows_measured_advances() {
        let (primary, fallback) = faces();
        let engine = FaceEngine::new(&primary, 20.0).with_fallback(&fallback);
        let pua = PUA.to_string();

        let whole = engine.path(&format!("a{PUA}b"), Vec2(0.0, 30.0), 0.0);
        let x1 = engine.measure("a", 0.0);
        let x2 = x1 + engine.measure(&pua, 0.0);
        let mut parts = engine.path("a", Vec2(0.0, 30.0), 0.0);
        parts.push_str(&engine.path(&pua, Vec2(x1, 30.0), 0.0));
        parts.push_str(&engine.path("b", Vec2(x2, 30.0), 0.0));

        assert!(whole.starts_with('M'));
        assert_eq!(whole, parts);
    }

    #[test]
    fn path_builder_flips_and_scales() {
        let mut d = String::new();
        let mut b = SvgPathBuilder::new(&mut d, Vec2(10.0, 100.0), 0.5);
        b.move_to(0.0, 0.0);
        b.line_to(20.0, 40.0);
        b.quad_to(20.0, 0.0, 40.0, 0.0);
        b.close();
        assert_eq!(d, "M10.00 100.00L20.00 80.00Q20.00 100.00 30.00 100.00Z");
    }
}
