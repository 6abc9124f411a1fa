// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Line flow: breaking, font-fit search and balancing
//!
//! [`LineFlow`] runs the greedy line breaker once over a word sequence at a
//! fixed engine and width, shaping each completed line. [`resolve`] drives
//! it: it chooses the font size (see [`TextFit`]), then optionally narrows
//! the wrap width to balance line lengths (see [`TextWrap`]).

use crate::bidi::analyze;
use crate::conv::count_to_f32;
use crate::fonts::{Engine, EngineBuilder};
use crate::measure::Measurer;
use crate::shaper::Shaper;
use crate::words::Word;
use crate::{Align, Environment, Range, TextFit, TextOverflow, TextWrap, Vec2};
use easy_cast::{CastApprox, CastFloat};
use unicode_bidi::Level;
use unicode_segmentation::UnicodeSegmentation;

/// Tolerance used in all width and height comparisons
pub const EPSILON: f32 = 1e-3;

/// Chars which may never start a soft-wrapped line
pub const FORBIDDEN_LINE_START: &str = ",.!?:-@)>]}%#";

const ELLIPSIS: &str = "\u{2026}";

/// A completed line
#[derive(Clone, Debug, PartialEq)]
pub struct LineRecord {
    /// Distance from the top of the text to the top of the line
    pub top: f32,
    /// Sum of segment widths
    pub width: f32,
    pub height: f32,
    /// Distance from the line top to the shared baseline
    pub baseline: f32,
    /// Range of this line's segments in [`FlowResult::segments`]
    pub segments: Range,
    /// The paragraph direction is right-to-left
    pub rtl: bool,
    /// The line is followed by a forced break or ends the text
    pub ends_paragraph: bool,
}

impl LineRecord {
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// A visual segment positioned relative to the text's top-left corner
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedSegment {
    pub text: String,
    /// Offset from the line start (before alignment)
    pub x: f32,
    /// Top of the owning line
    pub y: f32,
    pub width: f32,
    /// Index of the owning line
    pub line: usize,
    /// Index within the owning line, in visual order
    pub line_index: usize,
    pub is_image: bool,
    /// Distance from the top of the segment's own line box to its baseline
    pub baseline: f32,
    pub rtl: bool,
}

impl PlacedSegment {
    /// Vertical shift which puts this segment on its line's shared baseline
    #[inline]
    pub fn baseline_delta(&self, line: &LineRecord) -> f32 {
        line.baseline - self.baseline
    }
}

/// Everything produced by one flow pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowResult {
    pub lines: Vec<LineRecord>,
    pub segments: Vec<PlacedSegment>,
    /// Width of the widest line
    pub width: f32,
    /// Sum of line heights
    pub height: f32,
    pub font_size: f32,
    /// Content was dropped due to [`Environment::max_lines`]
    pub truncated: bool,
    /// At least one soft wrap occurred
    pub wrapped: bool,
}

impl FlowResult {
    fn new(font_size: f32) -> Self {
        FlowResult {
            font_size,
            ..Default::default()
        }
    }

    /// Size reported to the box-layout engine
    ///
    /// The width is exactly the available width once any line has been
    /// soft-wrapped, otherwise the widest line rounded up. Flowing again at
    /// the reported width reproduces the same lines.
    pub fn size(&self, available_width: f32) -> Vec2 {
        let width = if self.wrapped && available_width.is_finite() {
            available_width
        } else if self.width <= available_width {
            // rounding may not widen the box past what the lines were fit to
            self.width.ceil().min(available_width)
        } else {
            self.width.ceil()
        };
        Vec2(width, self.height)
    }

    /// Segments of line `index`
    pub fn line_segments(&self, index: usize) -> &[PlacedSegment] {
        match self.lines.get(index) {
            Some(line) => &self.segments[line.segments.to_std()],
            None => &[],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Accumulating,
    LineClosed,
    Done,
}

/// The line under construction
#[derive(Debug, Default)]
struct Accumulator {
    text: String,
    /// Advance including trailing whitespace
    caret: f32,
    /// Some word (possibly skipped whitespace) has been assigned to the line
    started: bool,
    /// Some word has been appended to the line
    has_content: bool,
}

/// Greedy line breaker for one engine
pub struct LineFlow<'a, E: Engine> {
    env: &'a Environment,
    engine: &'a E,
    measurer: &'a mut Measurer,
    base: Level,
}

impl<'a, E: Engine> LineFlow<'a, E> {
    /// Construct
    ///
    /// `base` is the paragraph level, resolved once for the whole text.
    pub fn new(env: &'a Environment, engine: &'a E, measurer: &'a mut Measurer, base: Level) -> Self {
        LineFlow {
            env,
            engine,
            measurer,
            base,
        }
    }

    fn measure(&mut self, text: &str) -> f32 {
        self.measurer
            .measure_text(self.engine, text, self.env.letter_spacing)
    }

    /// Flow `words` into lines no wider than `width` (where wrapping allows)
    pub fn run(&mut self, words: &[Word], width: f32) -> FlowResult {
        let mut result = FlowResult::new(self.engine.font_size());
        let limit = self.env.line_limit();
        if limit == 0 {
            result.truncated = !words.is_empty();
            return result;
        }

        let soft_wrap = self.env.allow_soft_wrap();
        let break_word = soft_wrap && self.env.allow_break_word();
        let collapse = self.env.white_space.collapses_spaces();

        // Words still to place; split words are pushed back
        let mut stack: Vec<Word> = words.iter().rev().cloned().collect();
        let mut line = Accumulator::default();
        let mut forced = false;
        let mut state = State::Accumulating;

        while let Some(word) = stack.pop() {
            let fit_width = if word.is_blank() {
                0.0
            } else {
                self.measure(word.trimmed())
            };
            let overlong =
                break_word && fit_width > width + EPSILON && word.text.graphemes(true).nth(1).is_some();
            let will_wrap = line.has_content
                && soft_wrap
                && (overlong
                    || (!starts_forbidden(&word.text) && line.caret + fit_width > width + EPSILON));

            if forced || will_wrap {
                state = State::LineClosed;
            }

            if state == State::LineClosed {
                let last = result.lines.len() + 1 >= limit;
                let closed = std::mem::take(&mut line);
                self.close_line(&mut result, closed, width, !forced, forced, last);
                forced = false;
                if last {
                    result.truncated = true;
                    state = State::Done;
                    break;
                }
                state = State::Accumulating;
            }

            if overlong {
                let graphemes: Vec<&str> = word.text.graphemes(true).collect();
                let end = graphemes.len() - 1;
                for (i, g) in graphemes.into_iter().enumerate().rev() {
                    stack.push(Word::new(g, i == end && word.hard_break));
                }
                continue;
            }

            line.started = true;
            forced = word.hard_break;
            if collapse && !line.has_content && word.is_blank() {
                continue;
            }

            if word.is_tab() {
                let space = self.measure(" ");
                let n = self.tab_spaces(line.caret, space);
                line.text.extend(std::iter::repeat(' ').take(n));
                line.caret += space * count_to_f32(n);
            } else {
                line.caret += self.measure(&word.text);
                line.text.push_str(&word.text);
            }
            line.has_content = true;
        }

        if state != State::Done && line.started {
            self.close_line(&mut result, line, width, false, true, false);
        }
        result
    }

    /// Number of spaces reaching the next tab stop from `caret`
    fn tab_spaces(&self, caret: f32, space: f32) -> usize {
        let tab_size: f32 = self.env.tab_size.cast_approx();
        let stop = space * tab_size;
        if stop.is_nan() || stop <= 0.0 {
            return 1;
        }
        let next = ((caret / stop).floor() + 1.0) * stop;
        let n: f32 = ((next - caret) / space).round().max(1.0);
        n.cast_nearest()
    }

    fn close_line(
        &mut self,
        result: &mut FlowResult,
        line: Accumulator,
        width: f32,
        soft: bool,
        ends_paragraph: bool,
        truncating: bool,
    ) {
        let mut text = line.text;
        if soft || truncating || self.env.white_space.collapses_spaces() {
            text.truncate(text.trim_end().len());
        }

        if self.env.overflow == TextOverflow::Ellipsis {
            let overflows = !self.env.allow_soft_wrap() && self.measure(&text) > width + EPSILON;
            if truncating || overflows {
                text = self.ellipsize(&text, width);
            }
        }

        let bidi = analyze(&text, self.base);
        let shaped = Shaper::new(self.engine, self.measurer, self.env.letter_spacing)
            .split_words(self.env.align == Align::Justify)
            .shape(&text, &bidi);

        let index = result.lines.len();
        let top = result.height;
        let first = result.segments.len();
        for (line_index, seg) in shaped.segments.iter().enumerate() {
            result.segments.push(PlacedSegment {
                text: seg.text.clone(),
                x: seg.x,
                y: top,
                width: seg.width,
                line: index,
                line_index,
                is_image: seg.is_image,
                baseline: seg.baseline,
                rtl: seg.level.is_rtl(),
            });
        }

        let height = shaped.height();
        log::trace!(
            "line {index}: width {}, height {height}, {}",
            shaped.width,
            if soft { "soft" } else { "forced" }
        );
        result.lines.push(LineRecord {
            top,
            width: shaped.width,
            height,
            baseline: shaped.ascent,
            segments: (first..result.segments.len()).into(),
            rtl: self.base.is_rtl(),
            ends_paragraph,
        });
        result.height += height;
        result.width = result.width.max(shaped.width);
        result.wrapped |= soft;
    }

    /// Shorten `text` grapheme-wise so that it plus "…" fits `width`
    fn ellipsize(&mut self, text: &str, width: f32) -> String {
        let full = format!("{text}{ELLIPSIS}");
        if self.measure(&full) <= width + EPSILON {
            return full;
        }

        let bounds: Vec<usize> = text.grapheme_indices(true).map(|(i, _)| i).collect();
        // bounds[k] is the end of a k-grapheme prefix, for k < bounds.len()
        let mut lo = 0;
        let mut hi = bounds.len();
        let mut best = 0;
        while lo < hi {
            let mid = (lo + hi) / 2;
            let candidate = format!("{}{ELLIPSIS}", text[..bounds[mid]].trim_end());
            if self.measure(&candidate) <= width + EPSILON {
                best = mid;
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let kept = bounds.get(best).copied().unwrap_or(0);
        format!("{}{ELLIPSIS}", text[..kept].trim_end())
    }
}

fn starts_forbidden(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| FORBIDDEN_LINE_START.contains(c))
}

/// Result of [`resolve`]
#[derive(Debug)]
pub struct Resolved<E> {
    /// Engine at the chosen font size
    pub engine: E,
    pub flow: FlowResult,
    /// Width used for wrapping; may be less than available with balancing
    pub wrap_width: f32,
}

/// Choose a font size and wrap width for `available`, then flow
pub fn resolve<B: EngineBuilder>(
    builder: &B,
    words: &[Word],
    env: &Environment,
    measurer: &mut Measurer,
    base: Level,
    available: Vec2,
) -> Resolved<B::Engine> {
    let Vec2(width, height) = available;
    let font_size = if env.fit == TextFit::Multiline && height.is_finite() {
        fit_font_size(builder, words, env, measurer, base, available)
    } else {
        env.font_size
    };

    let engine = builder.build(font_size, env.line_height);
    let mut flow = LineFlow::new(env, &engine, measurer, base).run(words, width);
    let mut wrap_width = width;

    if env.wrap == TextWrap::Balance && flow.wrapped && width.is_finite() {
        if let Some((balanced_width, balanced)) = balance(&engine, words, env, measurer, base, width, &flow) {
            log::debug!("balance: wrap width {width} -> {balanced_width}");
            wrap_width = balanced_width;
            flow = balanced;
        }
    }

    Resolved {
        engine,
        flow,
        wrap_width,
    }
}

/// Binary search for the largest integer font size whose flow fits `available`
///
/// Returns the minimum of [`Environment::fit_range`] if nothing fits.
pub fn fit_font_size<B: EngineBuilder>(
    builder: &B,
    words: &[Word],
    env: &Environment,
    measurer: &mut Measurer,
    base: Level,
    available: Vec2,
) -> f32 {
    let (mut lo, mut hi) = env.fit_range();
    let mut best = lo;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let size: f32 = mid.cast_approx();
        let engine = builder.build(size, env.line_height);
        let flow = LineFlow::new(env, &engine, measurer, base).run(words, available.0);
        let fits = flow.height <= available.1 + EPSILON;
        log::debug!(
            "fit: size {mid} gives height {} ({})",
            flow.height,
            if fits { "accepted" } else { "rejected" }
        );
        if fits {
            best = mid;
            lo = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            hi = mid - 1;
        }
    }
    log::debug!("fit: chose font size {best}");
    best.cast_approx()
}

/// Narrowest wrap width in `[width / 2, width]` keeping line count and height
fn balance<E: Engine>(
    engine: &E,
    words: &[Word],
    env: &Environment,
    measurer: &mut Measurer,
    base: Level,
    width: f32,
    flow: &FlowResult,
) -> Option<(f32, FlowResult)> {
    let lines = flow.lines.len();
    let height = flow.height;
    let mut lo = width / 2.0;
    let mut hi = width;
    let mut best = None;
    while hi - lo > 1.0 {
        let mid = (lo + hi) / 2.0;
        let candidate = LineFlow::new(env, engine, measurer, base).run(words, mid);
        if candidate.lines.len() == lines
            && candidate.height <= height + EPSILON
            && candidate.truncated == flow.truncated
        {
            hi = mid;
            best = Some(candidate);
        } else {
            lo = mid;
        }
    }
    best.map(|flow| (hi, flow))
}
