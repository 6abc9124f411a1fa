// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Placement: from flowed segments to absolute draw items
//!
//! The placer performs no measurement and no re-flow. Horizontal offsets are
//! adjusted by line alignment; vertical offsets put every segment of a line
//! on the line's shared baseline.

use crate::conv::count_to_f32;
use crate::flow::{FlowResult, LineRecord, PlacedSegment};
use crate::fonts::Engine;
use crate::measure::GraphemeImages;
use crate::output::{DrawItem, Output};
use crate::{Align, Decoration, Environment, Vec2};

/// Converts a [`FlowResult`] into an [`Output`]
pub struct Placer<'a, E: Engine> {
    env: &'a Environment,
    engine: &'a E,
    images: &'a GraphemeImages,
}

impl<'a, E: Engine> Placer<'a, E> {
    /// Construct
    ///
    /// `engine` must be the engine the flow was computed with.
    pub fn new(env: &'a Environment, engine: &'a E, images: &'a GraphemeImages) -> Self {
        Placer {
            env,
            engine,
            images,
        }
    }

    /// Place all segments within a container at `origin` of the given `width`
    pub fn place(&self, flow: &FlowResult, origin: Vec2, width: f32) -> Output {
        let mut output = Output {
            items: Vec::with_capacity(flow.segments.len()),
            color: self.env.color.clone(),
            shadows: self.env.shadows.clone(),
        };

        for (index, line) in flow.lines.iter().enumerate() {
            let segments = flow.line_segments(index);
            let (caret, per_gap) = self.line_offsets(line, segments.len(), width);

            let mut right = caret;
            for seg in segments {
                let x = origin.0 + caret + seg.x + per_gap * gaps_before(seg);
                right = right.max(x - origin.0 + seg.width);
                self.place_segment(&mut output, line, seg, Vec2(x, origin.1));
            }

            if let Some(first) = segments.first() {
                let left = caret + first.x;
                self.decorate(&mut output, line, first, origin, left, right - left);
            }
        }
        output
    }

    /// Initial caret and extra space per gap for one line
    fn line_offsets(&self, line: &LineRecord, count: usize, width: f32) -> (f32, f32) {
        let spare = width - line.width;
        if !spare.is_finite() {
            return (0.0, 0.0);
        }

        let start = match line.rtl {
            false => 0.0,
            true => spare,
        };
        match self.env.align {
            Align::Left => (0.0, 0.0),
            Align::Right => (spare, 0.0),
            Align::Center => (0.5 * spare, 0.0),
            Align::Start => (start, 0.0),
            Align::End => (spare - start, 0.0),
            Align::Justify if line.ends_paragraph || count < 2 || spare <= 0.0 => (start, 0.0),
            Align::Justify => (0.0, spare / count_to_f32(count - 1)),
        }
    }

    fn place_segment(&self, output: &mut Output, line: &LineRecord, seg: &PlacedSegment, pos: Vec2) {
        if seg.is_image {
            let size = self.engine.font_size();
            let src = self.images.get(&seg.text).cloned().unwrap_or_default();
            output.items.push(DrawItem::Image {
                src,
                x: pos.0,
                y: pos.1 + seg.y,
                width: size,
                height: size,
            });
            return;
        }

        if seg.text.chars().all(char::is_whitespace) {
            return;
        }
        let baseline = pos.1 + seg.y + seg.baseline_delta(line) + seg.baseline;
        let path = self
            .engine
            .path(&seg.text, Vec2(pos.0, baseline), self.env.letter_spacing);
        output.items.push(DrawItem::Glyphs {
            text: seg.text.clone(),
            x: pos.0,
            y: baseline,
            width: seg.width,
            path,
        });
    }

    /// Decorations are drawn once per line, anchored on its first segment
    fn decorate(
        &self,
        output: &mut Output,
        line: &LineRecord,
        first: &PlacedSegment,
        origin: Vec2,
        left: f32,
        width: f32,
    ) {
        if self.env.decoration.is_empty() || width <= 0.0 {
            return;
        }

        let top = origin.1 + first.y + first.baseline_delta(line);
        let baseline = top + first.baseline;
        let metrics = self.engine.decoration_metrics();
        let x = origin.0 + left;

        for kind in self.env.decoration.iter() {
            let (y, thickness) = if kind == Decoration::UNDERLINE {
                (baseline - metrics.underline.position, metrics.underline.thickness)
            } else if kind == Decoration::LINE_THROUGH {
                (
                    baseline - metrics.strikethrough.position,
                    metrics.strikethrough.thickness,
                )
            } else {
                (top, metrics.underline.thickness)
            };
            output.items.push(DrawItem::Decoration {
                kind,
                x,
                y,
                width,
                thickness,
            });
        }
    }
}

/// Number of justification gaps left of `seg`
#[inline]
fn gaps_before(seg: &PlacedSegment) -> f32 {
    count_to_f32(seg.line_index)
}
