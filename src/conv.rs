// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Numeric conversions
//!
//! Char indices of bidi runs and segment indices of flowed lines are stored
//! as `u32` in [`crate::Range`]; one text node stays far below `u32::MAX`.
//! Conversions go through `easy-cast`, checked on debug builds.

use easy_cast::{Cast, CastApprox};

/// Char or segment index → stored `u32`
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Stored `u32` → char or segment index
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Segment and tab counts as `f32`
#[inline]
pub(crate) fn count_to_f32(x: usize) -> f32 {
    x.cast_approx()
}

/// Pixels per font unit of one face at one font size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DPU(pub f32);

impl DPU {
    /// Scale of a face with `units_per_em` rendered at `font_size` pixels
    pub fn new(font_size: f32, units_per_em: u16) -> Self {
        DPU(font_size / f32::from(units_per_em.max(1)))
    }

    /// Convert font units (advances, ascender, ...) to pixels
    #[inline]
    pub(crate) fn px(self, units: impl Into<f32>) -> f32 {
        units.into() * self.0
    }

    pub(crate) fn decoration(self, metrics: ttf_parser::LineMetrics) -> LineMetrics {
        LineMetrics {
            position: self.px(metrics.position),
            thickness: self.px(metrics.thickness),
        }
    }
}

/// Position and thickness of a decoration line, in pixels
///
/// `position` is measured upwards from the baseline, as in font files: an
/// underline usually has a negative position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineMetrics {
    pub position: f32,
    pub thickness: f32,
}
