// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Simple data types

use crate::conv::{to_u32, to_usize};

/// 2D vector
///
/// Usually used for a position or a size; the y-axis points down.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2(pub f32, pub f32);

impl Vec2 {
    /// Zero
    pub const ZERO: Vec2 = Vec2(0.0, 0.0);

    /// Positive infinity (unbounded space)
    pub const INFINITY: Vec2 = Vec2(f32::INFINITY, f32::INFINITY);

    /// Take the component-wise sum
    #[inline]
    pub fn offset(self, rhs: Vec2) -> Vec2 {
        Vec2(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl From<(f32, f32)> for Vec2 {
    #[inline]
    fn from((x, y): (f32, f32)) -> Self {
        Vec2(x, y)
    }
}

/// A compact index range
///
/// Used for char ranges of bidi runs within a line and for the segment range
/// of each flowed line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    /// The start, as `usize`
    #[inline]
    pub fn start(self) -> usize {
        to_usize(self.start)
    }

    /// The end, as `usize`
    #[inline]
    pub fn end(self) -> usize {
        to_usize(self.end)
    }

    /// Length of the range
    #[inline]
    pub fn len(self) -> usize {
        to_usize(self.end - self.start)
    }

    /// True if the range is empty
    #[inline]
    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Convert to a standard range
    #[inline]
    pub fn to_std(self) -> std::ops::Range<usize> {
        to_usize(self.start)..to_usize(self.end)
    }
}

impl From<std::ops::Range<usize>> for Range {
    #[inline]
    fn from(range: std::ops::Range<usize>) -> Range {
        Range {
            start: to_u32(range.start),
            end: to_u32(range.end),
        }
    }
}

impl From<Range> for std::ops::Range<usize> {
    #[inline]
    fn from(range: Range) -> std::ops::Range<usize> {
        range.to_std()
    }
}
