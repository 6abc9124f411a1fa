// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Bidirectional analysis of a single line
//!
//! The analysis works on chars: levels and the visual order are indexed by
//! char position within the line, not by byte.

use crate::conv::to_u32;
use crate::{Direction, Range};
use smallvec::SmallVec;
use unicode_bidi::{BidiInfo, Level, LTR_LEVEL, RTL_LEVEL};
use unicode_segmentation::UnicodeSegmentation;

/// A maximal span of a line sharing one embedding level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    /// Char range within the line, in logical order
    pub range: Range,
    pub level: Level,
}

impl Run {
    #[inline]
    pub fn is_rtl(&self) -> bool {
        self.level.is_rtl()
    }
}

/// Result of bidi analysis of one line
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BidiLine {
    /// Embedding level of each char
    pub levels: Vec<Level>,
    /// Level runs, in logical order, covering the whole line
    pub runs: SmallVec<[Run; 2]>,
    /// Logical char indices in visual left-to-right order
    ///
    /// This is a permutation of `0..levels.len()`.
    pub order: Vec<usize>,
}

impl BidiLine {
    /// Number of chars in the line
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Resolve the paragraph level for `text`
///
/// With [`Direction::Auto`] this uses the first strong char of the whole
/// text, defaulting to left-to-right.
pub fn base_level(text: &str, direction: Direction) -> Level {
    match direction {
        Direction::Ltr => LTR_LEVEL,
        Direction::Rtl => RTL_LEVEL,
        Direction::Auto => match unicode_bidi::get_base_direction(text) {
            unicode_bidi::Direction::Rtl => RTL_LEVEL,
            _ => LTR_LEVEL,
        },
    }
}

/// Analyze one line of text in logical order
///
/// Never fails: if the bidi algorithm yields inconsistent levels, the line
/// becomes a single left-to-right run.
pub fn analyze(line: &str, base: Level) -> BidiLine {
    if line.is_empty() {
        return BidiLine::default();
    }
    build(line, char_levels(line, base))
}

/// Per-char levels with rule L1 applied for the whole line
fn char_levels(line: &str, base: Level) -> Option<Vec<Level>> {
    let info = BidiInfo::new(line, Some(base));
    let para = info.paragraphs.first()?;
    Some(info.reordered_levels_per_char(para, para.range.clone()))
}

fn build(line: &str, levels: Option<Vec<Level>>) -> BidiLine {
    let len = line.chars().count();
    let levels = match levels {
        Some(levels) if levels.len() == len => levels,
        other => {
            log::warn!(
                "bidi: expected {len} levels, found {:?}; using a single run",
                other.map(|v| v.len())
            );
            vec![LTR_LEVEL; len]
        }
    };

    let runs = runs_from_levels(&levels);
    let order = visual_order(line, &levels);
    BidiLine {
        levels,
        runs,
        order,
    }
}

/// Cut the line into runs at every level change
fn runs_from_levels(levels: &[Level]) -> SmallVec<[Run; 2]> {
    let mut runs = SmallVec::new();
    let Some(&first) = levels.first() else {
        return runs;
    };

    let mut start = 0;
    let mut level = first;
    for (i, l) in levels.iter().enumerate().skip(1) {
        if *l != level {
            runs.push(Run {
                range: (start..i).into(),
                level,
            });
            start = i;
            level = *l;
        }
    }
    runs.push(Run {
        range: (start..levels.len()).into(),
        level,
    });
    runs
}

/// Unicode TR#9 rule L2: reverse, from the highest level down to the lowest
/// odd level, every maximal sequence at that level or higher
///
/// Multi-char grapheme clusters are then restored to logical order so that
/// combining marks stay attached to their base.
fn visual_order(line: &str, levels: &[Level]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    let Some(max) = levels.iter().map(|l| l.number()).max() else {
        return order;
    };
    let min = levels.iter().map(|l| l.number()).min().unwrap_or(0);
    let min_odd = if min % 2 == 1 { min } else { min + 1 };

    let mut level = max;
    while level >= min_odd {
        let mut start = None;
        for i in 0..order.len() {
            if levels[order[i]].number() >= level {
                if start.is_none() {
                    start = Some(i);
                }
            } else if let Some(s) = start.take() {
                order[s..i].reverse();
            }
        }
        if let Some(s) = start {
            order[s..].reverse();
        }
        level -= 1;
    }

    if max > 0 {
        restore_clusters(line, &mut order);
    }
    order
}

fn restore_clusters(line: &str, order: &mut [usize]) {
    let mut position = vec![0; order.len()];
    for (pos, &index) in order.iter().enumerate() {
        position[index] = pos;
    }

    let mut start = 0;
    for grapheme in line.graphemes(true) {
        let len = grapheme.chars().count();
        let end = start + len;
        if len > 1 {
            let lo = position[start..end].iter().copied().min().unwrap_or(0);
            let hi = position[start..end].iter().copied().max().unwrap_or(0);
            if hi - lo + 1 == len {
                for (pos, index) in (lo..=hi).zip(start..end) {
                    order[pos] = index;
                }
            }
        }
        start = end;
    }
}

/// Char range of each run, for use by the shaper
pub(crate) fn run_ranges(runs: &[Run]) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
    runs.iter().map(|run| run.range.to_std())
}

/// Index of the run owning each char
pub(crate) fn run_owners(bidi: &BidiLine) -> Vec<u32> {
    let mut owners = Vec::with_capacity(bidi.len());
    for (i, range) in run_ranges(&bidi.runs).enumerate() {
        owners.extend(std::iter::repeat(to_u32(i)).take(range.len()));
    }
    owners
}
