// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text-layout environment: styling inputs consumed by the flow

use crate::Vec2;
use easy_cast::CastFloat;
use std::str::FromStr;
use thiserror::Error;

/// Smallest font size considered by the font-fit search
pub const MIN_FIT_FONT_SIZE: f32 = 10.0;

/// Largest font size considered by the font-fit search, unless
/// [`Environment::max_font_size`] is set
pub const DEFAULT_MAX_FIT_FONT_SIZE: f32 = 120.0;

/// A configuration keyword was not recognised
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("unknown keyword `{0}`")]
pub struct UnknownKeyword(pub String);

macro_rules! keywords {
    ($ty:ident { $($kw:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = UnknownKeyword;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($kw => Ok($ty::$variant),)+
                    other => Err(UnknownKeyword(other.to_string())),
                }
            }
        }
    };
}

/// Environment in which text is laid out
///
/// An `Environment` can be default-constructed: 16px text, start-aligned,
/// wrapping at word boundaries with whitespace collapsed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Environment {
    /// Font size in pixels per em
    ///
    /// With [`TextFit::Multiline`] this is only used when the available height
    /// is unbounded.
    pub font_size: f32,
    /// Height of each line box
    pub line_height: LineHeight,
    /// Extra advance added after every grapheme
    pub letter_spacing: f32,
    /// Horizontal alignment of lines within the container
    pub align: Align,
    /// Base direction of the text
    pub direction: Direction,
    pub wrap: TextWrap,
    pub fit: TextFit,
    /// Upper bound of the font-fit search
    pub max_font_size: Option<f32>,
    /// Width of a tab stop, in spaces
    pub tab_size: u32,
    pub white_space: WhiteSpace,
    pub word_break: WordBreak,
    pub transform: TextTransform,
    /// Maximum number of lines; content beyond is dropped
    pub max_lines: Option<usize>,
    /// What to do with dropped content
    pub overflow: TextOverflow,
    pub decoration: Decoration,
    /// Fill colour, passed through to the serializer
    pub color: String,
    pub shadows: Vec<Shadow>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            font_size: 16.0,
            line_height: LineHeight::Normal,
            letter_spacing: 0.0,
            align: Align::default(),
            direction: Direction::default(),
            wrap: TextWrap::default(),
            fit: TextFit::default(),
            max_font_size: None,
            tab_size: 8,
            white_space: WhiteSpace::default(),
            word_break: WordBreak::default(),
            transform: TextTransform::default(),
            max_lines: None,
            overflow: TextOverflow::default(),
            decoration: Decoration::empty(),
            color: "black".to_string(),
            shadows: Vec::new(),
        }
    }
}

impl Environment {
    /// Alternative default constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the flow may insert breaks to fit the container width
    #[inline]
    pub fn allow_soft_wrap(&self) -> bool {
        self.white_space.wraps()
    }

    /// Whether overlong words may be broken between graphemes
    #[inline]
    pub fn allow_break_word(&self) -> bool {
        self.word_break == WordBreak::BreakWord
    }

    /// Maximum number of lines, or `usize::MAX`
    #[inline]
    pub fn line_limit(&self) -> usize {
        self.max_lines.unwrap_or(usize::MAX)
    }

    /// Inclusive range of integer font sizes for the font-fit search
    pub fn fit_range(&self) -> (u32, u32) {
        let min = MIN_FIT_FONT_SIZE.cast_nearest();
        let max = self
            .max_font_size
            .filter(|size| size.is_finite())
            .unwrap_or(DEFAULT_MAX_FIT_FONT_SIZE)
            .clamp(MIN_FIT_FONT_SIZE, f32::from(u16::MAX))
            .cast_floor();
        (min, max)
    }
}

/// Height of a line box
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineHeight {
    /// Use the font's own ascent, descent and line gap
    #[default]
    Normal,
    /// A multiple of the font size
    Factor(f32),
    /// An absolute height in pixels
    Px(f32),
}

impl LineHeight {
    /// Resolve to pixels, or `None` for [`LineHeight::Normal`]
    pub fn resolve(self, font_size: f32) -> Option<f32> {
        match self {
            LineHeight::Normal => None,
            LineHeight::Factor(f) => Some(f * font_size),
            LineHeight::Px(px) => Some(px),
        }
    }
}

impl FromStr for LineHeight {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "normal" {
            return Ok(LineHeight::Normal);
        }
        let parsed = if let Some(px) = s.strip_suffix("px") {
            px.trim().parse().map(LineHeight::Px)
        } else {
            s.parse().map(LineHeight::Factor)
        };
        parsed.map_err(|_| UnknownKeyword(s.to_string()))
    }
}

/// Horizontal alignment of lines
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Left,
    Right,
    Center,
    /// Stretch lines which do not end a paragraph to the container width
    Justify,
    /// Left for left-to-right text, right otherwise
    #[default]
    Start,
    /// Right for left-to-right text, left otherwise
    End,
}

keywords!(Align {
    "left" => Left,
    "right" => Right,
    "center" => Center,
    "justify" => Justify,
    "start" => Start,
    "end" => End,
});

/// Base direction of the text
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Detect from the first strong character
    #[default]
    Auto,
    Ltr,
    Rtl,
}

keywords!(Direction {
    "auto" => Auto,
    "ltr" => Ltr,
    "rtl" => Rtl,
});

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextWrap {
    #[default]
    Normal,
    /// Narrow the wrap width as far as possible without adding lines
    Balance,
}

keywords!(TextWrap {
    "normal" => Normal,
    "wrap" => Normal,
    "balance" => Balance,
});

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextFit {
    #[default]
    Normal,
    /// Search the largest font size whose flow fits the available height
    Multiline,
}

keywords!(TextFit {
    "normal" => Normal,
    "multiline" => Multiline,
});

/// Whitespace handling
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WhiteSpace {
    #[default]
    Normal,
    NoWrap,
    Pre,
    PreWrap,
    PreLine,
}

keywords!(WhiteSpace {
    "normal" => Normal,
    "nowrap" => NoWrap,
    "pre" => Pre,
    "pre-wrap" => PreWrap,
    "pre-line" => PreLine,
});

impl WhiteSpace {
    /// Sequences of spaces and tabs collapse to a single space
    #[inline]
    pub fn collapses_spaces(self) -> bool {
        matches!(
            self,
            WhiteSpace::Normal | WhiteSpace::NoWrap | WhiteSpace::PreLine
        )
    }

    /// Newlines in the source are forced breaks
    #[inline]
    pub fn preserves_newlines(self) -> bool {
        matches!(
            self,
            WhiteSpace::Pre | WhiteSpace::PreWrap | WhiteSpace::PreLine
        )
    }

    /// Lines may be soft-wrapped
    #[inline]
    pub fn wraps(self) -> bool {
        matches!(
            self,
            WhiteSpace::Normal | WhiteSpace::PreWrap | WhiteSpace::PreLine
        )
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WordBreak {
    #[default]
    Normal,
    /// Break between any two graphemes
    BreakAll,
    /// Break overlong words between graphemes
    BreakWord,
    /// Break at whitespace only
    KeepAll,
}

keywords!(WordBreak {
    "normal" => Normal,
    "break-all" => BreakAll,
    "break-word" => BreakWord,
    "keep-all" => KeepAll,
});

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

keywords!(TextTransform {
    "none" => None,
    "uppercase" => Uppercase,
    "lowercase" => Lowercase,
    "capitalize" => Capitalize,
});

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextOverflow {
    #[default]
    Clip,
    /// Replace the end of the last kept line with "…"
    Ellipsis,
}

keywords!(TextOverflow {
    "clip" => Clip,
    "ellipsis" => Ellipsis,
});

bitflags::bitflags! {
    /// Text decoration lines
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Decoration: u8 {
        const UNDERLINE = 1 << 0;
        const OVERLINE = 1 << 1;
        const LINE_THROUGH = 1 << 2;
    }
}

impl FromStr for Decoration {
    type Err = UnknownKeyword;

    /// Parse a space-separated list such as `"underline line-through"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Decoration::empty();
        for word in s.split_whitespace() {
            flags |= match word {
                "none" => Decoration::empty(),
                "underline" => Decoration::UNDERLINE,
                "overline" => Decoration::OVERLINE,
                "line-through" => Decoration::LINE_THROUGH,
                other => return Err(UnknownKeyword(other.to_string())),
            };
        }
        Ok(flags)
    }
}

/// A drop shadow behind the glyphs
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shadow {
    pub offset: Vec2,
    pub blur: f32,
    pub color: String,
}
