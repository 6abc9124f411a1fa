// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text flow library
//!
//! This library lays out a run of text inside a fixed-width box: it breaks
//! the text into lines, reorders each line for bidirectional display,
//! measures and positions the resulting visual segments, and optionally
//! searches for the largest font size fitting a bounded box.
//!
//! Font access is abstracted by the [`fonts::Engine`] trait;
//! [`fonts::FaceEngine`] implements it over `ttf-parser` faces and
//! [`fonts::MonoEngine`] is a fixed-advance engine for headless use.
//!
//! Layout of a text node is a handshake with the caller, driven through
//! [`TextLayout`]:
//! ```
//! use text_flow::fonts::MonoEngine;
//! use text_flow::{BoxLayout, Environment, LineHeight, TextLayout, Vec2};
//!
//! let layout = TextLayout::new("Hello world", Environment::default());
//! let (missing, token) = layout.begin_measure(&MonoEngine::new(16.0));
//! assert!(missing.is_empty());
//!
//! let builder = |size: f32, lh: LineHeight| MonoEngine::new(size).with_line_height(lh);
//! let mut text = token.finish_measure(builder).unwrap();
//! let size = text.measure(Vec2(60.0, f32::INFINITY));
//! assert_eq!(size, Vec2(60.0, 32.0));
//!
//! let output = text.render(&BoxLayout { origin: Vec2::ZERO, size });
//! assert!(output.to_svg().starts_with("<path"));
//! ```

mod conv;
pub use conv::{DPU, LineMetrics};

mod data;
pub use data::*;

mod env;
pub use env::*;

pub mod bidi;
pub mod flow;
pub mod fonts;
pub mod measure;
pub mod shaper;
pub mod words;

mod output;
pub use output::{DrawItem, Output};

mod place;
pub use place::Placer;

mod text;
pub use text::*;

pub use flow::{FlowResult, LineRecord, PlacedSegment};
pub use measure::{GraphemeImages, Measurer};
