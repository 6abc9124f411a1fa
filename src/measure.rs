// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Grapheme width measurement with caching

use crate::fonts::Engine;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Graphemes drawn as inline images, mapped to the image reference
pub type GraphemeImages = HashMap<String, String>;

/// Cache key: bit patterns of font size and letter spacing
type SizeKey = (u32, u32);

/// Measures graphemes, runs and words
///
/// Widths are cached per `(grapheme, font size, letter spacing)`. The cache
/// only grows; it lives as long as one layout of one text node.
///
/// Graphemes listed in the [`GraphemeImages`] are inline images: each costs
/// exactly one font size, without consulting the engine.
#[derive(Clone, Debug, Default)]
pub struct Measurer {
    images: GraphemeImages,
    cache: HashMap<SizeKey, HashMap<String, f32>>,
}

impl Measurer {
    /// Construct with a set of image graphemes
    pub fn new(images: GraphemeImages) -> Self {
        Measurer {
            images,
            cache: HashMap::new(),
        }
    }

    /// Access image graphemes
    #[inline]
    pub fn images(&self) -> &GraphemeImages {
        &self.images
    }

    /// True if `grapheme` is drawn as an image
    #[inline]
    pub fn is_image(&self, grapheme: &str) -> bool {
        self.images.contains_key(grapheme)
    }

    /// Number of cached widths
    pub fn cached(&self) -> usize {
        self.cache.values().map(|m| m.len()).sum()
    }

    /// Width of a single grapheme, using the cache
    pub fn measure<E: Engine>(&mut self, engine: &E, grapheme: &str, letter_spacing: f32) -> f32 {
        let key = (engine.font_size().to_bits(), letter_spacing.to_bits());
        let widths = self.cache.entry(key).or_default();
        if let Some(width) = widths.get(grapheme) {
            return *width;
        }

        let width = engine.measure(grapheme, letter_spacing);
        // Engines must not fail; guard the flow against bad metrics
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        widths.insert(grapheme.to_string(), width);
        width
    }

    /// Sum of the widths of a sequence of graphemes
    ///
    /// Image graphemes contribute exactly the font size.
    pub fn measure_array<'s, E, I>(&mut self, engine: &E, graphemes: I, letter_spacing: f32) -> f32
    where
        E: Engine,
        I: IntoIterator<Item = &'s str>,
    {
        let font_size = engine.font_size();
        let mut width = 0.0;
        for grapheme in graphemes {
            width += if self.is_image(grapheme) {
                font_size
            } else {
                self.measure(engine, grapheme, letter_spacing)
            };
        }
        width
    }

    /// Width of `text`, segmented into grapheme clusters
    #[inline]
    pub fn measure_text<E: Engine>(&mut self, engine: &E, text: &str, letter_spacing: f32) -> f32 {
        self.measure_array(engine, text.graphemes(true), letter_spacing)
    }
}
