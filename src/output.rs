// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Draw items and SVG serialization

use crate::{Decoration, Shadow};
use std::fmt::Write;

/// A positioned draw request, in absolute coordinates
#[derive(Clone, Debug, PartialEq)]
pub enum DrawItem {
    /// Glyphs of one segment
    Glyphs {
        text: String,
        /// Left edge
        x: f32,
        /// Baseline
        y: f32,
        width: f32,
        /// SVG path data, already positioned
        path: String,
    },
    /// An inline image grapheme
    Image {
        /// Image reference
        src: String,
        x: f32,
        /// Top edge
        y: f32,
        width: f32,
        height: f32,
    },
    /// A single decoration line
    Decoration {
        /// One flag of [`Decoration`]
        kind: Decoration,
        x: f32,
        /// Centre of the stroke
        y: f32,
        width: f32,
        thickness: f32,
    },
}

/// Final output of one text node
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Output {
    pub items: Vec<DrawItem>,
    /// Fill colour of glyphs and decorations
    pub color: String,
    pub shadows: Vec<Shadow>,
}

impl Output {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize as an SVG fragment
    ///
    /// Each shadow is drawn as a filtered copy of the glyph paths beneath the
    /// text.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let color = escape_svg(&self.color);

        if !self.shadows.is_empty() {
            out.push_str("<defs>");
            for (i, shadow) in self.shadows.iter().enumerate() {
                let _ = write!(
                    out,
                    r#"<filter id="text-shadow-{i}" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="{}" dy="{}" stdDeviation="{}" flood-color="{}"/></filter>"#,
                    shadow.offset.0,
                    shadow.offset.1,
                    0.5 * shadow.blur,
                    escape_svg(&shadow.color),
                );
            }
            out.push_str("</defs>");

            for i in 0..self.shadows.len() {
                let _ = write!(out, r#"<g filter="url(#text-shadow-{i})">"#);
                self.write_paths(&mut out, &color);
                out.push_str("</g>");
            }
        }

        for item in &self.items {
            match item {
                DrawItem::Glyphs { path, .. } => write_path(&mut out, path, &color),
                DrawItem::Image {
                    src,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let _ = write!(
                        out,
                        r#"<image href="{}" x="{x}" y="{y}" width="{width}" height="{height}" preserveAspectRatio="none"/>"#,
                        escape_svg(src),
                    );
                }
                DrawItem::Decoration {
                    x,
                    y,
                    width,
                    thickness,
                    ..
                } => {
                    let top = y - 0.5 * thickness;
                    let _ = write!(
                        out,
                        r#"<rect x="{x}" y="{top}" width="{width}" height="{thickness}" fill="{color}"/>"#,
                    );
                }
            }
        }
        out
    }

    fn write_paths(&self, out: &mut String, color: &str) {
        for item in &self.items {
            if let DrawItem::Glyphs { path, .. } = item {
                write_path(out, path, color);
            }
        }
    }
}

fn write_path(out: &mut String, path: &str, color: &str) {
    if !path.is_empty() {
        let _ = write!(out, r#"<path fill="{color}" d="{path}"/>"#);
    }
}

fn escape_svg(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec2;

    fn glyphs(path: &str) -> DrawItem {
        DrawItem::Glyphs {
            text: "a".to_string(),
            x: 0.0,
            y: 7.5,
            width: 5.0,
            path: path.to_string(),
        }
    }

    #[test]
    fn elements() {
        let output = Output {
            items: vec![
                glyphs("M0 0Z"),
                DrawItem::Image {
                    src: "crab.svg?a=1&b=2".to_string(),
                    x: 5.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                },
                DrawItem::Decoration {
                    kind: Decoration::UNDERLINE,
                    x: 0.0,
                    y: 9.0,
                    width: 15.0,
                    thickness: 1.0,
                },
            ],
            color: "#333".to_string(),
            shadows: vec![],
        };
        assert_eq!(
            output.to_svg(),
            concat!(
                r##"<path fill="#333" d="M0 0Z"/>"##,
                r#"<image href="crab.svg?a=1&amp;b=2" x="5" y="0" width="10" height="10" preserveAspectRatio="none"/>"#,
                r##"<rect x="0" y="8.5" width="15" height="1" fill="#333"/>"##,
            )
        );
    }

    #[test]
    fn shadows() {
        let output = Output {
            items: vec![glyphs("M0 0Z"), glyphs("")],
            color: "black".to_string(),
            shadows: vec![Shadow {
                offset: Vec2(1.0, 2.0),
                blur: 4.0,
                color: "red".to_string(),
            }],
        };
        let svg = output.to_svg();
        assert!(svg.starts_with(r#"<defs><filter id="text-shadow-0""#));
        assert!(svg.contains(r#"<feDropShadow dx="1" dy="2" stdDeviation="2" flood-color="red"/>"#));
        assert_eq!(svg.matches("<path").count(), 2);
    }
}
