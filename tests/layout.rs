// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Layout through the public measure / render handshake

use text_flow::bidi::base_level;
use text_flow::flow::{LineFlow, EPSILON};
use text_flow::fonts::MonoEngine;
use text_flow::words::preprocess;
use text_flow::*;

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do \
    eiusmod tempor incididunt ut labore et dolore magna aliqua.";

fn mono(size: f32, lh: LineHeight) -> MonoEngine {
    MonoEngine::new(size).with_line_height(lh)
}

fn prepare(text: &str, env: Environment) -> MeasuredText<fn(f32, LineHeight) -> MonoEngine> {
    let engine = MonoEngine::new(env.font_size);
    let (missing, token) = TextLayout::new(text, env).begin_measure(&engine);
    assert!(missing.is_empty());
    token
        .finish_measure(mono as fn(f32, LineHeight) -> MonoEngine)
        .unwrap()
}

fn env10() -> Environment {
    Environment {
        font_size: 10.0,
        ..Default::default()
    }
}

fn line_texts(flow: &FlowResult) -> Vec<String> {
    (0..flow.lines.len())
        .map(|i| flow.line_segments(i).iter().map(|s| s.text.as_str()).collect())
        .collect()
}

fn glyphs(output: &Output) -> Vec<(String, f32)> {
    output
        .items
        .iter()
        .filter_map(|item| match item {
            DrawItem::Glyphs { text, x, .. } => Some((text.clone(), *x)),
            _ => None,
        })
        .collect()
}

#[test]
fn ascii_single_line() {
    let env = Environment {
        align: Align::Left,
        ..env10()
    };
    let mut text = prepare("The quick brown fox", env);
    let flow = text.flow(Vec2(500.0, f32::INFINITY));
    assert_eq!(flow.lines.len(), 1);
    assert_eq!(line_texts(&flow), ["The quick brown fox"]);
    // 16 letters and 3 spaces
    assert_eq!(flow.lines[0].width, 19.0 * 5.0);

    let output = text.render(&BoxLayout {
        origin: Vec2(7.0, 0.0),
        size: Vec2(500.0, 10.0),
    });
    assert_eq!(glyphs(&output), [("The quick brown fox".to_string(), 7.0)]);
}

#[test]
fn paragraph_separator_forces_break() {
    let mut text = prepare("first\u{2029}second", env10());
    let flow = text.flow(Vec2::INFINITY);
    assert_eq!(line_texts(&flow), ["first", "second"]);
    assert!(!flow.wrapped);
    assert_eq!(text.measure(Vec2::INFINITY), Vec2(30.0, 20.0));
}

#[test]
fn forced_break_ignores_width() {
    let env = Environment {
        white_space: WhiteSpace::PreLine,
        ..env10()
    };
    let mut text = prepare("a\nb", env);
    let flow = text.flow(Vec2(1000.0, f32::INFINITY));
    assert_eq!(line_texts(&flow), ["a", "b"]);
    assert_eq!(flow.lines[1].top, 10.0);
}

#[test]
fn mixed_direction_line() {
    let mut text = prepare("abcאבג", env10());
    let flow = text.flow(Vec2::INFINITY);
    assert_eq!(flow.lines.len(), 1);
    assert_eq!(flow.segments.len(), 2);
    let k = flow.segments[0].width;
    assert_eq!(flow.segments[1].width, k);
    assert_eq!(flow.lines[0].width, 2.0 * k);
    assert_eq!(flow.segments[0].text, "abc");
    assert_eq!(flow.segments[1].text, "גבא");
    assert!(flow.segments[1].rtl);
}

#[test]
fn rtl_paragraph_starts_right() {
    let mut text = prepare("שלום עולם", env10());
    assert!(text.is_rtl());
    let output = text.render(&BoxLayout {
        origin: Vec2::ZERO,
        size: Vec2(100.0, 10.0),
    });
    let items = glyphs(&output);
    assert_eq!(items.len(), 1);
    // logical "שלום עולם" reversed for display
    assert_eq!(items[0].0, "םלוע םולש");
    assert_eq!(items[0].1, 55.0);
}

#[test]
fn line_width_bound() {
    for width in [60.0, 85.0, 120.0, 200.0, 333.0] {
        let mut text = prepare(LOREM, env10());
        let flow = text.flow(Vec2(width, f32::INFINITY));
        assert!(flow.lines.len() > 1);
        for line in &flow.lines {
            assert!(line.width <= width + EPSILON, "{} > {width}", line.width);
        }
    }
}

#[test]
fn center_alignment_shift() {
    let width = 130.0;
    let layout = BoxLayout {
        origin: Vec2::ZERO,
        size: Vec2(width, f32::INFINITY),
    };
    let left = Environment {
        align: Align::Left,
        ..env10()
    };
    let center = Environment {
        align: Align::Center,
        ..env10()
    };

    let flow = prepare(LOREM, left.clone()).flow(layout.size);
    let out_left = glyphs(&prepare(LOREM, left).render(&layout));
    let out_center = glyphs(&prepare(LOREM, center).render(&layout));
    assert_eq!(out_left.len(), flow.lines.len());
    for ((line, l), c) in flow.lines.iter().zip(&out_left).zip(&out_center) {
        assert_eq!(l.0, c.0);
        assert_eq!(c.1 - l.1, 0.5 * (width - line.width));
    }
}

#[test]
fn font_fit_monotonic() {
    let env = Environment {
        fit: TextFit::Multiline,
        ..Environment::default()
    };
    let words = preprocess(LOREM, &env);
    let base = base_level(LOREM, env.direction);
    let width = 300.0;

    let mut last = 0.0;
    for h in (2..40).map(|i| i as f32 * 10.0) {
        let mut text = prepare(LOREM, env.clone());
        let flow = text.flow(Vec2(width, h));
        let size = flow.font_size;
        assert!(size >= last, "size decreased at height {h}");
        last = size;

        if size > 10.0 {
            assert!(flow.height <= h + EPSILON);
        }
        if size < 120.0 {
            let engine = MonoEngine::new(size + 1.0);
            let mut measurer = Measurer::default();
            let larger = LineFlow::new(&env, &engine, &mut measurer, base).run(&words, width);
            assert!(larger.height > h, "size {} also fits {h}", size + 1.0);
        }
    }
}

#[test]
fn font_fit_respects_cap() {
    let env = Environment {
        fit: TextFit::Multiline,
        max_font_size: Some(40.0),
        ..Environment::default()
    };
    let mut text = prepare("Hi", env);
    assert_eq!(text.flow(Vec2(1000.0, 1000.0)).font_size, 40.0);
    // unbounded height: no search, configured size
    assert_eq!(text.flow(Vec2(1000.0, f32::INFINITY)).font_size, 16.0);
}

#[test]
fn measure_is_idempotent() {
    let mut text = prepare(LOREM, env10());
    let available = Vec2(150.0, f32::INFINITY);
    let first = text.measure(available);
    let cached = text.cached_widths();
    let second = text.measure(available);
    assert_eq!(first, second);
    assert_eq!(text.cached_widths(), cached);
    assert_eq!(first.0, 150.0);
}

#[test]
fn measured_box_reproduces_lines() {
    let env = Environment {
        letter_spacing: 0.08,
        ..env10()
    };
    let mut text = prepare("aaaaa aaaaaa", env);
    // the text is 60.96 wide: it wraps at 60.5 but not at 61
    let size = text.measure(Vec2(60.5, f32::INFINITY));
    assert_eq!(size, Vec2(60.5, 20.0));

    let flow = text.flow(size);
    assert_eq!(flow.lines.len(), 2);
    assert_eq!(flow.height, size.1);

    let output = text.render(&BoxLayout {
        origin: Vec2::ZERO,
        size,
    });
    let items = glyphs(&output);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].0, "aaaaa");
}

#[test]
fn missing_glyphs_then_resume() {
    let primary = MonoEngine::new(16.0).with_charset("Hel o".chars());
    let layout = TextLayout::new("Hello wörld", Environment::default());
    let (missing, token) = layout.begin_measure(&primary);
    assert_eq!(missing.iter().collect::<Vec<_>>(), ["w", "ö", "r", "d"]);

    // the caller loads a fallback covering everything
    let mut text = token.finish_measure(mono).unwrap();
    assert_eq!(text.measure(Vec2::INFINITY), Vec2(88.0, 16.0));
}

#[test]
fn ellipsis_output() {
    let env = Environment {
        max_lines: Some(2),
        overflow: TextOverflow::Ellipsis,
        ..env10()
    };
    let mut text = prepare(LOREM, env);
    let available = Vec2(100.0, f32::INFINITY);
    let flow = text.flow(available);
    assert_eq!(flow.lines.len(), 2);
    assert!(flow.truncated);
    let last = &line_texts(&flow)[1];
    assert!(last.ends_with('\u{2026}'), "{last}");
    assert!(flow.lines[1].width <= 100.0 + EPSILON);
    assert_eq!(text.measure(available), Vec2(100.0, 20.0));
}

#[test]
fn images_and_decorations() {
    let mut images = GraphemeImages::new();
    images.insert("🦀".to_string(), "crab.svg".to_string());
    let env = Environment {
        decoration: Decoration::UNDERLINE,
        ..env10()
    };
    let engine = MonoEngine::new(10.0);
    let (_, token) = TextLayout::new("a🦀b", env)
        .with_images(images)
        .begin_measure(&engine);
    let mut text = token.finish_measure(mono).unwrap();
    let size = text.measure(Vec2::INFINITY);
    assert_eq!(size, Vec2(20.0, 10.0));

    let output = text.render(&BoxLayout {
        origin: Vec2(0.0, 100.0),
        size,
    });
    assert_eq!(output.items.len(), 4);
    assert!(matches!(
        &output.items[1],
        DrawItem::Image { src, x, y, .. } if src == "crab.svg" && *x == 5.0 && *y == 100.0
    ));
    assert!(matches!(
        &output.items[3],
        DrawItem::Decoration { kind, x, width, .. }
            if *kind == Decoration::UNDERLINE && *x == 0.0 && *width == 20.0
    ));

    let svg = output.to_svg();
    assert_eq!(svg.matches("<path").count(), 2);
    assert!(svg.contains("<image href=\"crab.svg\""));
    assert!(svg.contains("<rect"));
}
