// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text preprocessing: transform, whitespace and word segmentation
//!
//! The output of this module is the word sequence consumed by the line flow.
//! Each [`Word`] ends at a break opportunity; a word followed by a mandatory
//! break has [`Word::hard_break`] set and does not contain the newline.

use crate::{Environment, TextTransform, WhiteSpace, WordBreak};
use unicode_segmentation::UnicodeSegmentation;
use xi_unicode::LineBreakIterator;

/// A unit of line breaking
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// A forced line break follows this word
    pub hard_break: bool,
}

impl Word {
    pub fn new(text: impl Into<String>, hard_break: bool) -> Self {
        Word {
            text: text.into(),
            hard_break,
        }
    }

    /// True for a horizontal tab, expanded to the next tab stop during flow
    #[inline]
    pub fn is_tab(&self) -> bool {
        self.text == "\t"
    }

    /// True if the word is empty or contains only whitespace
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// The word without trailing whitespace
    #[inline]
    pub fn trimmed(&self) -> &str {
        self.text.trim_end()
    }
}

/// Run the whole preprocessing pipeline
pub fn preprocess(text: &str, env: &Environment) -> Vec<Word> {
    let text = transform(text, env.transform);
    let text = collapse_white_space(&text, env.white_space);
    segment(&text, env.word_break)
}

/// Apply a `text-transform`
pub fn transform(text: &str, transform: TextTransform) -> String {
    match transform {
        TextTransform::None => text.to_string(),
        TextTransform::Uppercase => text.to_uppercase(),
        TextTransform::Lowercase => text.to_lowercase(),
        TextTransform::Capitalize => {
            let mut out = String::with_capacity(text.len());
            for word in text.split_word_bounds() {
                let mut chars = word.chars();
                match chars.next() {
                    Some(c) if c.is_alphabetic() => {
                        out.extend(c.to_uppercase());
                        out.push_str(chars.as_str());
                    }
                    _ => out.push_str(word),
                }
            }
            out
        }
    }
}

/// Normalise line endings and collapse whitespace according to `mode`
///
/// In collapsing modes, whitespace at the start and end of the text (and,
/// with [`WhiteSpace::PreLine`], around each newline) is removed.
pub fn collapse_white_space(text: &str, mode: WhiteSpace) -> String {
    let text = text.replace("\r\n", "\n");
    if !mode.collapses_spaces() {
        return text;
    }
    let keep_newlines = mode.preserves_newlines();

    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        match c {
            '\n' if keep_newlines => {
                out.push('\n');
                pending_space = false;
            }
            ' ' | '\t' | '\n' | '\r' | '\u{C}' => pending_space = true,
            c => {
                if pending_space && !out.is_empty() && !out.ends_with('\n') {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }
    out
}

/// Is `c` a mandatory line break character?
fn is_newline(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{B}' | '\u{C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split text into words at break opportunities
///
/// Tabs always form words of their own.
pub fn segment(text: &str, word_break: WordBreak) -> Vec<Word> {
    let mut words = Vec::new();
    let mut start = 0;
    for (pos, _) in LineBreakIterator::new(text) {
        let chunk = &text[start..pos];
        start = pos;
        let (body, hard) = match chunk.chars().next_back() {
            Some(c) if is_newline(c) => (&chunk[..chunk.len() - c.len_utf8()], true),
            _ => (chunk, false),
        };
        push_with_tabs(&mut words, body, hard);
    }

    match word_break {
        WordBreak::Normal | WordBreak::BreakWord => words,
        WordBreak::BreakAll => split_graphemes(words),
        WordBreak::KeepAll => merge_until_space(words),
    }
}

fn push_with_tabs(words: &mut Vec<Word>, chunk: &str, hard: bool) {
    let mut pushed_tab = false;
    let mut rest = chunk;
    while let Some(i) = rest.find('\t') {
        if i > 0 {
            words.push(Word::new(&rest[..i], false));
        }
        words.push(Word::new("\t", false));
        pushed_tab = true;
        rest = &rest[i + 1..];
    }

    if !rest.is_empty() {
        words.push(Word::new(rest, hard));
    } else if hard {
        match words.last_mut() {
            Some(last) if pushed_tab => last.hard_break = true,
            _ => words.push(Word::new("", true)),
        }
    }
}

fn split_graphemes(words: Vec<Word>) -> Vec<Word> {
    let mut out = Vec::with_capacity(words.len());
    for word in words {
        if word.is_tab() || word.text.is_empty() {
            out.push(word);
            continue;
        }
        let graphemes: Vec<&str> = word.text.graphemes(true).collect();
        let last = graphemes.len() - 1;
        for (i, g) in graphemes.into_iter().enumerate() {
            out.push(Word::new(g, i == last && word.hard_break));
        }
    }
    out
}

/// Only whitespace, tabs and forced breaks end a word
fn merge_until_space(words: Vec<Word>) -> Vec<Word> {
    let mut out: Vec<Word> = Vec::with_capacity(words.len());
    let mut open = false;
    for word in words {
        let closes = word.is_tab()
            || word.hard_break
            || word.text.ends_with(char::is_whitespace)
            || word.text.is_empty();
        match out.last_mut() {
            Some(last) if open && !word.is_tab() => {
                last.text.push_str(&word.text);
                last.hard_break = word.hard_break;
            }
            _ => out.push(word),
        }
        open = !closes;
    }
    out
}
