// lang/stats.rs
//! Document statistics.
//!
//! These are deliberately simple heuristics (whitespace tokens, runs of
//! `.!?`, blank-line paragraphs) so that counts match what the browser shows.

use serde::{Deserialize, Serialize};

use super::words::{is_space, trim};

pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    /// Minutes, rounded up.
    pub reading_time: usize,
}

impl TextStats {
    pub fn compute(text: &str, words_per_minute: usize) -> Self {
        let words = count_words(text);
        Self {
            words,
            characters: count_characters(text, true),
            characters_no_spaces: count_characters(text, false),
            sentences: count_sentences(text),
            paragraphs: count_paragraphs(text),
            reading_time: reading_time(words, words_per_minute),
        }
    }

    pub fn average_word_length(&self) -> f64 {
        if self.words == 0 {
            return 0.0;
        }
        self.characters_no_spaces as f64 / self.words as f64
    }
}

pub fn count_words(text: &str) -> usize {
    text.split(is_space).filter(|word| !word.is_empty()).count()
}

pub fn count_characters(text: &str, include_spaces: bool) -> usize {
    if include_spaces {
        text.chars().count()
    } else {
        text.chars().filter(|&c| !is_space(c)).count()
    }
}

pub fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|sentence| !trim(sentence).is_empty())
        .count()
}

/// Paragraphs are separated by two or more consecutive `\n`.
///
/// A lone `\n`, or `\r\n\r\n`, does not separate paragraphs.
pub fn count_paragraphs(text: &str) -> usize {
    let mut count = 0;
    let mut segment = String::new();
    let mut newlines = 0;

    let mut flush = |segment: &mut String| {
        if !trim(segment).is_empty() {
            count += 1;
        }
        segment.clear();
    };

    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            continue;
        }
        match newlines {
            0 => {}
            1 => segment.push('\n'),
            _ => flush(&mut segment),
        }
        newlines = 0;
        segment.push(c);
    }
    if newlines == 1 {
        segment.push('\n');
    }
    flush(&mut segment);

    count
}

/// Minutes needed to read `words`, rounded up.
pub fn reading_time(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1))
}
