// lang/words.rs
//! Character-offset helpers shared by the statistics counters and the editor.
//!
//! Every offset in this module is a character index (Unicode scalar values),
//! which is also what the analysis backend reports.

use serde::{Deserialize, Serialize};

/// Whitespace as matched by the ECMAScript `\s` class.
///
/// Differs from [`char::is_whitespace`] on U+0085 (not matched) and U+FEFF
/// (matched), so that word counts agree with the browser widget.
pub fn is_space(c: char) -> bool {
    match c {
        '\u{85}' => false,
        '\u{feff}' => true,
        c => c.is_whitespace(),
    }
}

/// Trim using the same whitespace definition as [`is_space`].
pub fn trim(text: &str) -> &str {
    text.trim_matches(is_space)
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the character at `index`, clamped to the end of `text`.
pub fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map_or(text.len(), |(offset, _)| offset)
}

/// The characters in `[start, end)`, clamped to the text.
pub fn slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    &text[from..to]
}

/// Replace the characters in `[start, end)` with `replacement`.
pub fn replace_range(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    let mut out = String::with_capacity(text.len() - (to - from) + replacement.len());
    out.push_str(&text[..from]);
    out.push_str(replacement);
    out.push_str(&text[to..]);
    out
}

/// 1-based `(line, column)` of the character at `index`.
pub fn line_column(text: &str, index: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for c in text.chars().take(index) {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub word: String,
    pub start: usize,
    pub end: usize,
}

/// The whitespace-delimited word touching `index`, if any.
///
/// Scans backward while the preceding character is not whitespace, then
/// forward likewise. Returns `None` when `index` sits between two spaces.
pub fn word_at(text: &str, index: usize) -> Option<WordSpan> {
    let chars: Vec<char> = text.chars().collect();
    if index > chars.len() {
        return None;
    }

    let mut start = index;
    while start > 0 && !is_space(chars[start - 1]) {
        start -= 1;
    }
    let mut end = index;
    while end < chars.len() && !is_space(chars[end]) {
        end += 1;
    }

    if start == end {
        return None;
    }
    Some(WordSpan {
        word: chars[start..end].iter().collect(),
        start,
        end,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub sentence: String,
    pub start: usize,
    pub end: usize,
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// The sentence containing `index`, including its terminator when present.
pub fn sentence_at(text: &str, index: usize) -> Option<SentenceSpan> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return None;
    }
    let index = index.min(chars.len());

    let mut start = index;
    while start > 0 && !is_sentence_end(chars[start - 1]) {
        start -= 1;
    }
    let mut end = index;
    while end < chars.len() && !is_sentence_end(chars[end]) {
        end += 1;
    }
    if end < chars.len() {
        end += 1;
    }

    let sentence: String = chars[start..end].iter().collect();
    Some(SentenceSpan {
        sentence: trim(&sentence).to_string(),
        start,
        end,
    })
}

/// The (possibly partial) word immediately before `cursor`.
///
/// Empty when the cursor follows whitespace.
pub fn current_word(text: &str, cursor: usize) -> WordSpan {
    let chars: Vec<char> = text.chars().collect();
    let end = cursor.min(chars.len());
    let mut start = end;
    while start > 0 && !is_space(chars[start - 1]) {
        start -= 1;
    }
    WordSpan {
        word: chars[start..end].iter().collect(),
        start,
        end,
    }
}

/// Shorten `text` to at most `max` characters, ending with `suffix` when cut.
pub fn truncate(text: &str, max: usize, suffix: &str) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(char_len(suffix));
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_whitespace_class() {
        assert!(is_space(' '));
        assert!(is_space('\u{a0}'));
        assert!(is_space('\u{feff}'));
        assert!(!is_space('\u{85}'));
        assert!(!is_space('ô'));
    }

    #[test]
    fn offsets_are_characters_not_bytes() {
        let text = "Tongasoa ô namana";
        assert_eq!(slice(text, 9, 10), "ô");
        assert_eq!(slice(text, 11, 17), "namana");
        assert_eq!(replace_range(text, 9, 10, "ry"), "Tongasoa ry namana");
        assert_eq!(byte_offset(text, 100), text.len());
    }

    #[test]
    fn line_and_column() {
        let text = "voalohany\nfaharoa\n\nfahefatra";
        assert_eq!(line_column(text, 0), (1, 1));
        assert_eq!(line_column(text, 4), (1, 5));
        assert_eq!(line_column(text, 10), (2, 1));
        assert_eq!(line_column(text, 13), (2, 4));
        assert_eq!(line_column(text, 19), (4, 1));
    }

    #[test]
    fn word_under_cursor() {
        let text = "Izao no teny diso";
        let word = word_at(text, 9).unwrap();
        assert_eq!(word.word, "teny");
        assert_eq!((word.start, word.end), (8, 12));

        // Cursor right after a word still belongs to it.
        assert_eq!(word_at(text, 4).unwrap().word, "Izao");
        assert_eq!(word_at("a  b", 2), None);
        assert_eq!(word_at(text, 99), None);
    }

    #[test]
    fn word_keeps_punctuation_like_the_counter() {
        let word = word_at("Salama, tompoko!", 3).unwrap();
        assert_eq!(word.word, "Salama,");
    }

    #[test]
    fn sentence_under_cursor() {
        let text = "Manao ahoana? Tsara aho.";
        let first = sentence_at(text, 2).unwrap();
        assert_eq!(first.sentence, "Manao ahoana?");
        assert_eq!((first.start, first.end), (0, 13));

        let second = sentence_at(text, 16).unwrap();
        assert_eq!(second.sentence, "Tsara aho.");
        assert_eq!(second.end, 24);
    }

    #[test]
    fn partial_word_before_cursor() {
        let text = "Misaotra bet";
        assert_eq!(current_word(text, 12).word, "bet");
        assert_eq!(current_word(text, 12).start, 9);
        assert_eq!(current_word("Misaotra ", 9).word, "");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("fohy", 10, "..."), "fohy");
        assert_eq!(truncate("lava be dia be", 10, "..."), "lava be...");
    }
}
