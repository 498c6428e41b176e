// lang/mod.rs
pub mod stats;
pub mod words;

pub use stats::{count_characters, count_paragraphs, count_sentences, count_words, reading_time, TextStats};
pub use words::{current_word, line_column, sentence_at, word_at, SentenceSpan, WordSpan};
