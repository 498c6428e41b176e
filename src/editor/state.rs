// editor/state.rs
//! The snapshot of one editing session, as handed to subscribers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::panels::PanelState;
use crate::analysis::{
    AnalysisKind, Lemmas, Sentiment, SpellError, Suggestion, Translation, WordCheck,
};
use crate::config::EditorConfig;
use crate::lang::{words, TextStats};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Authoritative text; every analysis runs on this.
    pub plain_text: String,
    /// Whatever the widget round-trips (HTML or a serialized delta).
    pub rich_content: String,
}

/// Cursor or selected range, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub range_start: usize,
    pub range_length: usize,
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            range_start: 0,
            range_length: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Selection {
    /// Selection of `text` clamped to its length, with line and column derived.
    pub fn within(text: &str, range_start: usize, range_length: usize) -> Self {
        let len = words::char_len(text);
        let range_start = range_start.min(len);
        let range_length = range_length.min(len - range_start);
        let (line, column) = words::line_column(text, range_start);
        Self {
            range_start,
            range_length,
            line,
            column,
        }
    }

    pub fn end(&self) -> usize {
        self.range_start + self.range_length
    }

    pub fn is_collapsed(&self) -> bool {
        self.range_length == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// A non-fatal problem worth showing to the user, e.g. an unreachable backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnalysisKind>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub language: String,
    /// Spell-check on its own after every edit.
    pub auto_correct: bool,
    /// Offer autocomplete suggestions while typing.
    pub show_suggestions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorState {
    pub document: Document,
    pub selection: Selection,
    pub stats: TextStats,
    pub spell_errors: Vec<SpellError>,
    /// Grammar, style and punctuation findings.
    pub grammar_errors: Vec<SpellError>,
    pub suggestions: Vec<Suggestion>,
    pub selected_suggestion: Option<usize>,
    pub sentiment: Sentiment,
    pub word_check: Option<WordCheck>,
    pub translation: Option<Translation>,
    /// Newest first.
    pub translation_history: Vec<Translation>,
    pub lemmas: Lemmas,
    pub chat: Vec<ChatMessage>,
    pub panels: PanelState,
    pub settings: Settings,
    /// Kinds with a request in flight or waiting out its debounce.
    pub loading: BTreeSet<AnalysisKind>,
    /// Lowercased.
    pub ignored_words: BTreeSet<String>,
    pub notifications: Vec<Notification>,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl EditorState {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            document: Document::default(),
            selection: Selection::default(),
            stats: TextStats::default(),
            spell_errors: Vec::new(),
            grammar_errors: Vec::new(),
            suggestions: Vec::new(),
            selected_suggestion: None,
            sentiment: Sentiment::neutral(),
            word_check: None,
            translation: None,
            translation_history: Vec::new(),
            lemmas: Lemmas::default(),
            chat: Vec::new(),
            panels: PanelState::default(),
            settings: Settings {
                language: config.language.clone(),
                auto_correct: config.auto_spell_check,
                show_suggestions: true,
            },
            loading: BTreeSet::new(),
            ignored_words: BTreeSet::new(),
            notifications: Vec::new(),
            can_undo: false,
            can_redo: false,
        }
    }

    pub fn is_loading(&self, kind: AnalysisKind) -> bool {
        self.loading.contains(&kind)
    }

    pub fn selected_text(&self) -> &str {
        words::slice(
            &self.document.plain_text,
            self.selection.range_start,
            self.selection.end(),
        )
    }

    pub fn is_ignored(&self, word: &str) -> bool {
        self.ignored_words.contains(&word.to_lowercase())
    }
}
