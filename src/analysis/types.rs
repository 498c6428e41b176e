// analysis/types.rs
//! Canonical result types, one per analysis kind.
//!
//! Backend responses are normalized into these at the client boundary (see
//! `wire.rs`); nothing past the client ever looks at raw response shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lang::words;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    SpellCheck,
    WordCheck,
    Autocomplete,
    Sentiment,
    Translation,
    Lemmatization,
    Chat,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 7] = [
        AnalysisKind::SpellCheck,
        AnalysisKind::WordCheck,
        AnalysisKind::Autocomplete,
        AnalysisKind::Sentiment,
        AnalysisKind::Translation,
        AnalysisKind::Lemmatization,
        AnalysisKind::Chat,
    ];

    /// Whether only the most recently issued request of this kind counts.
    ///
    /// Chat replies answer distinct messages, so every one of them is kept.
    pub fn latest_only(self) -> bool {
        !matches!(self, AnalysisKind::Chat)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::SpellCheck => "spell_check",
            AnalysisKind::WordCheck => "word_check",
            AnalysisKind::Autocomplete => "autocomplete",
            AnalysisKind::Sentiment => "sentiment",
            AnalysisKind::Translation => "translation",
            AnalysisKind::Lemmatization => "lemmatization",
            AnalysisKind::Chat => "chat",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open character range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Move the span by `delta` characters.
    pub fn shifted(&self, delta: isize) -> Span {
        Span {
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    #[default]
    Spelling,
    Grammar,
    Style,
    Punctuation,
}

impl ErrorCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "grammar" => ErrorCategory::Grammar,
            "style" => ErrorCategory::Style,
            "punctuation" => ErrorCategory::Punctuation,
            _ => ErrorCategory::Spelling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellError {
    pub word: String,
    pub suggestions: Vec<String>,
    pub position: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub category: ErrorCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    VeryNegative,
    Negative,
    #[default]
    Neutral,
    Positive,
    VeryPositive,
}

impl SentimentLabel {
    /// Label implied by a score in `[-1, 1]`, or `None` for exactly zero.
    pub fn from_score(score: f32) -> Option<Self> {
        if score > 0.5 {
            Some(SentimentLabel::VeryPositive)
        } else if score > 0.0 {
            Some(SentimentLabel::Positive)
        } else if score < -0.5 {
            Some(SentimentLabel::VeryNegative)
        } else if score < 0.0 {
            Some(SentimentLabel::Negative)
        } else {
            None
        }
    }

    /// Accepts both the English identifiers and the French display labels
    /// the backend sends.
    pub fn parse(raw: &str) -> Option<Self> {
        let label = match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "very_positive" | "très_positif" => SentimentLabel::VeryPositive,
            "positive" | "positif" => SentimentLabel::Positive,
            "neutral" | "neutre" => SentimentLabel::Neutral,
            "negative" | "négatif" => SentimentLabel::Negative,
            "very_negative" | "très_négatif" => SentimentLabel::VeryNegative,
            _ => return None,
        };
        Some(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub confidence: f32,
    pub score: f32,
}

impl Sentiment {
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence: 0.5,
            score: 0.0,
        }
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::neutral()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCheck {
    pub word: String,
    pub correct: bool,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl WordCheck {
    /// A word we could not check is reported as correct so nothing gets flagged.
    pub fn assume_correct(word: &str) -> Self {
        Self {
            word: word.to_string(),
            correct: true,
            suggestions: Vec::new(),
            confidence: Some(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub source_text: String,
    pub translated_text: String,
    #[serde(default)]
    pub source_lang: Option<String>,
    pub target_lang: String,
    #[serde(default)]
    pub detected_language: Option<String>,
}

impl Translation {
    /// The source text echoed back, used whenever no translation is available.
    pub fn echo(text: &str, source_lang: Option<&str>, target_lang: &str) -> Self {
        Self {
            source_text: text.to_string(),
            translated_text: text.to_string(),
            source_lang: source_lang.map(str::to_string),
            target_lang: target_lang.to_string(),
            detected_language: None,
        }
    }
}

/// Tokens and their lemmas, aligned by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemmas {
    pub tokens: Vec<String>,
    pub lemmas: Vec<String>,
}

impl Lemmas {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Lemma of `word` (case-insensitive), or `word` itself when unknown.
    pub fn lemma_for<'a>(&'a self, word: &'a str) -> &'a str {
        let needle = word.to_lowercase();
        self.tokens
            .iter()
            .position(|token| token.to_lowercase() == needle)
            .and_then(|index| self.lemmas.get(index))
            .map_or(word, String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum AnalysisResult {
    SpellCheck(Vec<SpellError>),
    WordCheck(WordCheck),
    Autocomplete(Vec<Suggestion>),
    Sentiment(Sentiment),
    Translation(Translation),
    Lemmatization(Lemmas),
    Chat(ChatReply),
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::SpellCheck(_) => AnalysisKind::SpellCheck,
            AnalysisResult::WordCheck(_) => AnalysisKind::WordCheck,
            AnalysisResult::Autocomplete(_) => AnalysisKind::Autocomplete,
            AnalysisResult::Sentiment(_) => AnalysisKind::Sentiment,
            AnalysisResult::Translation(_) => AnalysisKind::Translation,
            AnalysisResult::Lemmatization(_) => AnalysisKind::Lemmatization,
            AnalysisResult::Chat(_) => AnalysisKind::Chat,
        }
    }
}

/// Minimum input sizes below which a request is answered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    pub min_spell_check_chars: usize,
    pub min_word_chars: usize,
    pub min_sentiment_chars: usize,
    pub min_lemmatize_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            min_spell_check_chars: 2,
            min_word_chars: 2,
            min_sentiment_chars: 5,
            min_lemmatize_chars: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    SpellCheck { text: String, language: String },
    WordCheck { word: String },
    Autocomplete { text: String, cursor: usize },
    Sentiment { text: String },
    Translation { text: String, source_lang: Option<String>, target_lang: String },
    Lemmatization { text: String, language: String },
    Chat { message: String },
}

impl AnalysisRequest {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisRequest::SpellCheck { .. } => AnalysisKind::SpellCheck,
            AnalysisRequest::WordCheck { .. } => AnalysisKind::WordCheck,
            AnalysisRequest::Autocomplete { .. } => AnalysisKind::Autocomplete,
            AnalysisRequest::Sentiment { .. } => AnalysisKind::Sentiment,
            AnalysisRequest::Translation { .. } => AnalysisKind::Translation,
            AnalysisRequest::Lemmatization { .. } => AnalysisKind::Lemmatization,
            AnalysisRequest::Chat { .. } => AnalysisKind::Chat,
        }
    }

    /// Safe default used when the backend call fails or times out.
    pub fn fallback(&self) -> AnalysisResult {
        match self {
            AnalysisRequest::SpellCheck { .. } => AnalysisResult::SpellCheck(Vec::new()),
            AnalysisRequest::WordCheck { word } => {
                AnalysisResult::WordCheck(WordCheck::assume_correct(word))
            }
            AnalysisRequest::Autocomplete { .. } => AnalysisResult::Autocomplete(Vec::new()),
            AnalysisRequest::Sentiment { .. } => AnalysisResult::Sentiment(Sentiment::neutral()),
            AnalysisRequest::Translation {
                text,
                source_lang,
                target_lang,
            } => AnalysisResult::Translation(Translation::echo(
                text,
                source_lang.as_deref(),
                target_lang,
            )),
            AnalysisRequest::Lemmatization { .. } => {
                AnalysisResult::Lemmatization(Lemmas::default())
            }
            AnalysisRequest::Chat { .. } => AnalysisResult::Chat(ChatReply::default()),
        }
    }

    /// Answer locally when the input is too small to be worth a network call.
    pub fn short_circuit(&self, limits: &InputLimits) -> Option<AnalysisResult> {
        let too_short = match self {
            AnalysisRequest::SpellCheck { text, .. } => {
                words::char_len(words::trim(text)) < limits.min_spell_check_chars
            }
            AnalysisRequest::WordCheck { word } => {
                words::char_len(words::trim(word)) < limits.min_word_chars
            }
            AnalysisRequest::Autocomplete { text, cursor } => {
                *cursor < 1
                    || words::char_len(&words::current_word(text, *cursor).word)
                        < limits.min_word_chars
            }
            AnalysisRequest::Sentiment { text } => {
                words::char_len(text) < limits.min_sentiment_chars
            }
            AnalysisRequest::Translation { text, .. } => words::trim(text).is_empty(),
            AnalysisRequest::Lemmatization { text, .. } => {
                words::char_len(words::trim(text)) < limits.min_lemmatize_chars
            }
            AnalysisRequest::Chat { message } => words::trim(message).is_empty(),
        };
        too_short.then(|| self.fallback())
    }
}

/// Identifies one issued request: its kind and its per-kind sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ticket {
    pub kind: AnalysisKind,
    pub seq: u64,
}

/// A resolved request, tagged with the ticket it was issued under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub ticket: Ticket,
    pub result: AnalysisResult,
    /// Set when `result` is a fallback standing in for a failed call.
    pub failure: Option<String>,
}

impl AnalysisOutcome {
    pub fn resolved(ticket: Ticket, result: AnalysisResult) -> Self {
        Self {
            ticket,
            result,
            failure: None,
        }
    }

    pub fn failed(ticket: Ticket, request: &AnalysisRequest, reason: impl Into<String>) -> Self {
        Self {
            ticket,
            result: request.fallback(),
            failure: Some(reason.into()),
        }
    }
}
