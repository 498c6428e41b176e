// analysis/wire.rs
//! Raw backend response shapes and their normalization.
//!
//! The backend (and older revisions of it) is loose about field names, so the
//! raw types accept every variant seen in the wild and each `normalize`
//! function turns them into the one canonical type from `types.rs`.

use serde::Deserialize;

use super::types::{
    ChatReply, ErrorCategory, Lemmas, Sentiment, SentimentLabel, Span, SpellError, Suggestion,
    Translation, WordCheck,
};
use crate::lang::words;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawSpellCheck {
    List(Vec<RawSpellError>),
    Wrapped {
        #[serde(default, alias = "corrections")]
        errors: Vec<RawSpellError>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawPosition {
    Offset(usize),
    Range { start: usize, end: Option<usize> },
}

#[derive(Debug, Deserialize)]
pub struct RawSpellError {
    pub word: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
    pub position: Option<RawPosition>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Normalize spell-check output against the text that was sent.
///
/// Positions are made half-open, entries that do not point inside `text` are
/// dropped, and `word` takes the casing it actually has in the text (the
/// backend lowercases before matching).
pub fn normalize_spell_errors(text: &str, raw: RawSpellCheck) -> Vec<SpellError> {
    let entries = match raw {
        RawSpellCheck::List(entries) | RawSpellCheck::Wrapped { errors: entries } => entries,
    };
    let text_len = words::char_len(text);

    let mut errors: Vec<SpellError> = entries
        .into_iter()
        .filter_map(|entry| {
            let word_len = words::char_len(&entry.word);
            let position = match entry.position? {
                RawPosition::Offset(start) => Span::new(start, start.checked_add(word_len)?),
                RawPosition::Range {
                    start,
                    end: Some(end),
                } => Span::new(start, end),
                RawPosition::Range { start, end: None } => {
                    Span::new(start, start.checked_add(word_len)?)
                }
            };
            if position.is_empty() || position.end > text_len {
                return None;
            }

            let found = words::slice(text, position.start, position.end);
            let word = if found.to_lowercase() == entry.word.to_lowercase() {
                found.to_string()
            } else {
                entry.word
            };

            let mut suggestions = entry.suggestions;
            if let Some(single) = entry.suggestion.map(clean_suggestion) {
                if !single.is_empty() && !suggestions.contains(&single) {
                    suggestions.push(single);
                }
            }

            Some(SpellError {
                word,
                suggestions,
                position,
                confidence: entry.confidence,
                category: entry
                    .category
                    .as_deref()
                    .map(ErrorCategory::parse)
                    .unwrap_or_default(),
                message: entry.message,
            })
        })
        .collect();

    errors.sort_by_key(|error| (error.position.start, error.position.end));
    errors.dedup_by(|a, b| a.position == b.position);
    errors
}

/// The single-word endpoint sometimes leaks quoting into its suggestion.
fn clean_suggestion(raw: String) -> String {
    raw.chars().filter(|c| !matches!(c, '"' | ',')).collect::<String>().trim().to_string()
}

#[derive(Debug, Deserialize)]
pub struct RawWordCheck {
    #[serde(default)]
    pub word: Option<String>,
    pub correct: bool,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

pub fn normalize_word_check(word: &str, raw: RawWordCheck) -> WordCheck {
    let mut suggestions = raw.suggestions;
    if let Some(single) = raw.suggestion.map(clean_suggestion) {
        if !single.is_empty() && !suggestions.contains(&single) {
            suggestions.insert(0, single);
        }
    }
    WordCheck {
        word: raw.word.unwrap_or_else(|| word.to_string()),
        correct: raw.correct,
        suggestions,
        confidence: raw.confidence,
    }
}

#[derive(Debug, Deserialize)]
pub struct RawSuggestions {
    #[serde(default)]
    pub suggestions: Vec<RawSuggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawSuggestion {
    Plain(String),
    Scored {
        #[serde(alias = "word")]
        text: String,
        #[serde(default)]
        score: f32,
        #[serde(default)]
        context: Option<String>,
    },
}

/// Suggestions ranked by descending score; plain strings keep backend order.
pub fn normalize_suggestions(raw: RawSuggestions) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = raw
        .suggestions
        .into_iter()
        .map(|suggestion| match suggestion {
            RawSuggestion::Plain(text) => Suggestion {
                text,
                score: 0.0,
                context: None,
            },
            RawSuggestion::Scored {
                text,
                score,
                context,
            } => Suggestion {
                text,
                score,
                context,
            },
        })
        .filter(|suggestion| !suggestion.text.is_empty())
        .collect();
    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
    suggestions
}

#[derive(Debug, Deserialize)]
pub struct RawSentiment {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub polarity: Option<f32>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

pub fn normalize_sentiment(raw: RawSentiment) -> Sentiment {
    let score = raw.score.or(raw.polarity).unwrap_or(0.0);
    let score = if score.is_finite() { score.clamp(-1.0, 1.0) } else { 0.0 };

    let named = raw
        .label
        .as_deref()
        .or(raw.sentiment.as_deref())
        .and_then(SentimentLabel::parse);
    let label = SentimentLabel::from_score(score)
        .or(named)
        .unwrap_or_default();

    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .map_or_else(|| (score.abs() + 0.5).min(1.0), |c| c.clamp(0.0, 1.0));

    Sentiment {
        label,
        confidence,
        score,
    }
}

#[derive(Debug, Deserialize)]
pub struct RawTranslation {
    #[serde(
        default,
        alias = "translatedText",
        alias = "translation",
        alias = "translated"
    )]
    pub translated_text: Option<String>,
    #[serde(default, alias = "detectedLanguage")]
    pub detected_language: Option<String>,
}

/// An empty or missing translation counts as unavailable and echoes the source.
pub fn normalize_translation(
    text: &str,
    source_lang: Option<&str>,
    target_lang: &str,
    raw: RawTranslation,
) -> Translation {
    let mut translation = Translation::echo(text, source_lang, target_lang);
    if let Some(translated) = raw.translated_text.filter(|t| !words::trim(t).is_empty()) {
        translation.translated_text = translated;
    }
    translation.detected_language = raw.detected_language;
    translation
}

#[derive(Debug, Deserialize)]
pub struct RawLemmas {
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub lemmas: Vec<String>,
}

/// Align tokens and lemmas; missing tokens are recovered from the text.
pub fn normalize_lemmas(text: &str, raw: RawLemmas) -> Lemmas {
    let mut tokens = raw.tokens;
    if tokens.is_empty() && !raw.lemmas.is_empty() {
        tokens = text
            .split(words::is_space)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
    }
    let mut lemmas = raw.lemmas;
    let len = tokens.len().min(lemmas.len());
    tokens.truncate(len);
    lemmas.truncate(len);
    Lemmas { tokens, lemmas }
}

#[derive(Debug, Deserialize)]
pub struct RawChat {
    #[serde(default, alias = "response", alias = "answer")]
    pub reply: Option<String>,
}

pub fn normalize_chat(raw: RawChat) -> ChatReply {
    ChatReply {
        reply: raw.reply.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn spell_check_backend_shape() {
        // Offsets are a bare start and words come back lowercased.
        let text = "Manao ahona Rakoto";
        let raw = parse(json!({
            "original": text,
            "corrections": [
                { "word": "ahona", "suggestions": ["ahoana"], "position": 6 },
                { "word": "rakoto", "suggestions": [], "position": 12 }
            ],
            "error_count": 2
        }));
        let errors = normalize_spell_errors(text, raw);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].position, Span::new(6, 11));
        assert_eq!(errors[0].suggestions, vec!["ahoana".to_string()]);
        assert_eq!(errors[1].word, "Rakoto");
        assert_eq!(errors[1].category, ErrorCategory::Spelling);
    }

    #[test]
    fn offsets_past_the_end_are_dropped() {
        let text = "teny diso";
        let raw = parse(json!([
            { "word": "diso", "position": usize::MAX },
            { "word": "diso", "position": { "start": usize::MAX } },
            { "word": "teny", "position": 40 },
            { "word": "diso", "position": 5 }
        ]));
        let errors = normalize_spell_errors(text, raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position, Span::new(5, 9));
    }

    #[test]
    fn spell_check_list_shape() {
        let text = "Tsy misy olona";
        let raw = parse(json!([
            {
                "word": "olona",
                "type": "grammar",
                "suggestion": "\"olon'ny\",",
                "position": { "start": 9, "end": 14 },
                "confidence": 0.4,
                "message": "\"olona\" semble incorrect"
            },
            { "word": "lavitra", "position": { "start": 20, "end": 27 } },
            { "word": "tsy", "position": { "start": 3, "end": 3 } },
            { "word": "misy" }
        ]));
        let errors = normalize_spell_errors(text, raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, ErrorCategory::Grammar);
        assert_eq!(errors[0].suggestions, vec!["olon'ny".to_string()]);
        assert_eq!(errors[0].confidence, Some(0.4));
    }

    #[test]
    fn word_check() {
        let raw = parse(json!({ "word": "ahona", "correct": false, "suggestion": "ahoana,", "confidence": 0.8 }));
        let check = normalize_word_check("ahona", raw);
        assert!(!check.correct);
        assert_eq!(check.suggestions, vec!["ahoana".to_string()]);
    }

    #[test]
    fn suggestions_accept_words_and_strings() {
        let scored = normalize_suggestions(parse(json!({
            "suggestions": [{ "word": "ahoana", "score": 0.2 }, { "text": "aho", "score": 0.9 }]
        })));
        assert_eq!(scored[0].text, "aho");
        assert_eq!(scored[1].text, "ahoana");

        let plain = normalize_suggestions(parse(json!({ "suggestions": ["tsara", ""] })));
        assert_eq!(plain.len(), 1);
        assert!(normalize_suggestions(parse(json!({ "prefix": "x" }))).is_empty());
    }

    #[test]
    fn sentiment_score_overrides_label() {
        let sentiment = normalize_sentiment(parse(json!({ "sentiment": "Négatif", "score": 0.8 })));
        assert_eq!(sentiment.label, SentimentLabel::VeryPositive);
        assert!((sentiment.confidence - 1.0).abs() < f32::EPSILON);

        let sentiment = normalize_sentiment(parse(json!({ "sentiment": "Positif", "score": 0.0 })));
        assert_eq!(sentiment.label, SentimentLabel::Positive);
        assert!((sentiment.confidence - 0.5).abs() < f32::EPSILON);

        let sentiment = normalize_sentiment(parse(json!({ "polarity": -3.0, "text": "x" })));
        assert_eq!(sentiment.label, SentimentLabel::VeryNegative);
        assert_eq!(sentiment.score, -1.0);
    }

    #[test]
    fn translation_field_variants() {
        for body in [
            json!({ "translatedText": "Bonjour" }),
            json!({ "translated_text": "Bonjour" }),
            json!({ "translation": "Bonjour" }),
            json!({ "translated": "Bonjour" }),
        ] {
            let t = normalize_translation("Salama", None, "fr", parse(body));
            assert_eq!(t.translated_text, "Bonjour");
        }

        let empty = normalize_translation("Salama", Some("mg"), "fr", parse(json!({ "translated": "" })));
        assert_eq!(empty.translated_text, "Salama");
        assert_eq!(empty.source_lang.as_deref(), Some("mg"));
    }

    #[test]
    fn lemmas_are_aligned() {
        let lemmas = normalize_lemmas(
            "Nandeha izy ireo",
            parse(json!({ "lemmas": ["mandeha", "izy"] })),
        );
        assert_eq!(lemmas.tokens, vec!["Nandeha".to_string(), "izy".to_string()]);
        assert_eq!(lemmas.lemmas.len(), 2);
    }

    #[test]
    fn chat_reply_aliases() {
        assert_eq!(normalize_chat(parse(json!({ "response": "Salama!" }))).reply, "Salama!");
        assert_eq!(normalize_chat(parse(json!({ "message": "hi" }))).reply, "");
    }
}
