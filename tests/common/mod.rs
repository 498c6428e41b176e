#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use soratra::analysis::{
    AnalysisClient, AnalysisError, AnalysisKind, ChatReply, ErrorCategory, Lemmas, Sentiment,
    SentimentLabel, Span, SpellError, Suggestion, Translation, WordCheck,
};

/// In-memory backend with per-input delays and per-kind failures.
///
/// Any word containing an `x` is misspelled; the fix drops the `x`.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<(AnalysisKind, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<HashSet<AnalysisKind>>,
}

impl ScriptedClient {
    /// Answer requests for `input` only after `delay`.
    pub fn delay(&self, input: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(input.to_string(), delay);
    }

    pub fn fail(&self, kind: AnalysisKind) {
        self.failing.lock().unwrap().insert(kind);
    }

    pub fn calls(&self, kind: AnalysisKind) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, input)| input.clone())
            .collect()
    }

    async fn answer(&self, kind: AnalysisKind, input: &str) -> Result<(), AnalysisError> {
        self.calls.lock().unwrap().push((kind, input.to_string()));
        let delay = self.delays.lock().unwrap().get(input).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&kind) {
            return Err(AnalysisError::Status {
                status: 503,
                message: "backend overloaded".into(),
            });
        }
        Ok(())
    }
}

pub fn misspellings(text: &str) -> Vec<SpellError> {
    let mut errors = Vec::new();
    let mut start = None;
    let chars: Vec<char> = text.chars().collect();
    for (index, c) in chars.iter().chain(std::iter::once(&' ')).enumerate() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(index),
            (true, Some(from)) => {
                let word: String = chars[from..index].iter().collect();
                if word.contains('x') {
                    errors.push(SpellError {
                        suggestions: vec![word.replace('x', "")],
                        word,
                        position: Span::new(from, index),
                        confidence: Some(0.9),
                        category: ErrorCategory::Spelling,
                        message: None,
                    });
                }
                start = None;
            }
            _ => {}
        }
    }
    errors
}

#[async_trait]
impl AnalysisClient for ScriptedClient {
    async fn spell_check(&self, text: &str, _language: &str) -> Result<Vec<SpellError>, AnalysisError> {
        self.answer(AnalysisKind::SpellCheck, text).await?;
        Ok(misspellings(text))
    }

    async fn check_word(&self, word: &str) -> Result<WordCheck, AnalysisError> {
        self.answer(AnalysisKind::WordCheck, word).await?;
        Ok(WordCheck {
            word: word.to_string(),
            correct: !word.contains('x'),
            suggestions: Vec::new(),
            confidence: Some(0.8),
        })
    }

    async fn autocomplete(&self, text: &str, cursor: usize) -> Result<Vec<Suggestion>, AnalysisError> {
        self.answer(AnalysisKind::Autocomplete, text).await?;
        let prefix = soratra::lang::current_word(text, cursor).word;
        Ok(["ana", "o"]
            .into_iter()
            .map(|ending| Suggestion {
                text: format!("{prefix}{ending}"),
                score: 0.5,
                context: None,
            })
            .collect())
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, AnalysisError> {
        self.answer(AnalysisKind::Sentiment, text).await?;
        let positive = text.to_lowercase().contains("tsara");
        Ok(Sentiment {
            label: if positive {
                SentimentLabel::VeryPositive
            } else {
                SentimentLabel::Negative
            },
            confidence: 0.9,
            score: if positive { 0.6 } else { -0.3 },
        })
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<Translation, AnalysisError> {
        self.answer(AnalysisKind::Translation, text).await?;
        Ok(Translation {
            source_text: text.to_string(),
            translated_text: format!("[{target_lang}] {text}"),
            source_lang: source_lang.map(str::to_string),
            target_lang: target_lang.to_string(),
            detected_language: Some("mg".into()),
        })
    }

    async fn lemmatize(&self, text: &str, _language: &str) -> Result<Lemmas, AnalysisError> {
        self.answer(AnalysisKind::Lemmatization, text).await?;
        let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let lemmas = tokens.iter().map(|token| token.to_lowercase()).collect();
        Ok(Lemmas { tokens, lemmas })
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, AnalysisError> {
        self.answer(AnalysisKind::Chat, message).await?;
        Ok(ChatReply {
            reply: format!("valiny: {message}"),
        })
    }
}
