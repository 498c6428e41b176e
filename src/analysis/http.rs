// analysis/http.rs - HTTP client for the analysis backend
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::client::AnalysisClient;
use super::error::AnalysisError;
use super::types::{ChatReply, Lemmas, Sentiment, SpellError, Suggestion, Translation, WordCheck};
use super::wire::{self, RawChat, RawLemmas, RawSentiment, RawSpellCheck, RawSuggestions, RawTranslation, RawWordCheck};
use crate::config::{AnalysisConfig, Endpoints};
use crate::lang::words;

/// Talks JSON to the analysis backend and normalizes whatever comes back.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: Client,
    base_url: String,
    endpoints: Endpoints,
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "error")]
    message: Option<String>,
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    text: &'a str,
    source_lang: Option<&'a str>,
    target_lang: &'a str,
}

impl HttpAnalysisClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, AnalysisError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, AnalysisError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "analysis backend response");

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| AnalysisError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn spell_check(&self, text: &str, language: &str) -> Result<Vec<SpellError>, AnalysisError> {
        let raw: RawSpellCheck = self
            .post(
                &self.endpoints.spell_check,
                &json!({ "text": text, "language": language }),
            )
            .await?;
        Ok(wire::normalize_spell_errors(text, raw))
    }

    async fn check_word(&self, word: &str) -> Result<WordCheck, AnalysisError> {
        let request = self
            .http
            .get(self.url(&self.endpoints.check_word))
            .query(&[("word", word)]);
        let raw: RawWordCheck = self.send(request).await?;
        Ok(wire::normalize_word_check(word, raw))
    }

    async fn autocomplete(&self, text: &str, cursor: usize) -> Result<Vec<Suggestion>, AnalysisError> {
        let before_cursor = words::slice(text, 0, cursor);
        let prefix = words::current_word(text, cursor).word;
        let raw: RawSuggestions = self
            .post(
                &self.endpoints.autocomplete,
                &json!({ "text": before_cursor, "prefix": prefix, "cursor": cursor }),
            )
            .await?;
        Ok(wire::normalize_suggestions(raw))
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, AnalysisError> {
        let raw: RawSentiment = self
            .post(&self.endpoints.sentiment, &json!({ "text": text }))
            .await?;
        Ok(wire::normalize_sentiment(raw))
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<Translation, AnalysisError> {
        let body = TranslateBody {
            text,
            source_lang,
            target_lang,
        };
        let raw: RawTranslation = self.post(&self.endpoints.translate, &body).await?;
        Ok(wire::normalize_translation(text, source_lang, target_lang, raw))
    }

    async fn lemmatize(&self, text: &str, language: &str) -> Result<Lemmas, AnalysisError> {
        let raw: RawLemmas = self
            .post(
                &self.endpoints.lemmatize,
                &json!({ "text": text, "language": language }),
            )
            .await?;
        Ok(wire::normalize_lemmas(text, raw))
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, AnalysisError> {
        let raw: RawChat = self
            .post(&self.endpoints.chat, &json!({ "message": message }))
            .await?;
        Ok(wire::normalize_chat(raw))
    }
}
