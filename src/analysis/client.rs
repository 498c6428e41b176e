// analysis/client.rs
use async_trait::async_trait;

use super::error::AnalysisError;
use super::types::{
    AnalysisRequest, AnalysisResult, ChatReply, Lemmas, Sentiment, SpellError, Suggestion,
    Translation, WordCheck,
};

/// The external language-processing service, as seen by the editor.
///
/// Implementations return canonical types only; normalizing the backend's
/// response shapes is their job, not the caller's.
#[async_trait]
pub trait AnalysisClient: Send + Sync + 'static {
    async fn spell_check(&self, text: &str, language: &str) -> Result<Vec<SpellError>, AnalysisError>;

    async fn check_word(&self, word: &str) -> Result<WordCheck, AnalysisError>;

    async fn autocomplete(&self, text: &str, cursor: usize) -> Result<Vec<Suggestion>, AnalysisError>;

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, AnalysisError>;

    /// `source_lang` of `None` asks the backend to detect the language.
    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<Translation, AnalysisError>;

    async fn lemmatize(&self, text: &str, language: &str) -> Result<Lemmas, AnalysisError>;

    async fn chat(&self, message: &str) -> Result<ChatReply, AnalysisError>;
}

/// Client used when no analysis backend is configured.
///
/// Every call fails with [`AnalysisError::Disabled`], so the editor falls back
/// to its safe defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledClient;

#[async_trait]
impl AnalysisClient for DisabledClient {
    async fn spell_check(&self, _text: &str, _language: &str) -> Result<Vec<SpellError>, AnalysisError> {
        Err(AnalysisError::Disabled)
    }

    async fn check_word(&self, _word: &str) -> Result<WordCheck, AnalysisError> {
        Err(AnalysisError::Disabled)
    }

    async fn autocomplete(&self, _text: &str, _cursor: usize) -> Result<Vec<Suggestion>, AnalysisError> {
        Err(AnalysisError::Disabled)
    }

    async fn analyze_sentiment(&self, _text: &str) -> Result<Sentiment, AnalysisError> {
        Err(AnalysisError::Disabled)
    }

    async fn translate(
        &self,
        _text: &str,
        _source_lang: Option<&str>,
        _target_lang: &str,
    ) -> Result<Translation, AnalysisError> {
        Err(AnalysisError::Disabled)
    }

    async fn lemmatize(&self, _text: &str, _language: &str) -> Result<Lemmas, AnalysisError> {
        Err(AnalysisError::Disabled)
    }

    async fn chat(&self, _message: &str) -> Result<ChatReply, AnalysisError> {
        Err(AnalysisError::Disabled)
    }
}

/// Route a request to the matching client call.
pub async fn dispatch(
    client: &dyn AnalysisClient,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, AnalysisError> {
    let result = match request {
        AnalysisRequest::SpellCheck { text, language } => {
            AnalysisResult::SpellCheck(client.spell_check(text, language).await?)
        }
        AnalysisRequest::WordCheck { word } => {
            AnalysisResult::WordCheck(client.check_word(word).await?)
        }
        AnalysisRequest::Autocomplete { text, cursor } => {
            AnalysisResult::Autocomplete(client.autocomplete(text, *cursor).await?)
        }
        AnalysisRequest::Sentiment { text } => {
            AnalysisResult::Sentiment(client.analyze_sentiment(text).await?)
        }
        AnalysisRequest::Translation {
            text,
            source_lang,
            target_lang,
        } => AnalysisResult::Translation(
            client
                .translate(text, source_lang.as_deref(), target_lang)
                .await?,
        ),
        AnalysisRequest::Lemmatization { text, language } => {
            AnalysisResult::Lemmatization(client.lemmatize(text, language).await?)
        }
        AnalysisRequest::Chat { message } => AnalysisResult::Chat(client.chat(message).await?),
    };
    Ok(result)
}
