//! Session and service configuration.
//!
//! [`EditorConfig`] holds every tunable of an editing session and can be read
//! from a TOML file; any field left out takes its default. [`Cli`] covers the
//! few settings the service binary takes from flags or the environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisKind, InputLimits};
use crate::lang::stats::DEFAULT_WORDS_PER_MINUTE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Language code sent with spell-check and lemmatization requests.
    pub language: String,
    pub words_per_minute: usize,
    /// Documents longer than this (in characters) are not sent for analysis.
    pub max_length: usize,
    pub history_limit: usize,
    pub notification_limit: usize,
    pub auto_spell_check: bool,
    pub auto_sentiment: bool,
    /// Content must be longer than this before sentiment runs on its own.
    pub sentiment_trigger_chars: usize,
    pub analysis: AnalysisConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            language: "mg".to_string(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            max_length: 50_000,
            history_limit: 100,
            notification_limit: 5,
            auto_spell_check: true,
            auto_sentiment: true,
            sentiment_trigger_chars: 10,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// With `false`, no backend is contacted and every analysis resolves to
    /// its safe default.
    pub enabled: bool,
    pub backend_url: String,
    pub request_timeout_ms: u64,
    pub debounce: DebounceConfig,
    pub limits: InputLimits,
    pub endpoints: Endpoints,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend_url: "http://127.0.0.1:5000/api".to_string(),
            request_timeout_ms: 30_000,
            debounce: DebounceConfig::default(),
            limits: InputLimits::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Quiet period before a scheduled request of `kind` fires.
    pub fn debounce_for(&self, kind: AnalysisKind) -> Duration {
        let ms = match kind {
            AnalysisKind::SpellCheck => self.debounce.spell_check_ms,
            AnalysisKind::Autocomplete => self.debounce.autocomplete_ms,
            AnalysisKind::Sentiment => self.debounce.sentiment_ms,
            AnalysisKind::Translation => self.debounce.translation_ms,
            AnalysisKind::WordCheck | AnalysisKind::Lemmatization | AnalysisKind::Chat => 0,
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub spell_check_ms: u64,
    pub autocomplete_ms: u64,
    pub sentiment_ms: u64,
    pub translation_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            spell_check_ms: 500,
            autocomplete_ms: 300,
            sentiment_ms: 1000,
            translation_ms: 500,
        }
    }
}

/// Backend paths, relative to `backend_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub spell_check: String,
    pub check_word: String,
    pub autocomplete: String,
    pub sentiment: String,
    pub translate: String,
    pub lemmatize: String,
    pub chat: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            spell_check: "/spell-check".to_string(),
            check_word: "/spellcheck".to_string(),
            autocomplete: "/autocomplete".to_string(),
            sentiment: "/sentiment".to_string(),
            translate: "/translate".to_string(),
            lemmatize: "/lemmatize".to_string(),
            chat: "/chatbot".to_string(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "soratra", version, about = "Editing-session service for the Soratra writing assistant")]
pub struct Cli {
    /// Address the session service listens on.
    #[arg(long, env = "SORATRA_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Base URL of the analysis backend; overrides the config file.
    #[arg(long, env = "SORATRA_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// TOML file with session settings.
    #[arg(long, env = "SORATRA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run without an analysis backend.
    #[arg(long, env = "SORATRA_OFFLINE")]
    pub offline: bool,
}

impl Cli {
    pub fn editor_config(&self) -> anyhow::Result<EditorConfig> {
        let mut config = match &self.config {
            Some(path) => EditorConfig::load(path)?,
            None => EditorConfig::default(),
        };
        if let Some(url) = &self.backend_url {
            config.analysis.backend_url = url.clone();
        }
        if self.offline {
            config.analysis.enabled = false;
        }
        Ok(config)
    }
}
