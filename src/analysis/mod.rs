// analysis/mod.rs
pub mod client;
pub mod coordinator;
pub mod error;
pub mod hook;
pub mod http;
pub mod sequence;
pub mod types;
pub mod wire;

pub use client::{dispatch, AnalysisClient, DisabledClient};
pub use coordinator::{Coordinator, Submission, Trigger};
pub use error::AnalysisError;
pub use http::HttpAnalysisClient;
pub use sequence::Sequencer;
pub use types::{
    AnalysisKind, AnalysisOutcome, AnalysisRequest, AnalysisResult, ChatReply, ErrorCategory,
    InputLimits, Lemmas, Sentiment, SentimentLabel, Span, SpellError, Suggestion, Ticket,
    Translation, WordCheck,
};
