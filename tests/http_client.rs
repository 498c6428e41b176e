use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use soratra::analysis::{AnalysisClient, AnalysisError, HttpAnalysisClient, SentimentLabel, Span};
use soratra::config::AnalysisConfig;

async fn spell_check(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["language"], "mg");
    if body["text"] == "Manao Ahoanax" {
        Json(json!({
            "corrections": [
                { "word": "ahoanax", "suggestions": ["ahoana"], "position": 6 }
            ]
        }))
    } else {
        Json(json!([
            { "word": "diso", "position": { "start": 5, "end": 9 }, "suggestion": "\"dison\",", "type": "grammar" },
            { "word": "lavitra", "position": { "start": 90 } },
            { "word": "tsy misy toerana" }
        ]))
    }
}

async fn check_word(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let correct = !query.get("word").is_some_and(|word| word.contains('x'));
    Json(json!({ "correct": correct, "suggestion": "\"ahoana\"" }))
}

async fn autocomplete(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["prefix"], "ah");
    assert_eq!(body["text"], "Manao ah");
    Json(json!({
        "suggestions": [
            { "word": "aho", "score": 0.2 },
            { "word": "ahoana", "score": 0.9 }
        ]
    }))
}

async fn sentiment(Json(body): Json<Value>) -> Json<Value> {
    if body["text"] == "Ratsy ny andro" {
        Json(json!({ "sentiment": "négatif" }))
    } else {
        Json(json!({ "label": "positive", "score": 0.8 }))
    }
}

async fn translate(Json(body): Json<Value>) -> impl IntoResponse {
    match body["target_lang"].as_str() {
        Some("xx") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "model offline" })),
        ),
        Some("fr") => (StatusCode::OK, Json(json!({ "translation": "" }))),
        _ => (
            StatusCode::OK,
            Json(json!({ "translatedText": "Goodbye", "detectedLanguage": "mg" })),
        ),
    }
}

async fn lemmatize() -> Json<Value> {
    Json(json!({ "lemmas": ["mandeha", "izy"] }))
}

async fn chatbot(Json(body): Json<Value>) -> Json<Value> {
    let message = body["message"].as_str().unwrap_or_default();
    Json(json!({ "response": format!("Hoy ianao: {message}") }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "reply": "tara loatra" }))
}

async fn garbage() -> &'static str {
    "not json"
}

/// Start a mock backend on an ephemeral port and return its `/api` base URL.
async fn backend() -> String {
    let app = Router::new()
        .route("/api/spell-check", post(spell_check))
        .route("/api/spellcheck", get(check_word))
        .route("/api/autocomplete", post(autocomplete))
        .route("/api/sentiment", post(sentiment))
        .route("/api/translate", post(translate))
        .route("/api/lemmatize", post(lemmatize))
        .route("/api/chatbot", post(chatbot))
        .route("/api/slow", post(slow))
        .route("/api/garbage", post(garbage));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn client() -> HttpAnalysisClient {
    let config = AnalysisConfig {
        backend_url: backend().await,
        ..AnalysisConfig::default()
    };
    HttpAnalysisClient::new(&config).unwrap()
}

#[tokio::test]
async fn spell_check_offsets_recover_casing() {
    let client = client().await;
    let errors = client.spell_check("Manao Ahoanax", "mg").await.unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].word, "Ahoanax");
    assert_eq!(errors[0].position, Span::new(6, 13));
    assert_eq!(errors[0].suggestions, ["ahoana"]);
}

#[tokio::test]
async fn spell_check_list_shape_drops_bad_positions() {
    let client = client().await;
    let errors = client
        .spell_check("Teny diso ao anatiny", "mg")
        .await
        .unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].position, Span::new(5, 9));
    assert_eq!(errors[0].suggestions, ["dison"]);
    assert_eq!(errors[0].category, soratra::analysis::ErrorCategory::Grammar);
}

#[tokio::test]
async fn word_check_uses_query_string() {
    let client = client().await;
    let check = client.check_word("ahoanax").await.unwrap();
    assert_eq!(check.word, "ahoanax");
    assert!(!check.correct);
    assert_eq!(check.suggestions, ["ahoana"]);
}

#[tokio::test]
async fn autocomplete_sends_prefix_and_ranks() {
    let client = client().await;
    let suggestions = client.autocomplete("Manao ah ianao", 8).await.unwrap();
    let texts: Vec<_> = suggestions.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["ahoana", "aho"]);
}

#[tokio::test]
async fn sentiment_shapes_normalize() {
    let client = client().await;

    let positive = client.analyze_sentiment("Tsara be ny andro").await.unwrap();
    assert_eq!(positive.label, SentimentLabel::VeryPositive);
    assert_eq!(positive.confidence, 1.0);

    let negative = client.analyze_sentiment("Ratsy ny andro").await.unwrap();
    assert_eq!(negative.label, SentimentLabel::Negative);
    assert_eq!(negative.score, 0.0);
    assert_eq!(negative.confidence, 0.5);
}

#[tokio::test]
async fn translation_aliases_and_errors() {
    let client = client().await;

    let translation = client.translate("Veloma", None, "en").await.unwrap();
    assert_eq!(translation.translated_text, "Goodbye");
    assert_eq!(translation.detected_language.as_deref(), Some("mg"));

    let empty = client.translate("Veloma", Some("mg"), "fr").await.unwrap();
    assert_eq!(empty.translated_text, "Veloma");

    match client.translate("Veloma", None, "xx").await {
        Err(AnalysisError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "model offline");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn lemmas_without_tokens_use_the_text() {
    let client = client().await;
    let lemmas = client.lemmatize("Nandeha izy", "mg").await.unwrap();
    assert_eq!(lemmas.tokens, ["Nandeha", "izy"]);
    assert_eq!(lemmas.lemma_for("nandeha"), "mandeha");
}

#[tokio::test]
async fn chat_reply_alias() {
    let client = client().await;
    let reply = client.chat("Salama").await.unwrap();
    assert_eq!(reply.reply, "Hoy ianao: Salama");
}

#[tokio::test]
async fn slow_backend_times_out() {
    let mut config = AnalysisConfig {
        backend_url: backend().await,
        request_timeout_ms: 200,
        ..AnalysisConfig::default()
    };
    config.endpoints.chat = "/slow".into();
    let client = HttpAnalysisClient::new(&config).unwrap();

    let error = client.chat("Salama").await.unwrap_err();
    assert!(matches!(error, AnalysisError::Transport(_)));
    assert!(error.is_transient());
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let mut config = AnalysisConfig {
        backend_url: backend().await,
        ..AnalysisConfig::default()
    };
    config.endpoints.sentiment = "/garbage".into();
    let client = HttpAnalysisClient::new(&config).unwrap();

    let error = client.analyze_sentiment("Tsara be").await.unwrap_err();
    assert!(matches!(error, AnalysisError::Decode(_)));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = AnalysisConfig {
        backend_url: format!("http://{addr}/api"),
        ..AnalysisConfig::default()
    };
    let client = HttpAnalysisClient::new(&config).unwrap();
    let error = client.spell_check("Manao ahoana", "mg").await.unwrap_err();
    assert!(matches!(error, AnalysisError::Transport(_)));
}
