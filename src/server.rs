// server.rs
//! JSON session service driven by the browser-side widget binding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::{AnalysisClient, SpellError};
use crate::config::EditorConfig;
use crate::editor::{
    spawn_session, Anchor, CorrectionOutcome, EditorState, Orchestrator, Panel, PopupTarget,
    SharedSession, SidebarTab,
};
use crate::lang::WordSpan;

pub struct AppState {
    pub app_name: String,
    pub request_count: Mutex<usize>,
    pub config: EditorConfig,
    client: Arc<dyn AnalysisClient>,
    sessions: RwLock<HashMap<u64, SharedSession>>,
    next_id: AtomicU64,
}

impl AppState {
    pub fn new(config: EditorConfig, client: Arc<dyn AnalysisClient>) -> Self {
        Self {
            app_name: "Soratra".to_string(),
            request_count: Mutex::new(0),
            config,
            client,
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    async fn session(&self, id: u64) -> Result<SharedSession, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(u64),

    #[error("notification {0} not found")]
    NotificationNotFound(u64),

    #[error("{0:?} is not a popup")]
    NotAPopup(Panel),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::SessionNotFound(_) | ApiError::NotificationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::NotAPopup(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/info", get(info))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/content", put(set_content))
        .route("/api/sessions/{id}/selection", put(set_selection))
        .route("/api/sessions/{id}/corrections", post(apply_correction))
        .route("/api/sessions/{id}/ignore", post(ignore_error))
        .route("/api/sessions/{id}/panels/{panel}/toggle", post(toggle_panel))
        .route("/api/sessions/{id}/panels/{panel}", put(set_panel))
        .route("/api/sessions/{id}/tab", put(set_active_tab))
        .route("/api/sessions/{id}/language", put(set_language))
        .route("/api/sessions/{id}/settings/auto-correct/toggle", post(toggle_auto_correct))
        .route("/api/sessions/{id}/settings/suggestions/toggle", post(toggle_suggestions))
        .route("/api/sessions/{id}/spell-check", post(request_spell_check))
        .route("/api/sessions/{id}/sentiment", post(analyze_sentiment))
        .route("/api/sessions/{id}/autocomplete", post(request_autocomplete))
        .route("/api/sessions/{id}/check-word", post(check_word))
        .route("/api/sessions/{id}/translate", post(translate))
        .route("/api/sessions/{id}/lemmatize", post(lemmatize))
        .route("/api/sessions/{id}/lemmas/{word}", get(lemma_for))
        .route("/api/sessions/{id}/chat", post(send_chat))
        .route("/api/sessions/{id}/suggestions/next", post(next_suggestion))
        .route("/api/sessions/{id}/suggestions/previous", post(previous_suggestion))
        .route("/api/sessions/{id}/suggestions/accept", post(accept_suggestion))
        .route("/api/sessions/{id}/undo", post(undo))
        .route("/api/sessions/{id}/redo", post(redo))
        .route("/api/sessions/{id}/reset", post(reset))
        .route(
            "/api/sessions/{id}/notifications/{nid}",
            delete(dismiss_notification),
        )
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
        )
}

async fn count_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    *state.request_count.lock().await += 1;
    next.run(request).await
}

/// Run `f` against session `id` and hand back its result with the new snapshot.
async fn with_session<T>(
    state: &AppState,
    id: u64,
    f: impl FnOnce(&mut Orchestrator) -> T,
) -> Result<(T, EditorState), ApiError> {
    let session = state.session(id).await?;
    let mut editor = session.lock().await;
    let value = f(&mut editor);
    Ok((value, editor.state().clone()))
}

async fn snapshot(
    state: &AppState,
    id: u64,
    f: impl FnOnce(&mut Orchestrator),
) -> Result<Json<EditorState>, ApiError> {
    let ((), snapshot) = with_session(state, id, f).await?;
    Ok(Json(snapshot))
}

// Responses

#[derive(Serialize)]
struct InfoResponse {
    app_name: String,
    version: String,
    request_count: usize,
    session_count: usize,
}

#[derive(Serialize)]
struct SessionResponse {
    id: u64,
    state: EditorState,
}

#[derive(Serialize)]
struct WordResponse {
    word: Option<WordSpan>,
    state: EditorState,
}

#[derive(Serialize)]
struct CorrectionResponse {
    outcome: CorrectionOutcome,
    state: EditorState,
}

#[derive(Serialize)]
struct FlagResponse {
    value: bool,
    state: EditorState,
}

#[derive(Serialize)]
struct SelectedResponse {
    selected: Option<usize>,
    state: EditorState,
}

#[derive(Serialize)]
struct LemmaResponse {
    word: String,
    lemma: String,
}

// Requests

#[derive(Deserialize)]
struct ContentRequest {
    text: String,
    #[serde(default)]
    html: Option<String>,
}

#[derive(Deserialize)]
struct SelectionRequest {
    range_start: usize,
    #[serde(default)]
    range_length: usize,
}

#[derive(Deserialize)]
struct CorrectionRequest {
    error: SpellError,
    suggestion: String,
}

#[derive(Deserialize)]
struct WordRequest {
    word: String,
}

#[derive(Deserialize)]
struct PanelRequest {
    open: bool,
    #[serde(default)]
    anchor: Option<Anchor>,
    #[serde(default)]
    target: Option<PopupTarget>,
}

#[derive(Deserialize)]
struct TabRequest {
    tab: SidebarTab,
}

#[derive(Deserialize)]
struct LanguageRequest {
    language: String,
}

#[derive(Deserialize)]
struct CheckWordRequest {
    index: usize,
}

#[derive(Deserialize)]
struct TranslateRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    source_lang: Option<String>,
    target_lang: String,
}

#[derive(Deserialize)]
struct LemmatizeRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Deserialize)]
struct AcceptRequest {
    #[serde(default)]
    index: Option<usize>,
}

// Route handlers

async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let request_count = *state.request_count.lock().await;
    let session_count = state.sessions.read().await.len();

    Json(InfoResponse {
        app_name: state.app_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        request_count,
        session_count,
    })
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    let session = spawn_session(state.config.clone(), Arc::clone(&state.client));
    let snapshot = session.lock().await.state().clone();
    state.sessions.write().await.insert(id, session);
    info!(id, "session created");

    (StatusCode::CREATED, Json(SessionResponse { id, state: snapshot }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, |_| {}).await
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or(ApiError::SessionNotFound(id))?;
    info!(id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<ContentRequest>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, |editor| editor.set_content(request.text, request.html)).await
}

async fn set_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<WordResponse>, ApiError> {
    let (word, state) = with_session(&state, id, |editor| {
        editor.set_selection(request.range_start, request.range_length)
    })
    .await?;
    Ok(Json(WordResponse { word, state }))
}

async fn apply_correction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<CorrectionRequest>,
) -> Result<Json<CorrectionResponse>, ApiError> {
    let (outcome, state) = with_session(&state, id, |editor| {
        editor.apply_correction(&request.error, &request.suggestion)
    })
    .await?;
    Ok(Json(CorrectionResponse { outcome, state }))
}

async fn ignore_error(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<WordRequest>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, |editor| editor.ignore_error(&request.word)).await
}

async fn toggle_panel(
    State(state): State<Arc<AppState>>,
    Path((id, panel)): Path<(u64, Panel)>,
) -> Result<Json<FlagResponse>, ApiError> {
    let (value, state) = with_session(&state, id, |editor| editor.toggle_panel(panel)).await?;
    Ok(Json(FlagResponse { value, state }))
}

async fn set_panel(
    State(state): State<Arc<AppState>>,
    Path((id, panel)): Path<(u64, Panel)>,
    Json(request): Json<PanelRequest>,
) -> Result<Json<EditorState>, ApiError> {
    let (opened, snapshot) = with_session(&state, id, |editor| match request.anchor {
        Some(anchor) if request.open => editor.open_popup(panel, anchor, request.target),
        _ => {
            editor.set_panel(panel, request.open);
            true
        }
    })
    .await?;
    if !opened {
        return Err(ApiError::NotAPopup(panel));
    }
    Ok(Json(snapshot))
}

async fn set_active_tab(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<TabRequest>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, |editor| editor.set_active_tab(request.tab)).await
}

async fn set_language(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<LanguageRequest>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, |editor| editor.set_language(&request.language)).await
}

async fn toggle_auto_correct(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<FlagResponse>, ApiError> {
    let (value, state) = with_session(&state, id, Orchestrator::toggle_auto_correct).await?;
    Ok(Json(FlagResponse { value, state }))
}

async fn toggle_suggestions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<FlagResponse>, ApiError> {
    let (value, state) = with_session(&state, id, Orchestrator::toggle_suggestions).await?;
    Ok(Json(FlagResponse { value, state }))
}

async fn request_spell_check(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, Orchestrator::request_spell_check).await
}

async fn analyze_sentiment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, Orchestrator::analyze_sentiment).await
}

async fn request_autocomplete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, Orchestrator::request_autocomplete).await
}

async fn check_word(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<CheckWordRequest>,
) -> Result<Json<WordResponse>, ApiError> {
    let (word, state) =
        with_session(&state, id, |editor| editor.check_word_at(request.index)).await?;
    Ok(Json(WordResponse { word, state }))
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, |editor| {
        editor.translate(request.text, request.source_lang, &request.target_lang)
    })
    .await
}

async fn lemmatize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<LemmatizeRequest>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, |editor| editor.lemmatize(request.text)).await
}

async fn lemma_for(
    State(state): State<Arc<AppState>>,
    Path((id, word)): Path<(u64, String)>,
) -> Result<Json<LemmaResponse>, ApiError> {
    let (lemma, _) =
        with_session(&state, id, |editor| editor.lemma_for(&word).to_string()).await?;
    Ok(Json(LemmaResponse { word, lemma }))
}

async fn send_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<FlagResponse>, ApiError> {
    let (value, state) =
        with_session(&state, id, |editor| editor.send_chat(&request.message)).await?;
    Ok(Json(FlagResponse { value, state }))
}

async fn next_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<SelectedResponse>, ApiError> {
    let (selected, state) =
        with_session(&state, id, Orchestrator::select_next_suggestion).await?;
    Ok(Json(SelectedResponse { selected, state }))
}

async fn previous_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<SelectedResponse>, ApiError> {
    let (selected, state) =
        with_session(&state, id, Orchestrator::select_previous_suggestion).await?;
    Ok(Json(SelectedResponse { selected, state }))
}

async fn accept_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<FlagResponse>, ApiError> {
    let (value, state) =
        with_session(&state, id, |editor| editor.accept_suggestion(request.index)).await?;
    Ok(Json(FlagResponse { value, state }))
}

async fn undo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<FlagResponse>, ApiError> {
    let (value, state) = with_session(&state, id, Orchestrator::undo).await?;
    Ok(Json(FlagResponse { value, state }))
}

async fn redo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<FlagResponse>, ApiError> {
    let (value, state) = with_session(&state, id, Orchestrator::redo).await?;
    Ok(Json(FlagResponse { value, state }))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<EditorState>, ApiError> {
    snapshot(&state, id, Orchestrator::reset).await
}

async fn dismiss_notification(
    State(state): State<Arc<AppState>>,
    Path((id, nid)): Path<(u64, u64)>,
) -> Result<Json<EditorState>, ApiError> {
    let (removed, snapshot) =
        with_session(&state, id, |editor| editor.dismiss_notification(nid)).await?;
    if !removed {
        return Err(ApiError::NotificationNotFound(nid));
    }
    Ok(Json(snapshot))
}
