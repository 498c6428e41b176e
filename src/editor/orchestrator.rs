// editor/orchestrator.rs
//! The single owner of an editing session's state.
//!
//! Every mutation goes through [`Orchestrator`]. Edits recompute statistics on
//! the spot and schedule analysis through the [`Coordinator`]; outcomes come
//! back through [`Orchestrator::record_analysis`], which drops anything that is
//! no longer the latest request of its kind. After each mutation the new
//! snapshot is published to subscribers.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::history::History;
use super::panels::{Anchor, Panel, PopupTarget, SidebarTab};
use super::state::{ChatMessage, ChatRole, EditorState, Notification, Selection};
use crate::analysis::{
    AnalysisKind, AnalysisOutcome, AnalysisRequest, AnalysisResult, Coordinator, ErrorCategory,
    Sequencer, Span, SpellError, Submission, Trigger,
};
use crate::config::EditorConfig;
use crate::lang::{words, TextStats, WordSpan};

pub const TRANSLATION_HISTORY_LIMIT: usize = 10;

/// Stripped from a word before it is looked up on its own.
const WORD_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '[', ']', '{', '}'];

/// Result of [`Orchestrator::apply_correction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrectionOutcome {
    /// The span was replaced; later errors moved by `delta` characters.
    Applied { replaced: Span, delta: isize },
    /// The text under the error changed since it was reported. Nothing was
    /// edited and a fresh spell-check was requested.
    Stale,
}

pub struct Orchestrator {
    config: EditorConfig,
    state: EditorState,
    coordinator: Coordinator,
    sequencer: Sequencer,
    history: History,
    publisher: watch::Sender<EditorState>,
    next_notification: u64,
    /// Chat requests sent and not yet answered.
    chat_in_flight: usize,
}

impl Orchestrator {
    pub fn new(config: EditorConfig, coordinator: Coordinator) -> Self {
        let state = EditorState::new(&config);
        let (publisher, _) = watch::channel(state.clone());
        let mut history = History::new(config.history_limit);
        history.push("");

        Self {
            config,
            state,
            coordinator,
            sequencer: Sequencer::default(),
            history,
            publisher,
            next_notification: 1,
            chat_in_flight: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<EditorState> {
        self.publisher.subscribe()
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }

    // Content

    /// Replace the document. `html` defaults to the plain text.
    pub fn set_content(&mut self, text: impl Into<String>, html: Option<String>) {
        self.apply_content(text.into(), html, true);
        self.publish();
    }

    fn apply_content(&mut self, text: String, html: Option<String>, record: bool) {
        let changed = text != self.state.document.plain_text;

        self.state.document.rich_content = html
            .filter(|html| !html.is_empty())
            .unwrap_or_else(|| text.clone());
        self.state.document.plain_text = text;
        self.state.stats =
            TextStats::compute(&self.state.document.plain_text, self.config.words_per_minute);
        self.state.selection = Selection::within(
            &self.state.document.plain_text,
            self.state.selection.range_start,
            self.state.selection.range_length,
        );

        if record {
            self.history.push(&self.state.document.plain_text);
        }
        self.state.can_undo = self.history.can_undo();
        self.state.can_redo = self.history.can_redo();

        if !changed {
            return;
        }
        if self.state.stats.characters > self.config.max_length {
            debug!(
                characters = self.state.stats.characters,
                max = self.config.max_length,
                "document too long, skipping analysis"
            );
            self.forget_spell_check();
            return;
        }

        if self.state.settings.auto_correct {
            let request = self.spell_check_request();
            self.submit(request, Trigger::Debounced);
        } else {
            self.forget_spell_check();
        }
        if self.config.auto_sentiment
            && self.state.stats.characters > self.config.sentiment_trigger_chars
        {
            let request = AnalysisRequest::Sentiment {
                text: self.state.document.plain_text.clone(),
            };
            self.submit(request, Trigger::Debounced);
        }
    }

    /// Make any outstanding spell-check stale. Its offsets refer to text that
    /// no longer exists.
    fn forget_spell_check(&mut self) {
        self.sequencer.issue(AnalysisKind::SpellCheck);
        self.state.loading.remove(&AnalysisKind::SpellCheck);
    }

    /// Move the cursor or selection and return the word under its start.
    pub fn set_selection(&mut self, range_start: usize, range_length: usize) -> Option<WordSpan> {
        self.state.selection =
            Selection::within(&self.state.document.plain_text, range_start, range_length);
        self.publish();
        words::word_at(
            &self.state.document.plain_text,
            self.state.selection.range_start,
        )
    }

    pub fn undo(&mut self) -> bool {
        let Some(text) = self.history.undo().map(str::to_string) else {
            return false;
        };
        self.apply_content(text, None, false);
        self.publish();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(text) = self.history.redo().map(str::to_string) else {
            return false;
        };
        self.apply_content(text, None, false);
        self.publish();
        true
    }

    /// Back to an empty document with default panels and settings. Responses
    /// to requests issued before the reset are ignored.
    pub fn reset(&mut self) {
        info!("resetting editing session");
        self.sequencer.invalidate_all();
        self.chat_in_flight = 0;
        self.history.clear();
        self.history.push("");
        self.state = EditorState::new(&self.config);
        self.publish();
    }

    // Analysis results

    /// Merge an analysis outcome. Returns `false` if it was stale and dropped.
    pub fn record_analysis(&mut self, outcome: AnalysisOutcome) -> bool {
        let ticket = outcome.ticket;
        if !self.sequencer.is_current(ticket) {
            debug!(
                kind = %ticket.kind,
                seq = ticket.seq,
                latest = self.sequencer.latest(ticket.kind),
                "discarding stale analysis response"
            );
            return false;
        }
        if !ticket.kind.latest_only() {
            self.chat_in_flight = self.chat_in_flight.saturating_sub(1);
        }
        self.merge(outcome);
        self.publish();
        true
    }

    fn merge(&mut self, outcome: AnalysisOutcome) {
        let AnalysisOutcome {
            ticket,
            result,
            failure,
        } = outcome;
        let kind = ticket.kind;

        let settled = if kind.latest_only() {
            ticket.seq == self.sequencer.latest(kind)
        } else {
            self.chat_in_flight == 0
        };
        if settled {
            self.state.loading.remove(&kind);
        }
        let failed = failure.is_some();
        if let Some(reason) = failure {
            self.notify(Some(kind), format!("{kind} unavailable: {reason}"));
        }

        match result {
            AnalysisResult::SpellCheck(errors) => {
                let state = &self.state;
                let (spelling, other): (Vec<_>, Vec<_>) = errors
                    .into_iter()
                    .filter(|error| !state.is_ignored(&error.word))
                    .partition(|error| error.category == ErrorCategory::Spelling);
                self.state.spell_errors = spelling;
                self.state.grammar_errors = other;
            }
            AnalysisResult::WordCheck(check) => self.state.word_check = Some(check),
            AnalysisResult::Autocomplete(suggestions) => {
                self.state.suggestions = suggestions;
                self.state.selected_suggestion = None;
            }
            AnalysisResult::Sentiment(sentiment) => self.state.sentiment = sentiment,
            AnalysisResult::Translation(translation) => {
                // Blank input is echoed locally; that is not a translation.
                if !failed && !words::trim(&translation.source_text).is_empty() {
                    let history = &mut self.state.translation_history;
                    history.insert(0, translation.clone());
                    history.truncate(TRANSLATION_HISTORY_LIMIT);
                }
                self.state.translation = Some(translation);
            }
            AnalysisResult::Lemmatization(lemmas) => self.state.lemmas = lemmas,
            AnalysisResult::Chat(reply) => {
                if !words::trim(&reply.reply).is_empty() {
                    self.state.chat.push(ChatMessage {
                        role: ChatRole::Assistant,
                        text: reply.reply,
                    });
                }
            }
        }
    }

    fn submit(&mut self, request: AnalysisRequest, trigger: Trigger) {
        let kind = request.kind();
        let ticket = self.sequencer.issue(kind);
        match self.coordinator.submit(ticket, request, trigger) {
            Submission::Resolved(outcome) => self.merge(outcome),
            Submission::Queued => {
                if !kind.latest_only() {
                    self.chat_in_flight += 1;
                }
                self.state.loading.insert(kind);
            }
            Submission::Dropped => {
                debug!(%kind, seq = ticket.seq, "analysis request not scheduled");
                if kind.latest_only() {
                    self.state.loading.remove(&kind);
                }
            }
        }
    }

    fn spell_check_request(&self) -> AnalysisRequest {
        AnalysisRequest::SpellCheck {
            text: self.state.document.plain_text.clone(),
            language: self.state.settings.language.clone(),
        }
    }

    // Corrections

    /// Replace the text under `error` with `suggestion`.
    pub fn apply_correction(&mut self, error: &SpellError, suggestion: &str) -> CorrectionOutcome {
        let span = error.position;
        let text = &self.state.document.plain_text;
        let intact = !span.is_empty()
            && span.end <= self.state.stats.characters
            && words::slice(text, span.start, span.end) == error.word;

        if !intact {
            warn!(
                word = %error.word,
                start = span.start,
                end = span.end,
                "correction no longer matches the document"
            );
            self.state.spell_errors.retain(|e| e != error);
            self.state.grammar_errors.retain(|e| e != error);
            let request = self.spell_check_request();
            self.submit(request, Trigger::Immediate);
            self.publish();
            return CorrectionOutcome::Stale;
        }

        let new_text = words::replace_range(text, span.start, span.end, suggestion);
        let inserted = words::char_len(suggestion);
        let delta = inserted as isize - span.len() as isize;

        let shift = |errors: &mut Vec<SpellError>| {
            errors.retain_mut(|e| {
                if e.position.start >= span.end {
                    e.position = e.position.shifted(delta);
                    true
                } else {
                    !e.position.overlaps(&span)
                }
            });
        };
        shift(&mut self.state.spell_errors);
        shift(&mut self.state.grammar_errors);

        debug!(word = %error.word, %suggestion, delta, "applied correction");
        self.state.selection.range_start = span.start + inserted;
        self.state.selection.range_length = 0;
        self.apply_content(new_text, None, true);
        self.publish();

        CorrectionOutcome::Applied {
            replaced: span,
            delta,
        }
    }

    /// Stop flagging `word` for the rest of the session.
    pub fn ignore_error(&mut self, word: &str) {
        let word = word.to_lowercase();
        self.state
            .spell_errors
            .retain(|e| e.word.to_lowercase() != word);
        self.state
            .grammar_errors
            .retain(|e| e.word.to_lowercase() != word);
        self.state.ignored_words.insert(word);
        self.publish();
    }

    // On-demand analysis

    pub fn request_spell_check(&mut self) {
        let request = self.spell_check_request();
        self.submit(request, Trigger::Immediate);
        self.publish();
    }

    pub fn analyze_sentiment(&mut self) {
        let request = AnalysisRequest::Sentiment {
            text: self.state.document.plain_text.clone(),
        };
        self.submit(request, Trigger::Immediate);
        self.publish();
    }

    /// Ask for completions of the word before the cursor.
    pub fn request_autocomplete(&mut self) {
        if !self.state.settings.show_suggestions {
            self.state.suggestions.clear();
            self.state.selected_suggestion = None;
            self.publish();
            return;
        }
        let request = AnalysisRequest::Autocomplete {
            text: self.state.document.plain_text.clone(),
            cursor: self.state.selection.range_start,
        };
        self.submit(request, Trigger::Debounced);
        self.publish();
    }

    pub fn select_next_suggestion(&mut self) -> Option<usize> {
        let count = self.state.suggestions.len();
        if count == 0 {
            return None;
        }
        let next = match self.state.selected_suggestion {
            Some(index) if index + 1 < count => index + 1,
            _ => 0,
        };
        self.state.selected_suggestion = Some(next);
        self.publish();
        Some(next)
    }

    pub fn select_previous_suggestion(&mut self) -> Option<usize> {
        let count = self.state.suggestions.len();
        if count == 0 {
            return None;
        }
        let previous = match self.state.selected_suggestion {
            Some(index) if index > 0 => index - 1,
            _ => count - 1,
        };
        self.state.selected_suggestion = Some(previous);
        self.publish();
        Some(previous)
    }

    /// Replace the word being typed with a suggestion: `index`, or the
    /// selected one when `None`.
    pub fn accept_suggestion(&mut self, index: Option<usize>) -> bool {
        let Some(text) = index
            .or(self.state.selected_suggestion)
            .and_then(|index| self.state.suggestions.get(index))
            .map(|suggestion| suggestion.text.clone())
        else {
            return false;
        };

        let current = words::current_word(
            &self.state.document.plain_text,
            self.state.selection.range_start,
        );
        let new_text = words::replace_range(
            &self.state.document.plain_text,
            current.start,
            current.end,
            &text,
        );
        self.state.selection.range_start = current.start + words::char_len(&text);
        self.state.selection.range_length = 0;
        self.state.suggestions.clear();
        self.state.selected_suggestion = None;
        self.apply_content(new_text, None, true);
        self.publish();
        true
    }

    /// Look up the word under `index` on its own.
    pub fn check_word_at(&mut self, index: usize) -> Option<WordSpan> {
        let span = words::word_at(&self.state.document.plain_text, index)?;
        let word: String = span
            .word
            .chars()
            .filter(|c| !WORD_PUNCTUATION.contains(c))
            .collect();
        self.submit(AnalysisRequest::WordCheck { word }, Trigger::Immediate);
        self.publish();
        Some(span)
    }

    /// Translate `text`, or the selection, or the whole document.
    ///
    /// A `source_lang` of `None` or `"auto"` lets the backend detect it.
    pub fn translate(&mut self, text: Option<String>, source_lang: Option<String>, target_lang: &str) {
        let text = text.unwrap_or_else(|| self.selection_or_document());
        let source_lang = source_lang.filter(|lang| lang != "auto");
        let request = AnalysisRequest::Translation {
            text,
            source_lang,
            target_lang: target_lang.to_string(),
        };
        self.submit(request, Trigger::Debounced);
        self.publish();
    }

    /// Lemmatize `text`, or the selection, or the whole document.
    pub fn lemmatize(&mut self, text: Option<String>) {
        let text = text.unwrap_or_else(|| self.selection_or_document());
        let request = AnalysisRequest::Lemmatization {
            text,
            language: self.state.settings.language.clone(),
        };
        self.submit(request, Trigger::Immediate);
        self.publish();
    }

    pub fn lemma_for<'a>(&'a self, word: &'a str) -> &'a str {
        self.state.lemmas.lemma_for(word)
    }

    /// Post a chat message. Blank messages are ignored.
    pub fn send_chat(&mut self, message: &str) -> bool {
        let message = words::trim(message);
        if message.is_empty() {
            return false;
        }
        self.state.chat.push(ChatMessage {
            role: ChatRole::User,
            text: message.to_string(),
        });
        let request = AnalysisRequest::Chat {
            message: message.to_string(),
        };
        self.submit(request, Trigger::Immediate);
        self.publish();
        true
    }

    fn selection_or_document(&self) -> String {
        if self.state.selection.is_collapsed() {
            self.state.document.plain_text.clone()
        } else {
            self.state.selected_text().to_string()
        }
    }

    // Settings

    pub fn set_language(&mut self, language: &str) {
        self.state.settings.language = language.to_string();
        self.publish();
    }

    pub fn toggle_auto_correct(&mut self) -> bool {
        self.state.settings.auto_correct = !self.state.settings.auto_correct;
        self.publish();
        self.state.settings.auto_correct
    }

    pub fn toggle_suggestions(&mut self) -> bool {
        let show = !self.state.settings.show_suggestions;
        self.state.settings.show_suggestions = show;
        if !show {
            self.state.suggestions.clear();
            self.state.selected_suggestion = None;
        }
        self.publish();
        show
    }

    // Panels

    pub fn toggle_panel(&mut self, panel: Panel) -> bool {
        let open = self.state.panels.toggle(panel);
        self.publish();
        open
    }

    pub fn set_panel(&mut self, panel: Panel, open: bool) {
        self.state.panels.set(panel, open);
        self.publish();
    }

    pub fn open_popup(&mut self, panel: Panel, anchor: Anchor, target: Option<PopupTarget>) -> bool {
        let opened = self.state.panels.open_popup(panel, anchor, target);
        if opened {
            self.publish();
        }
        opened
    }

    pub fn set_active_tab(&mut self, tab: SidebarTab) {
        self.state.panels.active_tab = tab;
        self.publish();
    }

    // Notifications

    fn notify(&mut self, kind: Option<AnalysisKind>, message: String) {
        let id = self.next_notification;
        self.next_notification += 1;
        self.state.notifications.push(Notification { id, kind, message });
        let limit = self.config.notification_limit.max(1);
        if self.state.notifications.len() > limit {
            let excess = self.state.notifications.len() - limit;
            self.state.notifications.drain(..excess);
        }
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        let before = self.state.notifications.len();
        self.state.notifications.retain(|n| n.id != id);
        let removed = self.state.notifications.len() != before;
        if removed {
            self.publish();
        }
        removed
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("characters", &self.state.stats.characters)
            .field("loading", &self.state.loading)
            .finish()
    }
}
