// analysis/coordinator.rs
//! Per-kind debouncing, timeouts and failure handling for analysis requests.
//!
//! Each analysis kind gets its own [`RequestHook`] task. Scheduling a request
//! replaces whatever is pending for that kind and restarts its quiet period,
//! so only the last request in a burst reaches the backend. Responses are sent
//! back tagged with the [`Ticket`] they were issued under; deciding whether a
//! response is still current is left to the receiver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::client::{dispatch, AnalysisClient};
use super::error::AnalysisError;
use super::hook::AsyncHook;
use super::types::{AnalysisKind, AnalysisOutcome, AnalysisRequest, Ticket};
use crate::config::AnalysisConfig;

const HOOK_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Wait for the kind's quiet period; later requests replace this one.
    Debounced,
    /// Send right away.
    Immediate,
}

#[derive(Debug, PartialEq)]
pub enum Submission {
    /// Answered locally without a network call.
    Resolved(AnalysisOutcome),
    Queued,
    /// The kind's hook is not running or is saturated.
    Dropped,
}

#[derive(Debug)]
enum HookEvent {
    Schedule {
        ticket: Ticket,
        request: AnalysisRequest,
        delay: Duration,
    },
    /// Forget the pending request; a newer one was answered locally.
    Cancel,
}

struct RequestHook {
    kind: AnalysisKind,
    client: Arc<dyn AnalysisClient>,
    outcomes: mpsc::UnboundedSender<AnalysisOutcome>,
    timeout: Duration,
    pending: Option<(Ticket, AnalysisRequest)>,
}

impl RequestHook {
    fn fire(&self, ticket: Ticket, request: AnalysisRequest) {
        let client = Arc::clone(&self.client);
        let outcomes = self.outcomes.clone();
        let timeout = self.timeout;
        debug!(kind = %ticket.kind, seq = ticket.seq, "sending analysis request");

        tokio::spawn(async move {
            let error = match tokio::time::timeout(timeout, dispatch(client.as_ref(), &request)).await {
                Ok(Ok(result)) => {
                    let _ = outcomes.send(AnalysisOutcome::resolved(ticket, result));
                    return;
                }
                Ok(Err(error)) => error,
                Err(_) => AnalysisError::Timeout(timeout),
            };
            if error.is_transient() {
                warn!(kind = %ticket.kind, seq = ticket.seq, %error, "analysis request failed");
            } else {
                debug!(kind = %ticket.kind, seq = ticket.seq, %error, "analysis request rejected");
            }
            let outcome = AnalysisOutcome::failed(ticket, &request, error.to_string());
            // The session may be gone by now; nobody is left to tell.
            let _ = outcomes.send(outcome);
        });
    }
}

impl AsyncHook for RequestHook {
    type Event = HookEvent;

    fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant> {
        match event {
            HookEvent::Cancel => {
                self.pending = None;
                None
            }
            HookEvent::Schedule {
                ticket,
                request,
                delay,
            } if delay.is_zero() => {
                if self.kind.latest_only() {
                    self.pending = None;
                }
                self.fire(ticket, request);
                self.pending.as_ref().and(timeout)
            }
            HookEvent::Schedule {
                ticket,
                request,
                delay,
            } => {
                self.pending = Some((ticket, request));
                Some(Instant::now() + delay)
            }
        }
    }

    fn finish_debounce(&mut self) {
        if let Some((ticket, request)) = self.pending.take() {
            self.fire(ticket, request);
        }
    }
}

/// Front door for analysis requests of one editing session.
///
/// Dropping the coordinator stops its hooks; requests already in flight still
/// deliver their outcome if the receiver is alive.
pub struct Coordinator {
    hooks: HashMap<AnalysisKind, mpsc::Sender<HookEvent>>,
    config: AnalysisConfig,
}

impl Coordinator {
    pub fn new(
        client: Arc<dyn AnalysisClient>,
        config: &AnalysisConfig,
        outcomes: mpsc::UnboundedSender<AnalysisOutcome>,
    ) -> Self {
        let hooks = AnalysisKind::ALL
            .into_iter()
            .map(|kind| {
                let hook = RequestHook {
                    kind,
                    client: Arc::clone(&client),
                    outcomes: outcomes.clone(),
                    timeout: config.request_timeout(),
                    pending: None,
                };
                (kind, hook.spawn(HOOK_CAPACITY))
            })
            .collect();

        Self {
            hooks,
            config: config.clone(),
        }
    }

    pub fn submit(&self, ticket: Ticket, request: AnalysisRequest, trigger: Trigger) -> Submission {
        let kind = ticket.kind;
        let Some(hook) = self.hooks.get(&kind) else {
            return Submission::Dropped;
        };

        if let Some(result) = request.short_circuit(&self.config.limits) {
            debug!(%kind, seq = ticket.seq, "analysis answered locally");
            if kind.latest_only() {
                let _ = hook.try_send(HookEvent::Cancel);
            }
            return Submission::Resolved(AnalysisOutcome::resolved(ticket, result));
        }

        let delay = match trigger {
            Trigger::Debounced => self.config.debounce_for(kind),
            Trigger::Immediate => Duration::ZERO,
        };
        match hook.try_send(HookEvent::Schedule {
            ticket,
            request,
            delay,
        }) {
            Ok(()) => Submission::Queued,
            Err(TrySendError::Full(_)) => {
                warn!(%kind, "analysis queue full, dropping request");
                Submission::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%kind, "analysis hook not running");
                Submission::Dropped
            }
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("kinds", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::client::DisabledClient;
    use crate::analysis::types::{AnalysisResult, Sentiment};

    fn coordinator() -> Coordinator {
        let (tx, _rx) = mpsc::unbounded_channel();
        Coordinator::new(Arc::new(DisabledClient), &AnalysisConfig::default(), tx)
    }

    #[test]
    fn short_input_resolves_without_runtime() {
        let coordinator = coordinator();
        let ticket = Ticket {
            kind: AnalysisKind::Sentiment,
            seq: 1,
        };
        let submission = coordinator.submit(
            ticket,
            AnalysisRequest::Sentiment { text: "ok".into() },
            Trigger::Debounced,
        );
        assert_eq!(
            submission,
            Submission::Resolved(AnalysisOutcome::resolved(
                ticket,
                AnalysisResult::Sentiment(Sentiment::neutral())
            ))
        );
    }

    #[test]
    fn requests_are_dropped_when_hooks_are_not_running() {
        let coordinator = coordinator();
        let submission = coordinator.submit(
            Ticket {
                kind: AnalysisKind::SpellCheck,
                seq: 1,
            },
            AnalysisRequest::SpellCheck {
                text: "Manao ahoana".into(),
                language: "mg".into(),
            },
            Trigger::Debounced,
        );
        assert_eq!(submission, Submission::Dropped);
    }

    #[tokio::test]
    async fn disabled_backend_resolves_to_fallback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let coordinator = Coordinator::new(Arc::new(DisabledClient), &AnalysisConfig::default(), tx);
        let ticket = Ticket {
            kind: AnalysisKind::Translation,
            seq: 3,
        };
        let submission = coordinator.submit(
            ticket,
            AnalysisRequest::Translation {
                text: "Veloma".into(),
                source_lang: Some("mg".into()),
                target_lang: "en".into(),
            },
            Trigger::Immediate,
        );
        assert_eq!(submission, Submission::Queued);

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.ticket, ticket);
        assert_eq!(outcome.failure.as_deref(), Some("analysis backend disabled"));
        match outcome.result {
            AnalysisResult::Translation(translation) => {
                assert_eq!(translation.translated_text, "Veloma")
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
