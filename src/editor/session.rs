// editor/session.rs
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use super::orchestrator::Orchestrator;
use crate::analysis::{AnalysisClient, Coordinator};
use crate::config::EditorConfig;

pub type SharedSession = Arc<Mutex<Orchestrator>>;

/// Start an editing session on the current runtime.
///
/// Analysis outcomes are pumped back into the orchestrator by a background
/// task that holds only a weak reference, so dropping the last
/// [`SharedSession`] tears the whole session down.
pub fn spawn_session(config: EditorConfig, client: Arc<dyn AnalysisClient>) -> SharedSession {
    let (outcomes, mut rx) = mpsc::unbounded_channel();
    let coordinator = Coordinator::new(client, &config.analysis, outcomes);
    let session = Arc::new(Mutex::new(Orchestrator::new(config, coordinator)));

    let weak = Arc::downgrade(&session);
    tokio::spawn(async move {
        while let Some(outcome) = rx.recv().await {
            let Some(session) = weak.upgrade() else {
                break;
            };
            session.lock().await.record_analysis(outcome);
        }
        debug!("analysis pump stopped");
    });

    session
}
