// editor/mod.rs
pub mod history;
pub mod orchestrator;
pub mod panels;
pub mod session;
pub mod state;

pub use history::History;
pub use orchestrator::{CorrectionOutcome, Orchestrator, TRANSLATION_HISTORY_LIMIT};
pub use panels::{Anchor, Panel, PanelState, Popup, PopupTarget, SidebarTab};
pub use session::{spawn_session, SharedSession};
pub use state::{ChatMessage, ChatRole, Document, EditorState, Notification, Selection, Settings};
