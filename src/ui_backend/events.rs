//! Application Events
//!
//! Events sent from the session controller to the host for side-channel UI.

use super::types::{ChatMode, RequestPhase, Sender, Severity};

/// Events emitted by the controller to the frontend
///
/// These are sent over an unbounded mpsc channel so hosts can draw toasts and
/// status without polling the shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    // ========== Conversation ==========
    /// The active thread changed (or was re-selected)
    ModeSwitched(ChatMode),

    /// A message was appended to a thread
    MessageAppended { mode: ChatMode, sender: Sender },

    // ========== Requests ==========
    /// A request entered `Sending`
    RequestStarted { mode: ChatMode },

    /// A request left `Sending`; `phase` is `Succeeded` or `Failed`
    RequestFinished { mode: ChatMode, phase: RequestPhase },

    // ========== Uploads ==========
    /// Staged file set changed
    StagedFilesChanged { count: usize },

    // ========== Toasts ==========
    ToastShown {
        id: u64,
        message: String,
        severity: Severity,
    },
    ToastHidden { id: u64 },
    ToastRemoved { id: u64 },

    // ========== Confirmation ==========
    ConfirmationRequested { title: String, message: String },
    ConfirmationResolved { confirmed: bool },
}
