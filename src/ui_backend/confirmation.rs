//! Confirmation gate for destructive actions
//!
//! A single slot: a new request overwrites whatever was pending. The pending
//! action lives on the shared session state.

use super::state::{PendingConfirmation, SharedState};

#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    state: SharedState,
}

impl ConfirmationGate {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Park `action` until the user confirms or cancels
    pub fn request<F>(&self, title: impl Into<String>, message: impl Into<String>, action: F)
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        let pending = PendingConfirmation {
            title: title.into(),
            message: message.into(),
            action: Box::new(action),
        };
        if let Some(replaced) = self.state.replace_confirmation(Some(pending)) {
            tracing::debug!(title = %replaced.title, "Pending confirmation overwritten");
        }
    }

    /// Run the pending action once. Returns false if nothing was pending.
    pub fn confirm(&self) -> bool {
        // Take it out before running so the action may request a new confirmation
        match self.state.replace_confirmation(None) {
            Some(pending) => {
                tracing::debug!(title = %pending.title, "Confirmed");
                (pending.action)();
                true
            }
            None => false,
        }
    }

    /// Drop the pending action without running it
    pub fn cancel(&self) -> bool {
        self.state.replace_confirmation(None).is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.state.has_pending_confirmation()
    }
}
