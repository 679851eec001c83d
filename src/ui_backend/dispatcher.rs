//! Request Dispatcher - single-flight backend calls
//!
//! Issues one of the two request shapes, appends the exchange to the thread
//! that was active at dispatch time, and releases the session-wide guard on
//! every exit path.

use std::sync::Arc;

use crate::backend::{ChatBackend, PdfChatRequest, RagChatRequest, UploadPart};

use super::errors::ValidationError;
use super::state::SharedState;
use super::types::{now_timestamp, ChatMode, Message, RequestPhase};

/// Hooks the dispatcher calls while a request runs
pub trait DispatchObserver: Send + Sync {
    fn message_appended(&self, _mode: ChatMode, _message: &Message) {}

    /// Called once the user message is in the thread
    fn request_started(&self, _mode: ChatMode) {}

    /// Called exactly once per acquired guard, from its drop
    fn request_finished(&self, _mode: ChatMode, _phase: RequestPhase) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// How a dispatched request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The backend's answer was appended
    Answered,
    /// The fallback message was appended in place of an answer
    Fallback,
}

/// Holds the in-flight guard; releasing it is tied to drop
struct InFlightGuard<'a> {
    state: &'a SharedState,
    observer: &'a dyn DispatchObserver,
    mode: ChatMode,
    phase: RequestPhase,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(
        state: &'a SharedState,
        observer: &'a dyn DispatchObserver,
        mode: ChatMode,
    ) -> Option<Self> {
        if !state.try_begin_request() {
            return None;
        }
        Some(Self {
            state,
            observer,
            mode,
            // Anything that exits without reporting counts as a failure
            phase: RequestPhase::Failed,
        })
    }

    fn finish(&mut self, phase: RequestPhase) {
        self.phase = phase;
        self.state.set_request_phase(phase);
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.end_request();
        self.observer.request_finished(self.mode, self.phase);
    }
}

pub struct RequestDispatcher {
    backend: Arc<dyn ChatBackend>,
    state: SharedState,
    fallback_message: String,
}

impl RequestDispatcher {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        state: SharedState,
        fallback_message: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            state,
            fallback_message: fallback_message.into(),
        }
    }

    /// Send `text` to the endpoint for `mode`
    ///
    /// Validation failures return before any state change or network call.
    /// Both the user message and the reply land in `mode`'s thread, whatever
    /// mode is active when the reply arrives.
    pub async fn send(
        &self,
        mode: ChatMode,
        text: &str,
        observer: &dyn DispatchObserver,
    ) -> Result<DispatchOutcome, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if self.state.request_in_flight() {
            return Err(ValidationError::Busy);
        }
        if mode == ChatMode::Pdf && !self.state.has_staged_files() {
            return Err(ValidationError::NoDocuments);
        }

        let mut guard =
            InFlightGuard::acquire(&self.state, observer, mode).ok_or(ValidationError::Busy)?;

        let timestamp = now_timestamp();
        self.append(mode, Message::user(text, timestamp.clone()), observer);
        observer.request_started(mode);

        tracing::info!(%mode, message_len = text.len(), "Dispatching chat request");

        let result = match mode {
            ChatMode::History => {
                let request = RagChatRequest {
                    message: text.to_string(),
                    timestamp,
                };
                self.backend.rag_chat(&request).await
            }
            ChatMode::Pdf => {
                let files = self
                    .state
                    .staged_files()
                    .into_iter()
                    .map(|f| UploadPart {
                        name: f.name,
                        source: f.handle,
                    })
                    .collect();
                let request = PdfChatRequest {
                    message: text.to_string(),
                    timestamp,
                    files,
                };
                self.backend.pdf_rag_chat(&request).await
            }
        };

        let outcome = match result {
            Ok(answer) => {
                tracing::info!(
                    %mode,
                    answer_len = answer.answer.len(),
                    sources = answer.source_urls.len(),
                    "Chat request succeeded"
                );
                guard.finish(RequestPhase::Succeeded);
                self.append(
                    mode,
                    Message::ai(answer.answer, answer.source_urls, now_timestamp()),
                    observer,
                );
                DispatchOutcome::Answered
            }
            Err(err) => {
                tracing::warn!(
                    %mode,
                    error = %err,
                    transport = err.is_transport(),
                    "Chat request failed, showing fallback"
                );
                guard.finish(RequestPhase::Failed);
                self.append(
                    mode,
                    Message::ai(self.fallback_message.clone(), Vec::new(), now_timestamp()),
                    observer,
                );
                DispatchOutcome::Fallback
            }
        };

        drop(guard);
        Ok(outcome)
    }

    fn append(&self, mode: ChatMode, message: Message, observer: &dyn DispatchObserver) {
        self.state.append_message(mode, message.clone());
        observer.message_appended(mode, &message);
    }
}
