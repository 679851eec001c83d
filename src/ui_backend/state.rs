//! Shared Session State
//!
//! One explicit structure for everything the page used to keep in module
//! globals: active mode, both threads, staged files, the in-flight guard,
//! the open menu and the pending confirmation. Cloning shares the state.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::config::UploadConfig;

use super::conversation::MessageStore;
use super::types::{
    ChatMode, FileCandidate, MenuKind, Message, RequestPhase, StagedFile, StagedFileId,
};
use super::uploads::{StageReport, UploadStager};

/// Destructive action waiting for the user's answer
pub struct PendingConfirmation {
    pub title: String,
    pub message: String,
    pub action: Box<dyn FnOnce() + Send + Sync + 'static>,
}

impl fmt::Debug for PendingConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingConfirmation")
            .field("title", &self.title)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Shared session state (thread-safe)
///
/// Shared between the controller, the dispatcher and any deferred callbacks.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<StateInner>>,
}

#[derive(Debug)]
struct StateInner {
    current_mode: ChatMode,

    // ========== Requests ==========
    request_in_flight: bool,
    request_phase: RequestPhase,
    typing_visible: bool,

    // ========== Data ==========
    store: MessageStore,
    uploads: UploadStager,

    // ========== Overlays ==========
    open_menu: Option<(u64, MenuKind)>,
    next_menu_token: u64,
    pending_confirmation: Option<PendingConfirmation>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(&UploadConfig::default())
    }
}

impl SharedState {
    /// Create a fresh session in history mode
    pub fn new(uploads: &UploadConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StateInner {
                current_mode: ChatMode::History,
                request_in_flight: false,
                request_phase: RequestPhase::Idle,
                typing_visible: false,
                store: MessageStore::new(),
                uploads: UploadStager::new(uploads),
                open_menu: None,
                next_menu_token: 0,
                pending_confirmation: None,
            })),
        }
    }

    // ========== Private Helpers ==========

    /// Get a read lock on the inner state, recovering from poison
    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, StateInner> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("SharedState read lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Get a write lock on the inner state, recovering from poison
    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, StateInner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("SharedState write lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // ========== Mode ==========

    pub fn current_mode(&self) -> ChatMode {
        self.read_inner().current_mode
    }

    pub fn set_current_mode(&self, mode: ChatMode) {
        self.write_inner().current_mode = mode;
    }

    // ========== Request Guard ==========

    pub fn request_in_flight(&self) -> bool {
        self.read_inner().request_in_flight
    }

    pub fn request_phase(&self) -> RequestPhase {
        self.read_inner().request_phase
    }

    /// Claim the session-wide guard. Returns false if a request is already out.
    pub(crate) fn try_begin_request(&self) -> bool {
        let mut inner = self.write_inner();
        if inner.request_in_flight {
            return false;
        }
        inner.request_in_flight = true;
        inner.request_phase = RequestPhase::Sending;
        true
    }

    pub(crate) fn set_request_phase(&self, phase: RequestPhase) {
        self.write_inner().request_phase = phase;
    }

    /// Release the guard and return to `Idle`
    pub(crate) fn end_request(&self) {
        let mut inner = self.write_inner();
        inner.request_in_flight = false;
        inner.request_phase = RequestPhase::Idle;
    }

    pub fn typing_visible(&self) -> bool {
        self.read_inner().typing_visible
    }

    pub fn set_typing_visible(&self, visible: bool) {
        self.write_inner().typing_visible = visible;
    }

    // ========== Messages ==========

    pub fn append_message(&self, mode: ChatMode, message: Message) {
        self.write_inner().store.append(mode, message);
    }

    pub fn clear_thread(&self, mode: ChatMode) {
        self.write_inner().store.clear(mode);
    }

    /// Copy of one thread
    pub fn messages(&self, mode: ChatMode) -> Vec<Message> {
        self.read_inner().store.list(mode).to_vec()
    }

    /// Borrow one thread without cloning it
    pub fn with_messages<F, R>(&self, mode: ChatMode, f: F) -> R
    where
        F: FnOnce(&[Message]) -> R,
    {
        f(self.read_inner().store.list(mode))
    }

    pub fn message_count(&self, mode: ChatMode) -> usize {
        self.read_inner().store.len(mode)
    }

    // ========== Uploads ==========

    pub fn stage_files(&self, candidates: Vec<FileCandidate>) -> StageReport {
        self.write_inner().uploads.add(candidates)
    }

    pub fn remove_staged_file(&self, id: &StagedFileId) -> bool {
        self.write_inner().uploads.remove(id)
    }

    pub fn clear_staged_files(&self) {
        self.write_inner().uploads.clear();
    }

    pub fn staged_files(&self) -> Vec<StagedFile> {
        self.read_inner().uploads.snapshot().to_vec()
    }

    pub fn staged_count(&self) -> usize {
        self.read_inner().uploads.len()
    }

    pub fn has_staged_files(&self) -> bool {
        !self.read_inner().uploads.is_empty()
    }

    // ========== Menus ==========

    pub fn open_menu(&self) -> Option<MenuKind> {
        self.read_inner().open_menu.map(|(_, kind)| kind)
    }

    /// Mark `kind` open and return the token that owns it
    pub(crate) fn claim_menu(&self, kind: MenuKind) -> u64 {
        let mut inner = self.write_inner();
        inner.next_menu_token += 1;
        let token = inner.next_menu_token;
        inner.open_menu = Some((token, kind));
        token
    }

    /// Close the menu if `token` still owns it
    pub(crate) fn release_menu(&self, token: u64) -> bool {
        let mut inner = self.write_inner();
        match inner.open_menu {
            Some((owner, _)) if owner == token => {
                inner.open_menu = None;
                true
            }
            _ => false,
        }
    }

    // ========== Confirmation ==========

    /// Store a pending confirmation, returning the one it replaced
    pub(crate) fn replace_confirmation(
        &self,
        pending: Option<PendingConfirmation>,
    ) -> Option<PendingConfirmation> {
        std::mem::replace(&mut self.write_inner().pending_confirmation, pending)
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.read_inner().pending_confirmation.is_some()
    }

    pub fn pending_confirmation_title(&self) -> Option<String> {
        self.read_inner()
            .pending_confirmation
            .as_ref()
            .map(|p| p.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let state = SharedState::default();
        assert_eq!(state.current_mode(), ChatMode::History);
        assert!(!state.request_in_flight());
        assert_eq!(state.request_phase(), RequestPhase::Idle);
        assert!(state.open_menu().is_none());
        assert!(!state.has_pending_confirmation());
    }

    #[test]
    fn test_guard_is_single_slot() {
        let state = SharedState::default();
        assert!(state.try_begin_request());
        assert!(!state.try_begin_request());
        assert_eq!(state.request_phase(), RequestPhase::Sending);

        state.end_request();
        assert!(!state.request_in_flight());
        assert_eq!(state.request_phase(), RequestPhase::Idle);
        assert!(state.try_begin_request());
    }

    #[test]
    fn test_clones_share_state() {
        let state = SharedState::default();
        let other = state.clone();
        other.set_current_mode(ChatMode::Pdf);
        other.append_message(ChatMode::Pdf, Message::user("x", "t"));

        assert_eq!(state.current_mode(), ChatMode::Pdf);
        assert_eq!(state.message_count(ChatMode::Pdf), 1);
        assert_eq!(state.message_count(ChatMode::History), 0);
    }

    #[test]
    fn test_stale_menu_token_does_not_close_newer_menu() {
        let state = SharedState::default();
        let first = state.claim_menu(MenuKind::Actions);
        let second = state.claim_menu(MenuKind::Actions);

        assert!(!state.release_menu(first));
        assert_eq!(state.open_menu(), Some(MenuKind::Actions));
        assert!(state.release_menu(second));
        assert!(state.open_menu().is_none());
    }
}
