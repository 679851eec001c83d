//! Mode Controller - session orchestrator
//!
//! Entry point the host calls. Owns the active mode, wires the dispatcher,
//! renderer, toasts and confirmation gate to the rendering surface, and keeps
//! the two threads visually isolated.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::backend::ChatBackend;
use crate::config::{Config, UiConfig};

use super::commands::Command;
use super::confirmation::ConfirmationGate;
use super::dispatcher::{DispatchObserver, DispatchOutcome, RequestDispatcher};
use super::errors::ValidationError;
use super::events::AppEvent;
use super::menu::MenuSubscription;
use super::notifications::NotificationCenter;
use super::renderer::{Fragment, MessageRenderer};
use super::state::SharedState;
use super::traits::{ClipboardSink, UiSurface};
use super::types::{ChatMode, FileCandidate, MenuKind, Message, RequestPhase, StagedFileId};
use super::uploads::StageReport;

pub struct ModeController {
    state: SharedState,
    dispatcher: RequestDispatcher,
    renderer: MessageRenderer,
    notifications: NotificationCenter,
    confirmation: ConfirmationGate,
    surface: Arc<dyn UiSurface>,
    clipboard: Arc<dyn ClipboardSink>,
    menu: Mutex<Option<MenuSubscription>>,
    events: Option<mpsc::UnboundedSender<AppEvent>>,
    ui: UiConfig,
}

impl ModeController {
    pub fn new(
        config: &Config,
        backend: Arc<dyn ChatBackend>,
        surface: Arc<dyn UiSurface>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let state = SharedState::new(&config.uploads);
        let ui = config.ui.clone();

        Self {
            dispatcher: RequestDispatcher::new(backend, state.clone(), ui.fallback_message.clone()),
            renderer: MessageRenderer::new(ui.unknown_source_label.clone()),
            notifications: NotificationCenter::new(config.notifications.clone()),
            confirmation: ConfirmationGate::new(state.clone()),
            surface,
            clipboard,
            menu: Mutex::new(None),
            events: None,
            state,
            ui,
        }
    }

    /// Forward lifecycle events (including toasts) to `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.notifications = self.notifications.with_events(events.clone());
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn renderer(&self) -> &MessageRenderer {
        &self.renderer
    }

    pub fn current_mode(&self) -> ChatMode {
        self.state.current_mode()
    }

    /// Draw the initial view for the current mode
    pub fn init(&self) {
        self.switch_mode(self.state.current_mode());
    }

    fn emit(&self, event: AppEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn menu_slot(&self) -> MutexGuard<'_, Option<MenuSubscription>> {
        self.menu.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Menu slot lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // ========== Mode ==========

    /// Make `mode` the active thread and redraw it from the store
    ///
    /// Re-selecting the active mode redraws without changing any data.
    pub fn switch_mode(&self, mode: ChatMode) {
        let previous = self.state.current_mode();
        self.state.set_current_mode(mode);
        self.close_menu();

        let fragments = self.render_thread(mode);
        self.surface.render_thread(mode, &fragments);

        let (prompt, footer) = match mode {
            ChatMode::History => (&self.ui.history_prompt, &self.ui.history_footer),
            ChatMode::Pdf => (&self.ui.pdf_prompt, &self.ui.pdf_footer),
        };
        self.surface.set_mode_texts(mode, prompt, footer);
        if mode == ChatMode::Pdf {
            self.surface.show_staged_files(&self.state.staged_files());
        }

        tracing::debug!(from = %previous, to = %mode, messages = fragments.len(), "Mode switched");
        self.emit(AppEvent::ModeSwitched(mode));
        self.schedule_scroll();
    }

    /// Switch by name; unknown names are ignored
    pub fn switch_mode_str(&self, mode: &str) -> bool {
        match ChatMode::from_str(mode) {
            Ok(mode) => {
                self.switch_mode(mode);
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "Ignoring mode switch");
                false
            }
        }
    }

    fn render_thread(&self, mode: ChatMode) -> Vec<Fragment> {
        self.state.with_messages(mode, |messages| {
            messages.iter().map(|m| self.renderer.render(m)).collect()
        })
    }

    fn schedule_scroll(&self) {
        let delay = Duration::from_millis(self.ui.scroll_delay_ms);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let surface = Arc::clone(&self.surface);
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    surface.scroll_to_latest();
                });
            }
            Err(_) => self.surface.scroll_to_latest(),
        }
    }

    // ========== Messages ==========

    /// Send `text` on the active thread
    ///
    /// Validation failures are toasted and returned; nothing is appended.
    pub async fn send_message(&self, text: &str) -> Result<DispatchOutcome, ValidationError> {
        let mode = self.state.current_mode();
        let result = self.dispatcher.send(mode, text, self).await;
        if let Err(err) = &result {
            tracing::debug!(%mode, kind = ?err.kind(), "Message rejected");
            self.notifications.error(err.to_string());
        }
        result
    }

    // ========== Uploads ==========

    /// Stage candidates, toasting each rejection and one summary on success
    pub fn stage_files(&self, candidates: Vec<FileCandidate>) -> StageReport {
        let report = self.state.stage_files(candidates);

        for err in &report.rejected {
            self.notifications.error(err.to_string());
        }
        if !report.added.is_empty() {
            let text = self
                .ui
                .files_staged_toast
                .replace("{count}", &report.added.len().to_string());
            self.notifications.success(text);
        }

        tracing::info!(
            added = report.added.len(),
            rejected = report.rejected.len(),
            files = self.state.staged_count(),
            "Staged files"
        );
        self.refresh_staged_files();
        report
    }

    pub fn remove_staged_file(&self, id: &StagedFileId) -> bool {
        let removed = self.state.remove_staged_file(id);
        if removed {
            self.refresh_staged_files();
        }
        removed
    }

    pub fn clear_staged_files(&self) {
        self.state.clear_staged_files();
        self.refresh_staged_files();
    }

    fn refresh_staged_files(&self) {
        let files = self.state.staged_files();
        self.surface.show_staged_files(&files);
        self.emit(AppEvent::StagedFilesChanged { count: files.len() });
    }

    // ========== Destructive Actions ==========

    pub fn request_clear_history(&self) {
        let state = self.state.clone();
        let surface = Arc::clone(&self.surface);
        let notifications = self.notifications.clone();
        let toast = self.ui.history_cleared_toast.clone();

        self.request_confirmation(
            self.ui.clear_history_title.clone(),
            self.ui.clear_history_message.clone(),
            move || {
                state.clear_thread(ChatMode::History);
                if state.current_mode() == ChatMode::History {
                    surface.render_thread(ChatMode::History, &[]);
                }
                notifications.success(toast);
                tracing::info!("History thread cleared");
            },
        );
    }

    /// Ask to clear the document thread together with every staged file
    pub fn request_clear_documents(&self) {
        let state = self.state.clone();
        let surface = Arc::clone(&self.surface);
        let notifications = self.notifications.clone();
        let events = self.events.clone();
        let toast = self.ui.pdf_cleared_toast.clone();

        self.request_confirmation(
            self.ui.clear_pdf_title.clone(),
            self.ui.clear_pdf_message.clone(),
            move || {
                state.clear_thread(ChatMode::Pdf);
                state.clear_staged_files();
                if state.current_mode() == ChatMode::Pdf {
                    surface.render_thread(ChatMode::Pdf, &[]);
                }
                surface.show_staged_files(&[]);
                if let Some(tx) = &events {
                    let _ = tx.send(AppEvent::StagedFilesChanged { count: 0 });
                }
                notifications.success(toast);
                tracing::info!("Document thread and uploads cleared");
            },
        );
    }

    /// Clear whichever thread is active
    pub fn request_clear_active(&self) {
        match self.state.current_mode() {
            ChatMode::History => self.request_clear_history(),
            ChatMode::Pdf => self.request_clear_documents(),
        }
    }

    fn request_confirmation<F>(&self, title: String, message: String, action: F)
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.close_menu();
        self.surface.show_confirmation(&title, &message);
        self.emit(AppEvent::ConfirmationRequested {
            title: title.clone(),
            message: message.clone(),
        });
        self.confirmation.request(title, message, action);
    }

    pub fn confirm(&self) -> bool {
        let ran = self.confirmation.confirm();
        self.resolve_confirmation(ran, true);
        ran
    }

    pub fn cancel(&self) -> bool {
        let cancelled = self.confirmation.cancel();
        self.resolve_confirmation(cancelled, false);
        cancelled
    }

    fn resolve_confirmation(&self, was_pending: bool, confirmed: bool) {
        self.surface.hide_confirmation();
        if was_pending {
            self.emit(AppEvent::ConfirmationResolved { confirmed });
        }
    }

    // ========== Menus ==========

    /// Open `kind`, closing any other menu
    pub fn open_menu(&self, kind: MenuKind) {
        let subscription = MenuSubscription::acquire(&self.state, kind);
        let previous = self.menu_slot().replace(subscription);
        drop(previous);
        self.surface.set_open_menu(Some(kind));
    }

    /// Close the open menu; returns false if none was open
    pub fn close_menu(&self) -> bool {
        let previous = self.menu_slot().take();
        match previous {
            Some(subscription) => {
                drop(subscription);
                self.surface.set_open_menu(None);
                true
            }
            None => false,
        }
    }

    pub fn outside_click(&self) -> bool {
        self.close_menu()
    }

    // ========== References ==========

    /// Copy `url` to the clipboard and toast the result
    pub fn copy_source(&self, url: &str) -> bool {
        self.renderer.copy_source(
            url,
            self.clipboard.as_ref(),
            &self.notifications,
            &self.ui.copy_success_toast,
            &self.ui.copy_failed_toast,
        )
    }

    /// Copy the `index`-th (1-based) source of the latest answer with sources
    pub fn copy_source_at(&self, index: usize) -> bool {
        let mode = self.state.current_mode();
        let url = self.state.with_messages(mode, |messages| {
            messages
                .iter()
                .rev()
                .find(|m| !m.is_user() && !m.source_urls.is_empty())
                .and_then(|m| index.checked_sub(1).and_then(|i| m.source_urls.get(i)))
                .cloned()
        });

        match url {
            Some(url) => self.copy_source(&url),
            None => {
                tracing::debug!(%mode, index, "No source at index");
                self.notifications.error(self.ui.copy_failed_toast.clone());
                false
            }
        }
    }

    // ========== Commands ==========

    pub async fn handle(&self, command: Command) {
        tracing::debug!(command = command.name(), "Handling command");

        match command {
            Command::SwitchMode(mode) => {
                self.switch_mode_str(&mode);
            }
            Command::SendMessage(text) => {
                // Rejections are already toasted
                let _ = self.send_message(&text).await;
            }
            Command::StageFiles(candidates) => {
                self.stage_files(candidates);
            }
            Command::RemoveStagedFile(id) => {
                self.remove_staged_file(&id);
            }
            Command::ClearStagedFiles => self.clear_staged_files(),
            Command::RequestClearHistory => self.request_clear_history(),
            Command::RequestClearDocuments => self.request_clear_documents(),
            Command::Confirm => {
                self.confirm();
            }
            Command::Cancel => {
                self.cancel();
            }
            Command::OpenMenu(kind) => self.open_menu(kind),
            Command::CloseMenu => {
                self.close_menu();
            }
            Command::OutsideClick => {
                self.outside_click();
            }
            Command::CopySource(index) => {
                self.copy_source_at(index);
            }
        }
    }
}

impl DispatchObserver for ModeController {
    fn message_appended(&self, mode: ChatMode, message: &Message) {
        self.emit(AppEvent::MessageAppended {
            mode,
            sender: message.sender,
        });

        // The other thread's view is not on screen; it redraws on switch
        if mode == self.state.current_mode() {
            let fragment = self.renderer.render(message);
            self.surface.append_fragment(mode, &fragment);
            self.schedule_scroll();
        }
    }

    fn request_started(&self, mode: ChatMode) {
        self.state.set_typing_visible(true);
        self.surface.set_typing_indicator(true);
        self.emit(AppEvent::RequestStarted { mode });
    }

    fn request_finished(&self, mode: ChatMode, phase: RequestPhase) {
        self.state.set_typing_visible(false);
        self.surface.set_typing_indicator(false);
        self.emit(AppEvent::RequestFinished { mode, phase });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        BackendError, ChatAnswer, HealthStatus, PdfChatRequest, RagChatRequest,
    };
    use crate::ui_backend::types::{Sender, StagedFile};
    use async_trait::async_trait;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn rag_chat(&self, request: &RagChatRequest) -> Result<ChatAnswer, BackendError> {
            Ok(ChatAnswer {
                answer: format!("**{}**", request.message),
                source_urls: vec!["https://www.example.com/a".into()],
            })
        }

        async fn pdf_rag_chat(&self, _request: &PdfChatRequest) -> Result<ChatAnswer, BackendError> {
            Ok(ChatAnswer {
                answer: "pdf".into(),
                source_urls: Vec::new(),
            })
        }

        async fn health(&self) -> Result<HealthStatus, BackendError> {
            Err(BackendError::Timeout)
        }
    }

    #[derive(Default)]
    struct Surface {
        rendered: Mutex<Vec<(ChatMode, usize)>>,
        appended: Mutex<Vec<(ChatMode, String)>>,
        menus: Mutex<Vec<Option<MenuKind>>>,
        typing: Mutex<Vec<bool>>,
        confirmations: Mutex<Vec<String>>,
    }

    impl UiSurface for Surface {
        fn render_thread(&self, mode: ChatMode, fragments: &[Fragment]) {
            self.rendered.lock().unwrap().push((mode, fragments.len()));
        }

        fn append_fragment(&self, mode: ChatMode, fragment: &Fragment) {
            self.appended
                .lock()
                .unwrap()
                .push((mode, fragment.plain_text()));
        }

        fn set_mode_texts(&self, _mode: ChatMode, _prompt: &str, _footer: &str) {}

        fn set_open_menu(&self, menu: Option<MenuKind>) {
            self.menus.lock().unwrap().push(menu);
        }

        fn set_typing_indicator(&self, visible: bool) {
            self.typing.lock().unwrap().push(visible);
        }

        fn scroll_to_latest(&self) {}

        fn show_staged_files(&self, _files: &[StagedFile]) {}

        fn show_confirmation(&self, title: &str, _message: &str) {
            self.confirmations.lock().unwrap().push(title.to_string());
        }

        fn hide_confirmation(&self) {}
    }

    struct NoClipboard;

    impl ClipboardSink for NoClipboard {
        fn set_text(&self, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("no clipboard in tests")
        }
    }

    fn controller() -> (ModeController, Arc<Surface>) {
        let surface = Arc::new(Surface::default());
        let controller = ModeController::new(
            &Config::default(),
            Arc::new(EchoBackend),
            surface.clone(),
            Arc::new(NoClipboard),
        );
        (controller, surface)
    }

    #[tokio::test]
    async fn test_send_renders_into_active_thread() {
        let (controller, surface) = controller();
        controller.send_message("Bạch Đằng").await.unwrap();

        let appended = surface.appended.lock().unwrap().clone();
        assert_eq!(
            appended,
            vec![
                (ChatMode::History, "Bạch Đằng".to_string()),
                (ChatMode::History, "Bạch Đằng".to_string()),
            ]
        );
        assert_eq!(*surface.typing.lock().unwrap(), vec![true, false]);
        assert!(!controller.state().typing_visible());
    }

    #[tokio::test]
    async fn test_switch_mode_twice_is_idempotent() {
        let (controller, surface) = controller();
        controller.send_message("câu hỏi").await.unwrap();

        controller.switch_mode(ChatMode::History);
        controller.switch_mode(ChatMode::History);

        let rendered = surface.rendered.lock().unwrap().clone();
        assert_eq!(rendered, vec![(ChatMode::History, 2), (ChatMode::History, 2)]);
        assert_eq!(controller.state().message_count(ChatMode::History), 2);
    }

    #[test]
    fn test_unknown_mode_is_noop() {
        let (controller, surface) = controller();
        assert!(!controller.switch_mode_str("video"));
        assert_eq!(controller.current_mode(), ChatMode::History);
        assert!(surface.rendered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_switch_closes_open_menu() {
        let (controller, surface) = controller();
        controller.open_menu(MenuKind::ModeSwitcher);
        assert_eq!(controller.state().open_menu(), Some(MenuKind::ModeSwitcher));

        controller.switch_mode(ChatMode::Pdf);
        assert!(controller.state().open_menu().is_none());
        assert_eq!(
            *surface.menus.lock().unwrap(),
            vec![Some(MenuKind::ModeSwitcher), None]
        );
        assert!(!controller.outside_click());
    }

    #[tokio::test]
    async fn test_clear_history_waits_for_confirmation() {
        let (controller, surface) = controller();
        controller.send_message("một").await.unwrap();

        controller.request_clear_history();
        assert_eq!(controller.state().message_count(ChatMode::History), 2);
        assert_eq!(surface.confirmations.lock().unwrap().len(), 1);

        assert!(controller.cancel());
        assert_eq!(controller.state().message_count(ChatMode::History), 2);

        controller.request_clear_history();
        assert!(controller.confirm());
        assert_eq!(controller.state().message_count(ChatMode::History), 0);
        assert!(!controller.confirm());
    }

    #[tokio::test]
    async fn test_empty_message_toasts_and_appends_nothing() {
        let (controller, surface) = controller();
        let err = controller.send_message("   ").await.unwrap_err();

        assert_eq!(err, ValidationError::EmptyMessage);
        assert!(surface.appended.lock().unwrap().is_empty());
        assert_eq!(controller.notifications().active().len(), 1);
    }

    #[tokio::test]
    async fn test_copy_source_at_picks_latest_answer() {
        let (controller, _surface) = controller();
        controller.send_message("hỏi").await.unwrap();

        // clipboard always fails here, so the result is an error toast
        assert!(!controller.copy_source_at(1));
        assert!(!controller.copy_source_at(0));
        assert!(!controller.copy_source_at(2));

        let messages = controller.state().messages(ChatMode::History);
        assert_eq!(messages[1].sender, Sender::Ai);
    }
}
