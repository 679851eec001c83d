//! Toast notifications
//!
//! Each toast is an independent element with its own timers: it becomes
//! visible after a short delay, hides after the display duration and is
//! removed once the exit transition has run. Toasts never interact.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::NotificationConfig;

use super::events::AppEvent;
use super::types::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    /// Created, waiting for the entry transition
    Entering,
    Visible,
    /// Exit transition running
    Leaving,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub phase: ToastPhase,
}

#[derive(Debug, Clone)]
pub struct NotificationCenter {
    toasts: Arc<Mutex<Vec<Toast>>>,
    next_id: Arc<AtomicU64>,
    timings: NotificationConfig,
    events: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

impl NotificationCenter {
    pub fn new(timings: NotificationConfig) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            timings,
            events: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Toast list lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn emit(&self, event: AppEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Show a transient notification and return its id
    pub fn toast(&self, message: impl Into<String>, severity: Severity) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let message = message.into();
        tracing::debug!(id, ?severity, message_len = message.len(), "Toast");

        self.lock().push(Toast {
            id,
            message,
            severity,
            phase: ToastPhase::Entering,
        });

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let center = self.clone();
                handle.spawn(async move { center.run_lifecycle(id).await });
            }
            Err(_) => {
                // Without a runtime nothing can hide it later; show it and leave it
                tracing::warn!(id, "No async runtime for toast timers");
                self.show(id);
            }
        }

        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.toast(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.toast(message, Severity::Error)
    }

    async fn run_lifecycle(self, id: u64) {
        tokio::time::sleep(Duration::from_millis(self.timings.show_delay_ms)).await;
        self.show(id);

        tokio::time::sleep(Duration::from_millis(self.timings.display_ms)).await;
        if self.set_phase(id, ToastPhase::Leaving) {
            self.emit(AppEvent::ToastHidden { id });
        }

        tokio::time::sleep(Duration::from_millis(self.timings.exit_transition_ms)).await;
        self.remove(id);
    }

    fn show(&self, id: u64) {
        let shown = {
            let mut toasts = self.lock();
            toasts.iter_mut().find(|t| t.id == id).map(|toast| {
                toast.phase = ToastPhase::Visible;
                (toast.message.clone(), toast.severity)
            })
        };
        if let Some((message, severity)) = shown {
            self.emit(AppEvent::ToastShown {
                id,
                message,
                severity,
            });
        }
    }

    fn set_phase(&self, id: u64, phase: ToastPhase) -> bool {
        let mut toasts = self.lock();
        match toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) => {
                toast.phase = phase;
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: u64) {
        let removed = {
            let mut toasts = self.lock();
            let before = toasts.len();
            toasts.retain(|t| t.id != id);
            toasts.len() != before
        };
        if removed {
            self.emit(AppEvent::ToastRemoved { id });
        }
    }

    /// Toasts that still exist, in creation order
    pub fn active(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    pub fn visible(&self) -> Vec<Toast> {
        self.lock()
            .iter()
            .filter(|t| t.phase == ToastPhase::Visible)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_of(center: &NotificationCenter, id: u64) -> Option<ToastPhase> {
        center.active().into_iter().find(|t| t.id == id).map(|t| t.phase)
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_lifecycle() {
        let center = NotificationCenter::default();
        let id = center.success("Đã lưu");
        assert_eq!(phase_of(&center, id), Some(ToastPhase::Entering));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(phase_of(&center, id), Some(ToastPhase::Visible));

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(phase_of(&center, id), Some(ToastPhase::Leaving));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(phase_of(&center, id), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toasts_coexist_independently() {
        let center = NotificationCenter::default();
        let first = center.error("một");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let second = center.error("hai");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        // first has been up 3.5s, second only 2.5s
        assert_eq!(phase_of(&center, first), None);
        assert_eq!(phase_of(&center, second), Some(ToastPhase::Visible));
        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_lifecycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let center = NotificationCenter::default().with_events(tx);
        let id = center.success("xong");

        tokio::time::sleep(Duration::from_millis(4000)).await;

        assert_eq!(
            rx.recv().await,
            Some(AppEvent::ToastShown {
                id,
                message: "xong".into(),
                severity: Severity::Success
            })
        );
        assert_eq!(rx.recv().await, Some(AppEvent::ToastHidden { id }));
        assert_eq!(rx.recv().await, Some(AppEvent::ToastRemoved { id }));
    }

    #[test]
    fn test_without_runtime_toast_stays_visible() {
        let center = NotificationCenter::default();
        let id = center.success("không có runtime");
        assert_eq!(phase_of(&center, id), Some(ToastPhase::Visible));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_toast_log_omits_message_text() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            NotificationCenter::default().error("bao-cao-mat.pdf vượt quá 10MB");
        });

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("Toast"));
        assert!(text.contains("message_len="));
        assert!(!text.contains("bao-cao-mat.pdf"));
    }
}

