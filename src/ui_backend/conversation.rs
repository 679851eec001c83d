//! Message Store - the two conversation threads
//!
//! Exactly one thread per `ChatMode` exists for the session's lifetime. The
//! threads are never merged, reordered or deduplicated.

use super::types::{ChatMode, Message};

#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    history: Vec<Message>,
    pdf: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn thread_mut(&mut self, mode: ChatMode) -> &mut Vec<Message> {
        match mode {
            ChatMode::History => &mut self.history,
            ChatMode::Pdf => &mut self.pdf,
        }
    }

    /// Append to the end of a thread
    pub fn append(&mut self, mode: ChatMode, message: Message) {
        self.thread_mut(mode).push(message);
    }

    /// Empty exactly one thread
    pub fn clear(&mut self, mode: ChatMode) {
        self.thread_mut(mode).clear();
    }

    /// Read-only view of a thread in insertion order
    pub fn list(&self, mode: ChatMode) -> &[Message] {
        match mode {
            ChatMode::History => &self.history,
            ChatMode::Pdf => &self.pdf,
        }
    }

    pub fn len(&self, mode: ChatMode) -> usize {
        self.list(mode).len()
    }

    pub fn is_empty(&self, mode: ChatMode) -> bool {
        self.list(mode).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(text: &str) -> Message {
        Message::user(text, "2024-05-01T10:00:00Z")
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = MessageStore::new();
        store.append(ChatMode::History, user("một"));
        store.append(ChatMode::History, user("hai"));
        store.append(ChatMode::History, user("một"));

        let contents: Vec<_> = store
            .list(ChatMode::History)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["một", "hai", "một"]);
    }

    #[test]
    fn test_threads_are_isolated() {
        let mut store = MessageStore::new();
        store.append(ChatMode::History, user("lịch sử"));
        store.append(ChatMode::Pdf, user("tài liệu"));

        assert_eq!(store.len(ChatMode::History), 1);
        assert_eq!(store.len(ChatMode::Pdf), 1);
        assert_eq!(store.list(ChatMode::Pdf)[0].content, "tài liệu");
    }

    #[test]
    fn test_clear_history_leaves_pdf() {
        let mut store = MessageStore::new();
        store.append(ChatMode::History, user("a"));
        store.append(ChatMode::Pdf, user("b"));
        store.append(ChatMode::Pdf, user("c"));

        store.clear(ChatMode::History);
        assert!(store.is_empty(ChatMode::History));
        assert_eq!(store.len(ChatMode::Pdf), 2);
    }

    #[test]
    fn test_clear_pdf_leaves_history() {
        let mut store = MessageStore::new();
        store.append(ChatMode::History, user("a"));
        store.append(ChatMode::Pdf, user("b"));

        store.clear(ChatMode::Pdf);
        assert!(store.is_empty(ChatMode::Pdf));
        assert_eq!(store.len(ChatMode::History), 1);
    }
}
