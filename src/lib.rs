//! docchat: terminal client for a two-mode retrieval chat backend
//!
//! This library provides:
//! - A session controller with two isolated threads (knowledge base and documents)
//! - PDF upload staging with validation
//! - Single-flight request dispatch with a guaranteed-release guard
//! - Message rendering, toasts and confirmation for destructive actions
//! - An HTTP client for the backend's chat and health endpoints

pub mod backend;
pub mod config;
pub mod transport;
pub mod ui_backend;

pub use backend::{ChatBackend, HttpBackend};
pub use config::Config;
pub use ui_backend::{ChatMode, Command, ModeController};
