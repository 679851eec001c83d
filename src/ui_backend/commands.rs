//! User Commands
//!
//! Defines all user actions a host can forward to the session controller.

use super::types::{FileCandidate, MenuKind, StagedFileId};

/// User commands that can be executed
///
/// These represent user actions translated from clicks, drops, menu
/// selections or typed slash commands. `ModeController::handle` applies them.
#[derive(Debug, Clone)]
pub enum Command {
    // ========== Mode ==========
    /// Switch the active thread. Unknown mode names are ignored.
    SwitchMode(String),

    // ========== Message Input ==========
    /// Send text to the active thread's endpoint
    SendMessage(String),

    // ========== Uploads ==========
    /// Stage files picked or dropped by the user
    StageFiles(Vec<FileCandidate>),

    /// Remove one staged file
    RemoveStagedFile(StagedFileId),

    /// Drop every staged file without touching the thread
    ClearStagedFiles,

    // ========== Destructive Actions ==========
    /// Ask to clear the history thread
    RequestClearHistory,

    /// Ask to clear the document thread and its staged files
    RequestClearDocuments,

    /// Accept the pending confirmation
    Confirm,

    /// Dismiss the pending confirmation
    Cancel,

    // ========== Menus ==========
    OpenMenu(MenuKind),

    CloseMenu,

    /// A click landed outside the open menu
    OutsideClick,

    // ========== References ==========
    /// Copy the n-th (1-based) source of the latest answer in the active thread
    CopySource(usize),
}

impl Command {
    /// Parse a typed slash command; plain text becomes `SendMessage`
    ///
    /// Commands that depend on host context (`/attach`, a bare `/clear`) are
    /// left to the host. Returns `None` for unknown or incomplete commands.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::SendMessage(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next()?;
        let arg = parts.next();

        match (name, arg) {
            ("mode", Some(mode)) => Some(Command::SwitchMode(mode.to_string())),
            ("detach", Some(id)) => Some(Command::RemoveStagedFile(StagedFileId::from(id))),
            ("detach-all", None) => Some(Command::ClearStagedFiles),
            ("clear", Some("pdf")) => Some(Command::RequestClearDocuments),
            ("clear", Some("history")) => Some(Command::RequestClearHistory),
            ("yes", None) => Some(Command::Confirm),
            ("no", None) => Some(Command::Cancel),
            ("menu", None) => Some(Command::OpenMenu(MenuKind::Actions)),
            ("modes", None) => Some(Command::OpenMenu(MenuKind::ModeSwitcher)),
            ("close", None) => Some(Command::CloseMenu),
            ("copy", Some(n)) => n.parse().ok().map(Command::CopySource),
            _ => None,
        }
    }

    /// Short name for logs. Never includes message text.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SwitchMode(_) => "switch_mode",
            Command::SendMessage(_) => "send_message",
            Command::StageFiles(_) => "stage_files",
            Command::RemoveStagedFile(_) => "remove_staged_file",
            Command::ClearStagedFiles => "clear_staged_files",
            Command::RequestClearHistory => "request_clear_history",
            Command::RequestClearDocuments => "request_clear_documents",
            Command::Confirm => "confirm",
            Command::Cancel => "cancel",
            Command::OpenMenu(_) => "open_menu",
            Command::CloseMenu => "close_menu",
            Command::OutsideClick => "outside_click",
            Command::CopySource(_) => "copy_source",
        }
    }
}
