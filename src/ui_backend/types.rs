//! Shared Types for UI Backend
//!
//! Common data structures used across the session controller and frontends.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::FileSource;

/// Which conversation thread (and backend endpoint) is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// General knowledge-base thread
    #[default]
    History,
    /// Thread scoped to uploaded documents
    Pdf,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::History => "history",
            ChatMode::Pdf => "pdf",
        }
    }

    pub fn all() -> [ChatMode; 2] {
        [ChatMode::History, ChatMode::Pdf]
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "history" => Ok(ChatMode::History),
            "pdf" => Ok(ChatMode::Pdf),
            other => Err(format!("unknown chat mode: {}", other)),
        }
    }
}

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// A chat message. Never mutated after it is appended to a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_urls: Vec<String>,
    /// ISO-8601
    pub timestamp: String,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender: Sender::User,
            source_urls: Vec::new(),
            timestamp: timestamp.into(),
        }
    }

    pub fn ai(
        content: impl Into<String>,
        source_urls: Vec<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            sender: Sender::Ai,
            source_urls,
            timestamp: timestamp.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Current time as an ISO-8601 string
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Opaque identifier of a staged file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StagedFileId(String);

impl StagedFileId {
    /// Millisecond timestamp joined with a short random suffix
    pub fn generate() -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            &random[..9]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StagedFileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StagedFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file picked or dropped by the user, not yet validated
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
    /// Declared MIME type
    pub mime_type: String,
    pub source: FileSource,
}

impl FileCandidate {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Bytes(Arc::from(bytes)),
        }
    }

    /// Describe a file on disk; the declared type comes from its extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();

        Ok(Self {
            mime_type: mime_from_extension(path).to_string(),
            name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") | Some("md") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// A validated file waiting to be sent with the next document query
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub id: StagedFileId,
    pub name: String,
    pub size: u64,
    pub handle: FileSource,
}

impl StagedFile {
    pub fn size_display(&self) -> String {
        format_size(self.size)
    }
}

/// Format a size in bytes to a human-readable string
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1}GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Error,
}

/// Menus that can be open over the chat view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    /// Mode picker in the header
    ModeSwitcher,
    /// Overflow menu holding the clear actions
    Actions,
}

/// Request lifecycle phase
///
/// `Succeeded` and `Failed` are only observable while the outcome is being
/// applied; every request ends back in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Sending,
    Succeeded,
    Failed,
}
