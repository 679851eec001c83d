//! System clipboard for the terminal host

use anyhow::{Context, Result};
use arboard::Clipboard;

use crate::ui_backend::ClipboardSink;

/// Clipboard backed by `arboard`
///
/// A handle is opened per copy; headless sessions fail the copy instead of
/// failing startup.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new().context("Clipboard not available")?;
        clipboard
            .set_text(text.to_string())
            .context("Failed to write clipboard")?;
        Ok(())
    }
}
