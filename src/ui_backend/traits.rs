//! Frontend Traits
//!
//! Defines the interface that rendering hosts implement. All methods take
//! `&self` so deferred callbacks can hold the surface behind an `Arc`.

use anyhow::Result;

use super::renderer::Fragment;
use super::types::{ChatMode, MenuKind, StagedFile};

/// Rendering surface driven by the session controller
pub trait UiSurface: Send + Sync {
    /// Replace the whole message view with `fragments`
    ///
    /// Nodes drawn for the previously shown thread are discarded.
    fn render_thread(&self, mode: ChatMode, fragments: &[Fragment]);

    /// Append one fragment to the visible thread
    fn append_fragment(&self, mode: ChatMode, fragment: &Fragment);

    /// Update mode-dependent input placeholder and footer
    fn set_mode_texts(&self, mode: ChatMode, prompt: &str, footer: &str);

    /// Reflect which menu, if any, is open
    fn set_open_menu(&self, menu: Option<MenuKind>);

    /// Show or hide the single typing indicator
    fn set_typing_indicator(&self, visible: bool);

    /// Scroll the message view to its latest entry
    fn scroll_to_latest(&self);

    /// Redraw the staged-file list
    fn show_staged_files(&self, files: &[StagedFile]);

    /// Surface the confirmation prompt
    fn show_confirmation(&self, title: &str, message: &str);

    fn hide_confirmation(&self);
}

/// Destination for copy-to-clipboard affordances
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}
