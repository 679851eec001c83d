//! Transport layer for the terminal host

pub mod cli;
pub mod clipboard;

pub use cli::TerminalSurface;
pub use clipboard::SystemClipboard;
