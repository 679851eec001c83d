//! CLI transport for direct terminal interaction
//!
//! A line-oriented host: `TerminalSurface` draws what the controller asks
//! for, and `run_chat` turns typed lines into controller commands.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::backend::{ChatBackend, HttpBackend};
use crate::config::Config;
use crate::ui_backend::{
    AppEvent, ChatMode, Command, FileCandidate, Fragment, Inline, MenuKind, ModeController,
    Sender, Severity, StagedFile, UiSurface,
};

use super::clipboard::SystemClipboard;

/// Rendering surface that prints to a terminal
pub struct TerminalSurface {
    out: Mutex<Box<dyn Write + Send>>,
    prompt: Mutex<String>,
}

impl TerminalSurface {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            prompt: Mutex::new(String::new()),
        }
    }

    fn out(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn print(&self, text: &str) {
        let mut out = self.out();
        // A closed stdout is not worth crashing the session over
        if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
            tracing::debug!(error = %e, "Terminal write failed");
        }
    }

    /// Placeholder text for the current mode
    pub fn prompt(&self) -> String {
        self.prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Terminal rendering of one fragment
pub fn format_fragment(fragment: &Fragment) -> String {
    let who = match fragment.sender {
        Sender::User => "Bạn".cyan().bold(),
        Sender::Ai => "AI".green().bold(),
    };

    let mut text = format!("{} {}\n  ", who, fragment.timestamp.dimmed());
    push_inline(&fragment.body, &mut text, false, false);

    if !fragment.references.is_empty() {
        text.push('\n');
        for reference in &fragment.references {
            text.push_str(&format!(
                "\n  [{}] {} {}",
                reference.index,
                reference.label.bold(),
                reference.url.dimmed()
            ));
        }
    }
    text
}

fn push_inline(nodes: &[Inline], out: &mut String, bold: bool, italic: bool) {
    for node in nodes {
        match node {
            Inline::Text(text) => {
                let styled = match (bold, italic) {
                    (true, true) => text.bold().italic().to_string(),
                    (true, false) => text.bold().to_string(),
                    (false, true) => text.italic().to_string(),
                    (false, false) => text.clone(),
                };
                out.push_str(&styled);
            }
            Inline::Bold(children) => push_inline(children, out, true, italic),
            Inline::Italic(children) => push_inline(children, out, bold, true),
            Inline::LineBreak => out.push_str("\n  "),
        }
    }
}

impl UiSurface for TerminalSurface {
    fn render_thread(&self, mode: ChatMode, fragments: &[Fragment]) {
        self.print(&format!("\n{}", format!("══ {} ══", mode).bold().cyan()));
        for fragment in fragments {
            self.print(&format_fragment(fragment));
        }
    }

    fn append_fragment(&self, _mode: ChatMode, fragment: &Fragment) {
        self.print(&format_fragment(fragment));
    }

    fn set_mode_texts(&self, _mode: ChatMode, prompt: &str, footer: &str) {
        *self
            .prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = prompt.to_string();
        self.print(&footer.dimmed().to_string());
    }

    fn set_open_menu(&self, menu: Option<MenuKind>) {
        match menu {
            Some(MenuKind::ModeSwitcher) => {
                let modes: Vec<_> = ChatMode::all().iter().map(|m| m.as_str()).collect();
                self.print(&format!("{} /mode <{}>", "Chế độ:".bold(), modes.join("|")));
            }
            Some(MenuKind::Actions) => {
                self.print(&format!(
                    "{} /clear  /files  /detach <id>  /detach-all  /close",
                    "Thao tác:".bold()
                ));
            }
            None => {}
        }
    }

    fn set_typing_indicator(&self, visible: bool) {
        if visible {
            self.print(&"AI đang trả lời...".dimmed().italic().to_string());
        }
    }

    fn scroll_to_latest(&self) {
        let _ = self.out().flush();
    }

    fn show_staged_files(&self, files: &[StagedFile]) {
        if files.is_empty() {
            self.print(&"Chưa có tệp PDF nào".dimmed().to_string());
            return;
        }
        for file in files {
            self.print(&format!(
                "  {} {} {}",
                file.id.as_str().dimmed(),
                file.name,
                file.size_display().dimmed()
            ));
        }
    }

    fn show_confirmation(&self, title: &str, message: &str) {
        self.print(&format!(
            "{}\n{}\n{}",
            title.bold().yellow(),
            message,
            "(/yes để xác nhận, /no để hủy)".dimmed()
        ));
    }

    fn hide_confirmation(&self) {}
}

/// Print toasts as they become visible
async fn print_events(surface: Arc<TerminalSurface>, mut rx: mpsc::UnboundedReceiver<AppEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            AppEvent::ToastShown {
                message, severity, ..
            } => {
                let line = match severity {
                    Severity::Success => format!("✓ {}", message).green(),
                    Severity::Error => format!("✗ {}", message).red(),
                };
                surface.print(&line.to_string());
            }
            other => tracing::trace!(event = ?other, "Event"),
        }
    }
}

fn print_help(surface: &TerminalSurface) {
    surface.print(&"Lệnh:".bold().to_string());
    for (cmd, desc) in [
        ("/mode <history|pdf>", "chuyển chế độ"),
        ("/attach <tệp>...", "thêm tệp PDF"),
        ("/detach <id>", "bỏ một tệp"),
        ("/files", "liệt kê tệp đã thêm"),
        ("/clear", "xóa cuộc trò chuyện hiện tại"),
        ("/yes, /no", "xác nhận hoặc hủy"),
        ("/copy <n>", "sao chép nguồn thứ n"),
        ("/menu", "mở menu thao tác"),
        ("/quit", "thoát"),
    ] {
        surface.print(&format!("  {:<22} {}", cmd.green(), desc));
    }
}

/// Read candidates for `/attach`, reporting unreadable paths
fn read_candidates(surface: &TerminalSurface, paths: &[&str]) -> Vec<FileCandidate> {
    paths
        .iter()
        .filter_map(|path| match FileCandidate::from_path(Path::new(path)) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                surface.print(&format!("✗ {}: {}", path, e).red().to_string());
                None
            }
        })
        .collect()
}

/// What the REPL does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineAction {
    Continue,
    Quit,
}

/// Act on one typed line. Sends run on `sends` so the prompt stays live
/// while a request is in flight.
async fn handle_line(
    controller: &Arc<ModeController>,
    surface: &TerminalSurface,
    line: &str,
    sends: &mut JoinSet<()>,
) -> LineAction {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["/quit"] | ["/exit"] => return LineAction::Quit,
        ["/help"] => print_help(surface),
        ["/files"] => surface.show_staged_files(&controller.state().staged_files()),
        ["/clear"] => controller.request_clear_active(),
        ["/attach"] => surface.print(&"/attach <tệp>...".dimmed().to_string()),
        ["/attach", paths @ ..] => {
            let candidates = read_candidates(surface, paths);
            if !candidates.is_empty() {
                controller.handle(Command::StageFiles(candidates)).await;
            }
        }
        _ => match Command::parse(line) {
            Some(command @ Command::SendMessage(_)) => {
                let controller = Arc::clone(controller);
                sends.spawn(async move { controller.handle(command).await });
            }
            Some(command) => controller.handle(command).await,
            None => surface.print(&format!("Lệnh không hợp lệ: {}", line).red().to_string()),
        },
    }
    LineAction::Continue
}

fn log_send_exit(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if !e.is_cancelled() {
            tracing::warn!(error = %e, "Send task failed");
        }
    }
}

/// Run interactive chat mode
pub async fn run_chat(config: Config, mode: Option<ChatMode>) -> Result<()> {
    let backend: Arc<dyn ChatBackend> = Arc::new(
        HttpBackend::from_config(&config).context("Failed to create backend client")?,
    );
    let surface = Arc::new(TerminalSurface::stdout());
    let (tx, rx) = mpsc::unbounded_channel();

    let controller = Arc::new(
        ModeController::new(
            &config,
            backend,
            surface.clone(),
            Arc::new(SystemClipboard),
        )
        .with_events(tx),
    );
    let printer = tokio::spawn(print_events(surface.clone(), rx));

    tracing::info!(base_url = %config.base_url(), "Starting chat session");
    surface.print(&format!("{} {}", "docchat".bold().cyan(), config.base_url().dimmed()));
    surface.print(&"Gõ /help để xem các lệnh".dimmed().to_string());

    if let Some(mode) = mode {
        controller.state().set_current_mode(mode);
    }
    controller.init();

    let mut sends = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        {
            let mut out = surface.out();
            write!(out, "{} ", format!("{} >", controller.current_mode()).bold())?;
            out.flush()?;
        }

        tokio::select! {
            Some(result) = sends.join_next(), if !sends.is_empty() => log_send_exit(result),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // End of input: let the request in flight land first
                    while let Some(result) = sends.join_next().await {
                        log_send_exit(result);
                    }
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if handle_line(&controller, &surface, line, &mut sends).await == LineAction::Quit {
                    // Dropping the send releases the in-flight guard
                    sends.abort_all();
                    break;
                }
            }
        }
    }

    // Pending toast timers keep the channel open
    printer.abort();
    surface.print("Tạm biệt!");
    Ok(())
}

/// Check backend health and print per-service status
pub async fn run_health(config: &Config) -> Result<()> {
    let backend = HttpBackend::from_config(config).context("Failed to create backend client")?;
    let health = backend
        .health()
        .await
        .with_context(|| format!("Health check failed for {}", backend.base_url()))?;

    println!("{} {}", "Backend:".bold(), backend.base_url());
    println!("{} {}", "Status:".bold(), health.status);
    for (service, up) in &health.services {
        let mark = if *up { "✓".green() } else { "✗".red() };
        println!("  {} {}", mark, service);
    }

    if !health.is_healthy() {
        anyhow::bail!("Backend reports unhealthy status: {}", health.status);
    }
    Ok(())
}

/// Print the config path, write defaults, or dump the effective config
pub fn run_config(config: &Config, path: bool, init: bool) -> Result<()> {
    let config_path = Config::config_path()?;

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            anyhow::bail!("Config file already exists: {}", config_path.display());
        }
        Config::default().save()?;
        println!("{} {}", "✓".green(), config_path.display());
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
