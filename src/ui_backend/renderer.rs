//! Message rendering
//!
//! Pure transform from a `Message` to a display `Fragment`. Inline formatting
//! runs over the whole string in a fixed order: `**bold**` becomes span
//! markers, then `*italic*` is matched across those markers, then newlines
//! become breaks. Because bold is resolved first, a lone `*` next to a `**`
//! pair can produce overlapping spans (`**a*b**c*`). The overlap is kept and
//! split at the close, it is not corrected.

use once_cell::sync::Lazy;
use regex::Regex;

use super::notifications::NotificationCenter;
use super::traits::ClipboardSink;
use super::types::{Message, Sender, Severity};

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));

/// Inline display node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    LineBreak,
}

/// Numbered entry in a message's reference block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    /// 1-based
    pub index: usize,
    pub label: String,
    /// Raw URL, copied verbatim by the copy affordance
    pub url: String,
}

/// Display fragment for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub sender: Sender,
    pub timestamp: String,
    pub body: Vec<Inline>,
    pub references: Vec<SourceReference>,
}

impl Fragment {
    /// Body flattened to text; line breaks become `\n`
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        push_plain(&self.body, &mut out);
        out
    }

    /// HTML for web hosts. All text is escaped.
    pub fn to_html(&self) -> String {
        let class = match self.sender {
            Sender::User => "message user-message",
            Sender::Ai => "message ai-message",
        };
        let mut html = format!("<div class=\"{}\"><div class=\"message-content\">", class);
        push_html(&self.body, &mut html);
        html.push_str("</div>");

        if !self.references.is_empty() {
            html.push_str("<div class=\"source-references\"><ol>");
            for reference in &self.references {
                html.push_str(&format!(
                    "<li data-index=\"{}\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>\
                     <button class=\"copy-source\" data-url=\"{}\">copy</button></li>",
                    reference.index,
                    escape_html(&reference.url),
                    escape_html(&reference.label),
                    escape_html(&reference.url),
                ));
            }
            html.push_str("</ol></div>");
        }

        html.push_str("</div>");
        html
    }
}

fn push_plain(nodes: &[Inline], out: &mut String) {
    for node in nodes {
        match node {
            Inline::Text(text) => out.push_str(text),
            Inline::Bold(children) | Inline::Italic(children) => push_plain(children, out),
            Inline::LineBreak => out.push('\n'),
        }
    }
}

fn push_html(nodes: &[Inline], out: &mut String) {
    for node in nodes {
        match node {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Bold(children) => {
                out.push_str("<strong>");
                push_html(children, out);
                out.push_str("</strong>");
            }
            Inline::Italic(children) => {
                out.push_str("<em>");
                push_html(children, out);
                out.push_str("</em>");
            }
            Inline::LineBreak => out.push_str("<br>"),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const BOLD_OPEN: char = '\u{E000}';
const BOLD_CLOSE: char = '\u{E001}';
const ITALIC_OPEN: char = '\u{E002}';
const ITALIC_CLOSE: char = '\u{E003}';

fn is_marker(c: char) -> bool {
    matches!(c, BOLD_OPEN | BOLD_CLOSE | ITALIC_OPEN | ITALIC_CLOSE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Bold,
    Italic,
}

/// Span still collecting children while the marker stream is walked
struct OpenSpan {
    kind: SpanKind,
    children: Vec<Inline>,
    /// Reopened after an overlapping close; dropped if it stays empty
    reopened: bool,
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Inline>,
    stack: Vec<OpenSpan>,
    buf: String,
}

impl TreeBuilder {
    fn current(&mut self) -> &mut Vec<Inline> {
        match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        }
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            let text = std::mem::take(&mut self.buf);
            self.current().push(Inline::Text(text));
        }
    }

    fn open(&mut self, kind: SpanKind) {
        self.flush();
        self.stack.push(OpenSpan {
            kind,
            children: Vec::new(),
            reopened: false,
        });
    }

    fn attach(&mut self, span: OpenSpan) {
        if span.reopened && span.children.is_empty() {
            return;
        }
        let node = match span.kind {
            SpanKind::Bold => Inline::Bold(span.children),
            SpanKind::Italic => Inline::Italic(span.children),
        };
        self.current().push(node);
    }

    /// Close the innermost `kind` span. Spans opened inside it are closed
    /// with it and reopened afterwards, so overlapping markers still render.
    fn close(&mut self, kind: SpanKind) {
        self.flush();
        let Some(pos) = self.stack.iter().rposition(|open| open.kind == kind) else {
            return;
        };
        let mut interrupted = Vec::new();
        while self.stack.len() > pos {
            let Some(span) = self.stack.pop() else {
                break;
            };
            if self.stack.len() > pos {
                interrupted.push(span.kind);
            }
            self.attach(span);
        }
        for kind in interrupted.into_iter().rev() {
            self.stack.push(OpenSpan {
                kind,
                children: Vec::new(),
                reopened: true,
            });
        }
    }

    fn line_break(&mut self) {
        self.flush();
        self.current().push(Inline::LineBreak);
    }

    fn finish(mut self) -> Vec<Inline> {
        self.flush();
        while let Some(span) = self.stack.pop() {
            self.attach(span);
        }
        self.root
    }
}

/// Apply the inline formatting pipeline
pub fn format_text(text: &str) -> Vec<Inline> {
    let clean: String = text.chars().filter(|c| !is_marker(*c)).collect();
    let bolded = BOLD.replace_all(&clean, |caps: &regex::Captures| {
        format!("{}{}{}", BOLD_OPEN, &caps[1], BOLD_CLOSE)
    });
    let italicized = ITALIC.replace_all(&bolded, |caps: &regex::Captures| {
        format!("{}{}{}", ITALIC_OPEN, &caps[1], ITALIC_CLOSE)
    });

    let mut builder = TreeBuilder::default();
    for c in italicized.chars() {
        match c {
            BOLD_OPEN => builder.open(SpanKind::Bold),
            ITALIC_OPEN => builder.open(SpanKind::Italic),
            BOLD_CLOSE => builder.close(SpanKind::Bold),
            ITALIC_CLOSE => builder.close(SpanKind::Italic),
            '\n' => builder.line_break(),
            _ => builder.buf.push(c),
        }
    }
    builder.finish()
}

#[derive(Debug, Clone)]
pub struct MessageRenderer {
    unknown_source_label: String,
}

impl MessageRenderer {
    pub fn new(unknown_source_label: impl Into<String>) -> Self {
        Self {
            unknown_source_label: unknown_source_label.into(),
        }
    }

    pub fn render(&self, message: &Message) -> Fragment {
        let references = match message.sender {
            Sender::Ai => message
                .source_urls
                .iter()
                .enumerate()
                .map(|(i, url)| SourceReference {
                    index: i + 1,
                    label: self.source_label(url),
                    url: url.clone(),
                })
                .collect(),
            Sender::User => Vec::new(),
        };

        Fragment {
            sender: message.sender,
            timestamp: message.timestamp.clone(),
            body: format_text(&message.content),
            references,
        }
    }

    /// Host of `url` without a leading `www.`, or the placeholder label
    pub fn source_label(&self, url: &str) -> String {
        url::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string))
            .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
            .unwrap_or_else(|| self.unknown_source_label.clone())
    }

    /// Copy a reference's raw URL and report the result as a toast
    pub fn copy_source(
        &self,
        url: &str,
        clipboard: &dyn ClipboardSink,
        notifications: &NotificationCenter,
        success_text: &str,
        failure_text: &str,
    ) -> bool {
        match clipboard.set_text(url) {
            Ok(()) => {
                notifications.toast(success_text, Severity::Success);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Clipboard write failed");
                notifications.toast(failure_text, Severity::Error);
                false
            }
        }
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new(crate::config::UiConfig::default().unknown_source_label)
    }
}
