//! Converts fetched content into one canonical markup form.
//!
//! Content is considered structured (markdown-like) when it comes from a
//! code host, looks like a README, or already opens with a heading. Otherwise
//! substantial HTML is converted to markdown; failing that the content is
//! handled as plain text.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::types::{FetchedContent, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    /// Markdown-like text whose headings delimit sections.
    Structured,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
    pub text: String,
    pub format: ContentFormat,
}

impl NormalizedContent {
    pub fn structured(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: ContentFormat::Structured }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: ContentFormat::Plain }
    }
}

pub fn normalize(fetched: &FetchedContent, min_markup_chars: usize) -> NormalizedContent {
    if looks_structured(fetched) {
        return NormalizedContent::structured(fetched.content.clone());
    }
    if let Some(markup) = fetched
        .raw_markup
        .as_deref()
        .filter(|m| m.chars().count() > min_markup_chars)
    {
        let markdown = html_to_markdown(markup);
        if !markdown.trim().is_empty() {
            debug!(url = %fetched.url, chars = markdown.len(), "converted markup to markdown");
            return NormalizedContent::structured(markdown);
        }
        debug!(url = %fetched.url, "markup produced no text, using plain content");
    }
    NormalizedContent::plain(fetched.content.clone())
}

pub fn looks_structured(fetched: &FetchedContent) -> bool {
    fetched.kind == ResourceKind::Code
        || fetched.url.to_lowercase().contains("readme")
        || fetched.content.trim_start().starts_with('#')
}

/// Render HTML as markdown: headings, paragraphs, lists, links and code
/// survive; images and non-content elements are dropped.
pub fn html_to_markdown(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());
    let mut writer = MarkdownWriter::default();
    writer.walk(root);
    writer.finish()
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
    line: String,
    pending_space: bool,
    list_depth: usize,
    open_items: usize,
    in_item_run: bool,
}

impl MarkdownWriter {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                self.push_text(text);
            } else if let Some(child) = ElementRef::wrap(child) {
                self.visit(child);
            }
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();
        match tag {
            "script" | "style" | "noscript" | "template" | "svg" | "nav" | "head" | "img"
            | "picture" | "iframe" | "button" | "form" => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(tag.as_bytes()[1] - b'0');
                let title = collapsed_text(element);
                if !title.is_empty() {
                    self.flush_block();
                    self.emit_block(&format!("{} {}", "#".repeat(level), title));
                }
            }
            "ul" | "ol" => {
                self.flush_block();
                self.list_depth += 1;
                self.walk(element);
                self.list_depth -= 1;
                self.flush_block();
            }
            "li" => {
                self.flush_item();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.line.push_str(&indent);
                self.line.push_str("- ");
                self.pending_space = false;
                self.open_items += 1;
                self.walk(element);
                self.open_items -= 1;
                self.flush_item();
            }
            "pre" => {
                self.flush_block();
                let code: String = element.text().collect();
                let code = code.trim_matches('\n');
                if !code.trim().is_empty() {
                    self.emit_block(&format!("```\n{code}\n```"));
                }
            }
            "code" => {
                let code = collapsed_text(element);
                if !code.is_empty() {
                    self.push_inline(&format!("`{code}`"));
                }
            }
            "a" => {
                let label = collapsed_text(element);
                let href = element.value().attr("href").map(str::trim).unwrap_or_default();
                let linkable = !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:");
                match (label.is_empty(), linkable) {
                    (true, _) => {}
                    (false, true) => self.push_inline(&format!("[{label}]({href})")),
                    (false, false) => self.push_inline(&label),
                }
            }
            "br" => {
                self.line.push('\n');
                self.pending_space = false;
            }
            "blockquote" => {
                self.flush_block();
                let quote = collapsed_text(element);
                if !quote.is_empty() {
                    self.emit_block(&format!("> {quote}"));
                }
            }
            "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "table" | "tr"
            | "figure" | "figcaption" => {
                self.flush_block();
                self.walk(element);
                self.flush_block();
            }
            _ => self.walk(element),
        }
    }

    fn push_text(&mut self, text: &str) {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            self.pending_space |= !text.is_empty();
            return;
        }
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        self.push_inline(&words.join(" "));
        self.pending_space = text.ends_with(char::is_whitespace);
    }

    fn push_inline(&mut self, fragment: &str) {
        if self.pending_space && !self.line.is_empty() && !self.line.ends_with([' ', '\n']) {
            self.line.push(' ');
        }
        self.line.push_str(fragment);
        self.pending_space = false;
    }

    /// Blocks nested in a list item stay on the item's line.
    fn flush_block(&mut self) {
        if self.open_items > 0 {
            self.pending_space = true;
            return;
        }
        let line = std::mem::take(&mut self.line);
        self.pending_space = false;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            self.emit_block(trimmed);
        }
    }

    fn flush_item(&mut self) {
        let line = std::mem::take(&mut self.line);
        self.pending_space = false;
        let item = line.trim_end();
        if item.trim().is_empty() || item.trim() == "-" {
            return;
        }
        if !self.out.is_empty() {
            self.out.push_str(if self.in_item_run { "\n" } else { "\n\n" });
        }
        self.out.push_str(item);
        self.in_item_run = true;
    }

    fn emit_block(&mut self, block: &str) {
        if self.open_items > 0 {
            self.pending_space = true;
            self.push_inline(block);
            return;
        }
        if !self.out.is_empty() {
            self.out.push_str("\n\n");
        }
        self.out.push_str(block);
        self.in_item_run = false;
    }

    fn finish(mut self) -> String {
        self.open_items = 0;
        self.flush_block();
        self.out
    }
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    let raw: Vec<&str> = element.text().collect();
    raw.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}
