//! Structure-aware segmentation of normalized content into chunks.
//!
//! Structured text is split on `#`, `##` and `###` headings into
//! header-scoped sections; sections longer than the ceiling, and unstructured
//! text as a whole, go through a recursive length-bounded splitter that
//! produces overlapping windows and prefers paragraph, line, sentence and
//! word boundaries before cutting between characters. Every chunk is
//! prefixed with the record title, a truncated summary and its section path.

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::normalizer::{ContentFormat, NormalizedContent};
use crate::types::{Chunk, Record};

const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];
const MAX_SECTION_DEPTH: usize = 3;

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// A header-scoped slice of structured text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub path: Vec<String>,
    pub body: String,
}

/// Split markdown on level 1-3 headings. Headings inside fenced code blocks
/// are content; sections without a body are dropped.
pub fn split_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut body = String::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        let heading = if in_fence { None } else { parse_heading(trimmed) };
        match heading {
            Some((level, title)) => {
                push_section(&mut sections, &stack, &mut body);
                while stack.last().is_some_and(|(l, _)| *l >= level) {
                    stack.pop();
                }
                stack.push((level, title.to_string()));
            }
            None => {
                body.push_str(line);
                body.push('\n');
            }
        }
    }
    push_section(&mut sections, &stack, &mut body);
    sections
}

fn push_section(sections: &mut Vec<Section>, stack: &[(usize, String)], body: &mut String) {
    let text = std::mem::take(body);
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    sections.push(Section {
        path: stack.iter().map(|(_, title)| title.clone()).collect(),
        body: text.to_string(),
    });
}

fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > MAX_SECTION_DEPTH {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim().trim_end_matches('#').trim_end();
    if title.is_empty() {
        return None;
    }
    Some((level, title))
}

/// Recursive length-bounded splitter with a fixed overlap window.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    max_chars: usize,
    overlap: usize,
}

impl TextSplitter {
    pub fn new(max_chars: usize, overlap: usize) -> Self {
        let max_chars = max_chars.max(1);
        Self { max_chars, overlap: overlap.min(max_chars - 1) }
    }

    /// Pieces are trimmed and never longer than `max_chars`.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
            .into_iter()
            .map(|piece| piece.trim().to_string())
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let mut out = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping(text, separator) {
            if char_len(piece) <= self.max_chars {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                out.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                out.push(piece.to_string());
            } else {
                out.extend(self.split_with(piece, finer));
            }
        }
        if !fitting.is_empty() {
            out.extend(self.merge(&fitting));
        }
        out
    }

    /// Greedily packs pieces into windows; each new window starts with the
    /// last `overlap` characters' worth of pieces from the previous one.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;
        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.max_chars && !window.is_empty() {
                out.push(window.iter().map(|(p, _)| *p).collect::<String>());
                while total > self.overlap || (total + len > self.max_chars && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        if !window.is_empty() {
            out.push(window.iter().map(|(p, _)| *p).collect::<String>());
        }
        out
    }
}

fn split_keeping<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
    } else {
        text.split_inclusive(separator).collect()
    }
}

pub struct StructuralChunker {
    config: ChunkingConfig,
    splitter: TextSplitter,
}

impl StructuralChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        let splitter = TextSplitter::new(config.max_chars, config.overlap);
        Self { config, splitter }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// The summary chunk, when the record has a summary, is always first.
    pub fn chunk(&self, record: &Record, content: &NormalizedContent) -> Vec<Chunk> {
        let mut pieces: Vec<(Vec<String>, String)> = Vec::new();
        let summary = record.summary.trim();
        if !summary.is_empty() {
            pieces.push((Vec::new(), format!("Summary: {summary}")));
        }

        match content.format {
            ContentFormat::Structured => {
                for section in split_sections(&content.text) {
                    if char_len(&section.body) > self.config.max_chars {
                        for piece in self.splitter.split(&section.body) {
                            pieces.push((section.path.clone(), piece));
                        }
                    } else {
                        pieces.push((section.path, section.body));
                    }
                }
            }
            ContentFormat::Plain => {
                for piece in self.splitter.split(&content.text) {
                    pieces.push((Vec::new(), piece));
                }
            }
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(ordinal, (section_path, body))| Chunk {
                id: format!("{}:{}", record.id, ordinal),
                record_id: record.id.clone(),
                text: self.contextualize(record, &section_path, &body),
                section_path,
                ordinal,
            })
            .collect()
    }

    fn contextualize(&self, record: &Record, section_path: &[String], body: &str) -> String {
        let mut text = format!("Document Title: {}\n", record.title);
        let summary = record.summary.trim();
        if !summary.is_empty() {
            let limit = self.config.summary_prefix_chars;
            text.push_str("Document Summary: ");
            text.extend(summary.chars().take(limit));
            if char_len(summary) > limit {
                text.push_str("...");
            }
            text.push('\n');
        }
        if !section_path.is_empty() {
            text.push_str("Section Path: ");
            text.push_str(&section_path.join(" > "));
            text.push('\n');
        }
        text.push_str("\nContent:\n");
        text.push_str(body);
        text
    }
}
