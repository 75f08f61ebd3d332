use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use curator_core::traits::RelevanceClassifier;
use curator_core::types::{Analysis, FeedbackExample, FetchedContent, Vote};

use crate::chat::{parse_json_reply, ChatModel};

pub const MAX_CONTENT_CHARS: usize = 3000;

const BASE_PROMPT: &str = r#"You filter technical content for a reader interested in AI application development: agents, RAG, LLM engineering, LangChain, LlamaIndex, model APIs and multi-agent systems.

Reject content that is mainly about:
- pure machine learning theory or math-heavy papers
- model architecture research without an application angle
- general data science, statistics or analytics
- low-level GPU optimization unrelated to inference serving
- general web development unrelated to AI integration"#;

const OUTPUT_PROMPT: &str = r#"If the content does NOT match, reply {"relevant": false}.

If it matches, reply with JSON:
{"relevant": true,
 "title": "a concise descriptive title (required for social posts that lack one)",
 "summary": "a concise summary",
 "recommended_reason": "why this is worth reading for an AI application developer",
 "concepts": ["main technical concepts"],
 "tech_stack": ["languages, frameworks and tools involved"],
 "author": "main author, or Unknown"}"#;

#[derive(Debug, Deserialize)]
struct RelevanceReply {
    #[serde(alias = "is_ai_related", alias = "is_relevant")]
    relevant: bool,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    recommended_reason: Option<String>,
    #[serde(default)]
    concepts: Vec<String>,
    #[serde(default)]
    tech_stack: Vec<String>,
    #[serde(default)]
    author: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl From<RelevanceReply> for Analysis {
    fn from(r: RelevanceReply) -> Self {
        if !r.relevant {
            return Analysis::rejected();
        }
        Analysis {
            relevant: true,
            title: non_empty(r.title),
            summary: non_empty(r.summary),
            concepts: r.concepts,
            tech_stack: r.tech_stack,
            recommended_reason: non_empty(r.recommended_reason),
            author: non_empty(r.author),
        }
    }
}

/// Few-shot relevance classifier: past likes and dislikes with the user's
/// reasons are shown to the model ahead of the content.
pub struct LlmRelevanceClassifier {
    model: Arc<dyn ChatModel>,
}

impl LlmRelevanceClassifier {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

pub fn system_prompt(examples: &[FeedbackExample]) -> String {
    let mut prompt = String::from(BASE_PROMPT);
    let likes: Vec<&FeedbackExample> = examples.iter().filter(|e| e.vote == Vote::Like).collect();
    let dislikes: Vec<&FeedbackExample> = examples.iter().filter(|e| e.vote == Vote::Dislike).collect();
    if !likes.is_empty() || !dislikes.is_empty() {
        prompt.push_str("\n\nUser preferences (use these to judge what the reader values):\n");
        for (heading, group) in [("Positive examples (keep)", likes), ("Negative examples (avoid)", dislikes)] {
            if group.is_empty() {
                continue;
            }
            let _ = writeln!(prompt, "\n[{heading}]");
            for e in group {
                let _ = writeln!(prompt, "- Title: {}\n  User reason: {}", e.title, e.reason);
            }
        }
    }
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_PROMPT);
    prompt
}

pub fn user_message(content: &FetchedContent) -> String {
    let mut msg = format!("Title: {}\n", content.title);
    if let Some(author) = content.author.as_deref().filter(|a| !a.is_empty() && *a != "Unknown") {
        let _ = writeln!(msg, "Extracted author: {author}");
    }
    let _ = writeln!(msg, "Type: {}", content.kind);
    let _ = writeln!(msg, "URL: {}\n", content.url);
    msg.extend(content.content.chars().take(MAX_CONTENT_CHARS));
    msg
}

#[async_trait]
impl RelevanceClassifier for LlmRelevanceClassifier {
    async fn classify(&self, content: &FetchedContent, examples: &[FeedbackExample]) -> Result<Analysis> {
        let reply = self.model.complete(&system_prompt(examples), &user_message(content)).await?;
        let parsed: RelevanceReply = parse_json_reply(&reply)?;
        debug!(url = %content.url, relevant = parsed.relevant, "relevance verdict");
        Ok(parsed.into())
    }
}
