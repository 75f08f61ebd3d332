use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use curator_core::traits::{KeywordBackend, QueryClassifier};
use curator_core::types::{Classification, KeywordSet, Strategy};

use crate::chat::{parse_json_reply, ChatModel};

const ROUTING_PROMPT: &str = r#"You route search queries for a learning library of code repositories, articles, videos and social posts.

Pick one retrieval strategy:
1. "hybrid": simple lookups ("Python tutorials", "What is RAG?").
2. "graph": questions about relationships between things ("Prerequisites for learning Transformers", "Tools compatible with LangChain", "Evolution of LLMs").
3. "combined": needs both specific facts and broad relational context.

Reply with JSON only: {"strategy": "hybrid|graph|combined", "reasoning": "..."}"#;

const KEYWORD_PROMPT: &str = r#"Extract search keywords from the user's query.

- "entity_keywords": concrete names (products, libraries, people, organizations, models).
- "topic_keywords": abstract themes and concepts.

Keep the original language of each term. Reply with JSON only: {"entity_keywords": [...], "topic_keywords": [...]}"#;

#[derive(Debug, Deserialize)]
struct RoutingReply {
    strategy: String,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Query classifier backed by a chat model. Unknown strategy names are
/// errors; the router decides the fallback.
pub struct LlmQueryClassifier {
    model: Arc<dyn ChatModel>,
}

impl LlmQueryClassifier {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl QueryClassifier for LlmQueryClassifier {
    async fn classify(&self, query: &str) -> Result<Classification> {
        let reply = self.model.complete(ROUTING_PROMPT, &format!("Query: \"{query}\"")).await?;
        let parsed: RoutingReply = parse_json_reply(&reply)?;
        let strategy: Strategy = parsed.strategy.parse()?;
        Ok(Classification { strategy, rationale: parsed.reasoning.filter(|r| !r.trim().is_empty()) })
    }
}

pub struct LlmKeywordExtractor {
    model: Arc<dyn ChatModel>,
}

impl LlmKeywordExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl KeywordBackend for LlmKeywordExtractor {
    async fn extract(&self, query: &str) -> Result<KeywordSet> {
        let reply = self.model.complete(KEYWORD_PROMPT, query).await?;
        parse_json_reply(&reply)
    }
}
