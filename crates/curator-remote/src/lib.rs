//! curator-remote
//!
//! Network-facing collaborators: an OpenAI-compatible chat client, the
//! LLM-backed query classifier, keyword extractor and relevance classifier
//! built on it, and a generic HTTP content fetcher.
pub mod chat;
pub mod fetch;
pub mod relevance;
pub mod router;

pub use chat::{extract_json, parse_json_reply, ChatModel, OpenAiChat};
pub use fetch::{kind_from_url, parse_page, HttpFetcher};
pub use relevance::LlmRelevanceClassifier;
pub use router::{LlmKeywordExtractor, LlmQueryClassifier};
