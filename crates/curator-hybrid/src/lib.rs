//! curator-hybrid
//!
//! The retrieval half of the engine: per-source retrievers, query routing,
//! keyword extraction, round-robin fusion and hydration, tied together by
//! [`RetrievalEngine`].
pub mod engine;
pub mod fusion;
pub mod graph;
pub mod hydrate;
pub mod keywords;
pub mod router;
pub mod structured;
pub mod vector;

pub use engine::RetrievalEngine;
pub use fusion::{dedup_key, round_robin};
pub use graph::GraphRetriever;
pub use hydrate::hydrate;
pub use keywords::KeywordExtractor;
pub use router::{QueryRouter, Routing};
pub use structured::StructuredRetriever;
pub use vector::VectorRetriever;
