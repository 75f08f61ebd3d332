//! curator-text
//!
//! Lexical retrieval: a tantivy BM25 index over record titles and summaries,
//! rebuilt in RAM from the structured store for each query.
pub mod index;
pub mod retriever;
pub mod tantivy_utils;

pub use index::LexicalIndex;
pub use retriever::LexicalRetriever;
