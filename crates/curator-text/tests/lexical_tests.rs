use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use curator_core::traits::{Retriever, StructuredStore};
use curator_core::types::{KeywordSet, Record, ResourceKind, SourceKind};
use curator_store::SqliteStore;
use curator_text::{LexicalIndex, LexicalRetriever};

fn record(id: &str, title: &str, summary: &str) -> Record {
    Record {
        id: id.to_string(),
        url: format!("https://example.com/{id}"),
        kind: ResourceKind::Article,
        title: title.to_string(),
        summary: summary.to_string(),
        author: "Unknown".to_string(),
        published_at: Utc::now(),
        concepts: BTreeSet::new(),
        tech_stack: BTreeSet::new(),
        recommended_reason: None,
    }
}

fn corpus() -> Vec<Record> {
    vec![
        record("r1", "Building agents with LangGraph", "State machines for LLM agents."),
        record("r2", "Sourdough basics", "Flour, water and patience."),
        record("r3", "Retrieval augmented generation", "RAG pipelines with vector search and rerankers."),
    ]
}

#[test]
fn index_ranks_matching_records() {
    let index = LexicalIndex::build(&corpus()).expect("build");
    assert_eq!(index.len(), 3);

    let hits = index.search("vector search", 10).expect("search");
    assert_eq!(hits.first().map(|(_, id)| id.as_str()), Some("r3"));
    assert!(hits.iter().all(|(_, id)| id != "r2"));
}

#[test]
fn index_tolerates_query_syntax_and_case() {
    let index = LexicalIndex::build(&corpus()).expect("build");
    let hits = index.search("LANGGRAPH: (agents)", 10).expect("search");
    assert_eq!(hits.first().map(|(_, id)| id.as_str()), Some("r1"));
    assert!(index.search("the of and", 10).expect("search").is_empty());
}

#[test]
fn boolean_words_in_queries_are_plain_terms() {
    let index = LexicalIndex::build(&corpus()).expect("build");

    let hits = index.search("Why NOT RAG", 10).expect("search");
    assert_eq!(hits.first().map(|(_, id)| id.as_str()), Some("r3"));

    let hits = index.search("RAG AND sourdough", 10).expect("search");
    let ids: Vec<&str> = hits.iter().map(|(_, id)| id.as_str()).collect();
    assert!(ids.contains(&"r2") && ids.contains(&"r3"), "{ids:?}");
}

#[tokio::test]
async fn retriever_uses_expanded_query() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    for r in corpus() {
        store.insert(&r).await.expect("insert");
    }
    let retriever = LexicalRetriever::new(store);

    let none = retriever.try_search("cooking", &KeywordSet::default(), 5).await.expect("search");
    assert!(none.is_empty());

    let keywords = KeywordSet { entity_keywords: vec!["RAG".into()], topic_keywords: vec![] };
    let results = retriever.try_search("cooking", &keywords, 5).await.expect("search");
    assert_eq!(results.len(), 1);
    let top = &results[0];
    assert_eq!(top.source, SourceKind::Lexical);
    assert_eq!(top.origin, "lexical");
    assert_eq!(top.source_record_id.as_deref(), Some("r3"));
    assert_eq!(top.url.as_deref(), Some("https://example.com/r3"));
    assert!(top.text.contains("Retrieval augmented generation"));
}

#[tokio::test]
async fn empty_store_yields_nothing() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let retriever = LexicalRetriever::new(store);
    let results = retriever.search("anything", &KeywordSet::naive("anything"), 5).await;
    assert!(results.is_empty());
}
