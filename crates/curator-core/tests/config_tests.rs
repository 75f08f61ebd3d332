use std::fs;

use curator_core::config::{resolve_with_base, Config, Settings};
use curator_core::types::{KeywordSet, SourceKind, Strategy};
use curator_core::Error;
use tempfile::TempDir;

#[test]
fn defaults_are_valid() {
    let settings = Settings::default();
    settings.validate().expect("defaults validate");
    assert_eq!(settings.chunking.max_chars, 1000);
    assert_eq!(settings.chunking.overlap, 200);
    assert_eq!(settings.retrieval.timeout_ms, 20_000);
    assert_eq!(settings.ingestion.recency_days, 90);
    assert_eq!(settings.retrieval.routing_timeout_ms, 10_000);
    assert_eq!(settings.ingestion.always_relevant_urls, ["github.com/trending"]);
}

#[test]
fn toml_layers_override_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nmax_chars = 500\noverlap = 50\n").unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[retrieval]\ntimeout_ms = 1500\n").unwrap();

    let config = Config::load_for_env("test", tmp.path()).expect("load");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.chunking.max_chars, 500);
    assert_eq!(settings.chunking.overlap, 50);
    assert_eq!(settings.retrieval.timeout_ms, 1500);
    assert_eq!(settings.data.chunks_table, "chunks");

    let limit: usize = config.get("retrieval.default_limit").expect("get");
    assert_eq!(limit, 5);
}

#[test]
fn overlap_must_be_below_ceiling() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nmax_chars = 100\noverlap = 100\n").unwrap();
    let err = Config::load_for_env("prod", tmp.path()).err().expect("invalid");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/curator");
    assert_eq!(resolve_with_base(base, "data/x.db"), base.join("data/x.db"));
    assert_eq!(resolve_with_base(base, "/abs/x.db"), std::path::PathBuf::from("/abs/x.db"));
}

#[test]
fn strategy_names_and_active_sources() {
    assert_eq!("hybrid".parse::<Strategy>().unwrap(), Strategy::Lexical);
    assert_eq!(" GRAPH ".parse::<Strategy>().unwrap(), Strategy::Graph);
    assert!("vector".parse::<Strategy>().is_err());

    for strategy in [Strategy::Lexical, Strategy::Graph, Strategy::Combined] {
        let active = strategy.active_sources();
        assert!(active.contains(&SourceKind::Vector));
        assert!(active.contains(&SourceKind::Structured));
    }
    assert!(!Strategy::Lexical.active_sources().contains(&SourceKind::Graph));
    assert!(!Strategy::Graph.active_sources().contains(&SourceKind::Lexical));
    assert_eq!(Strategy::Combined.active_sources().len(), 4);
}

#[test]
fn keyword_set_dedups_and_expands() {
    let set = KeywordSet {
        entity_keywords: vec!["LangChain".into(), "RAG".into()],
        topic_keywords: vec!["rag".into(), " ".into(), "agents".into()],
    };
    assert_eq!(set.all(), vec!["LangChain", "RAG", "agents"]);
    assert_eq!(set.expanded_query("how to build"), "how to build LangChain RAG agents");

    let naive = KeywordSet::naive("vector  search");
    assert_eq!(naive.entity_keywords, vec!["vector", "search"]);
    assert_eq!(naive.topic_keywords, naive.entity_keywords);
    assert!(KeywordSet::default().is_empty());
}
