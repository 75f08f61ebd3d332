use std::collections::BTreeSet;

use chrono::Utc;
use curator_core::traits::GraphStore;
use curator_core::types::{Entity, EntityKey, EntityLabel, Record, Relation, RelationKind, ResourceKind};
use curator_graph::{index_record, MemoryGraphStore};

fn record(id: &str, title: &str, concepts: &[&str], stack: &[&str]) -> Record {
    Record {
        id: id.to_string(),
        url: format!("https://example.com/{id}"),
        kind: ResourceKind::Article,
        title: title.to_string(),
        summary: format!("{title} explained"),
        author: "Ada".to_string(),
        published_at: Utc::now(),
        concepts: concepts.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        tech_stack: stack.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        recommended_reason: None,
    }
}

#[tokio::test]
async fn indexing_is_idempotent() -> anyhow::Result<()> {
    let graph = MemoryGraphStore::new();
    let r = record("r1", "GraphRAG intro", &["RAG", "Knowledge Graphs"], &["Neo4j"]);
    index_record(&graph, &r).await?;
    let (nodes, edges) = (graph.node_count(), graph.edge_count());
    assert_eq!(nodes, 5, "resource, author, two concepts, one tech");
    assert_eq!(edges, 4);

    index_record(&graph, &r).await?;
    assert_eq!(graph.node_count(), nodes);
    assert_eq!(graph.edge_count(), edges);
    Ok(())
}

#[tokio::test]
async fn shared_concepts_merge_into_one_node() -> anyhow::Result<()> {
    let graph = MemoryGraphStore::new();
    index_record(&graph, &record("r1", "One", &["RAG"], &[])).await?;
    index_record(&graph, &record("r2", "Two", &["RAG"], &[])).await?;

    let rag = EntityKey::new(EntityLabel::Concept, "RAG");
    let neighbors = graph.neighbors(&rag, 10).await?;
    let titles: Vec<&str> = neighbors.iter().map(|(_, e)| e.name.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    for (rel, _) in &neighbors {
        assert_eq!(rel.kind, RelationKind::Teaches);
        assert_eq!(rel.to, rag);
    }
    Ok(())
}

#[tokio::test]
async fn neighbors_span_both_directions_and_respect_limit() -> anyhow::Result<()> {
    let graph = MemoryGraphStore::new();
    index_record(&graph, &record("r1", "Agents", &["Planning", "Tools"], &["Python"])).await?;
    let resource = EntityKey::new(EntityLabel::Resource, "r1");

    let all = graph.neighbors(&resource, 10).await?;
    let labels: Vec<EntityLabel> = all.iter().map(|(_, e)| e.key.label).collect();
    assert_eq!(
        labels,
        vec![EntityLabel::Concept, EntityLabel::Concept, EntityLabel::TechStack, EntityLabel::Author]
    );
    assert_eq!(graph.neighbors(&resource, 2).await?.len(), 2);
    assert!(graph.neighbors(&EntityKey::new(EntityLabel::Concept, "nope"), 5).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn match_is_case_insensitive_and_covers_summaries() -> anyhow::Result<()> {
    let graph = MemoryGraphStore::new();
    index_record(&graph, &record("r1", "LangGraph agents", &["Agents"], &["LangChain"])).await?;

    let by_name = graph.match_entities("langchain", 10).await?;
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].key.label, EntityLabel::TechStack);

    let by_summary = graph.match_entities("EXPLAINED", 10).await?;
    assert_eq!(by_summary.len(), 1);
    assert_eq!(by_summary[0].key.label, EntityLabel::Resource);
    assert_eq!(by_summary[0].property("url"), Some("https://example.com/r1"));

    assert!(graph.match_entities("  ", 10).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn upsert_merges_properties_and_rejects_dangling_relations() -> anyhow::Result<()> {
    let graph = MemoryGraphStore::new();
    graph.upsert_entity(&Entity::new(EntityLabel::Author, "Ada", "Ada").with_property("site", "a.dev")).await?;
    graph.upsert_entity(&Entity::new(EntityLabel::Author, "Ada", "Ada").with_property("x", "@ada")).await?;
    let found = graph.match_entities("ada", 5).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].property("site"), Some("a.dev"));
    assert_eq!(found[0].property("x"), Some("@ada"));

    let dangling = Relation {
        from: EntityKey::new(EntityLabel::Resource, "missing"),
        to: EntityKey::new(EntityLabel::Author, "Ada"),
        kind: RelationKind::AuthoredBy,
    };
    assert!(graph.upsert_relation(&dangling).await.is_err());
    graph.ping().await?;
    Ok(())
}
