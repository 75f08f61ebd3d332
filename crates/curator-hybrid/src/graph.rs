use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use curator_core::traits::{GraphStore, Retriever};
use curator_core::types::{Entity, EntityKey, EntityLabel, KeywordSet, RetrievalResult, SourceKind};

const DIRECT_MATCH_SCORE: f32 = 1.0;
const EXPANDED_MATCH_SCORE: f32 = 0.5;

/// Matches keywords against graph entities and turns every resource it
/// reaches into a card listing its one-hop concepts and tech stack.
///
/// Resources matched by name or summary rank ahead of resources reached
/// through a matching concept, tech stack or author.
pub struct GraphRetriever {
    graph: Arc<dyn GraphStore>,
    max_neighbors: usize,
}

impl GraphRetriever {
    pub fn new(graph: Arc<dyn GraphStore>, max_neighbors: usize) -> Self {
        Self { graph, max_neighbors: max_neighbors.max(1) }
    }

    async fn describe(&self, resource: &Entity, score: f32) -> Result<RetrievalResult> {
        let mut concepts = Vec::new();
        let mut tech = Vec::new();
        for (_, neighbor) in self.graph.neighbors(&resource.key, self.max_neighbors).await? {
            match neighbor.key.label {
                EntityLabel::Concept => concepts.push(neighbor.name),
                EntityLabel::TechStack => tech.push(neighbor.name),
                EntityLabel::Resource | EntityLabel::Author => {}
            }
        }
        let mut text = format!("Resource: {}", resource.name);
        if let Some(summary) = resource.property("summary").filter(|s| !s.is_empty()) {
            text.push_str("\nSummary: ");
            text.push_str(summary);
        }
        if !concepts.is_empty() {
            text.push_str("\nConcepts: ");
            text.push_str(&concepts.join(", "));
        }
        if !tech.is_empty() {
            text.push_str("\nTech: ");
            text.push_str(&tech.join(", "));
        }

        let mut result = RetrievalResult::new(SourceKind::Graph, text, score).with_record_id(resource.key.key.clone());
        result.url = resource.property("url").filter(|u| !u.is_empty()).map(str::to_string);
        result.title = Some(resource.name.clone());
        result.kind = resource.property("kind").and_then(|k| k.parse().ok());
        Ok(result)
    }
}

#[async_trait]
impl Retriever for GraphRetriever {
    fn kind(&self) -> SourceKind {
        SourceKind::Graph
    }

    async fn try_search(&self, query: &str, keywords: &KeywordSet, limit: usize) -> Result<Vec<RetrievalResult>> {
        let mut needles = keywords.all();
        if needles.is_empty() {
            needles.push(query.trim());
        }

        let mut direct: Vec<Entity> = Vec::new();
        let mut expanded: Vec<Entity> = Vec::new();
        let mut seen: HashSet<EntityKey> = HashSet::new();
        for needle in needles.into_iter().filter(|n| !n.is_empty()) {
            for entity in self.graph.match_entities(needle, limit).await? {
                if entity.key.label == EntityLabel::Resource {
                    if seen.insert(entity.key.clone()) {
                        direct.push(entity);
                    }
                    continue;
                }
                for (_, neighbor) in self.graph.neighbors(&entity.key, self.max_neighbors).await? {
                    if neighbor.key.label == EntityLabel::Resource && seen.insert(neighbor.key.clone()) {
                        expanded.push(neighbor);
                    }
                }
            }
        }

        let mut results = Vec::new();
        let ranked = direct
            .iter()
            .map(|e| (e, DIRECT_MATCH_SCORE))
            .chain(expanded.iter().map(|e| (e, EXPANDED_MATCH_SCORE)))
            .take(limit);
        for (resource, score) in ranked {
            results.push(self.describe(resource, score).await?);
        }
        debug!(direct = direct.len(), expanded = expanded.len(), hits = results.len(), "graph search done");
        Ok(results)
    }
}
