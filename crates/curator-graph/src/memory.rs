use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use curator_core::traits::GraphStore;
use curator_core::types::{Entity, EntityKey, EntityLabel, Relation, RelationKind};

#[derive(Default)]
struct EntityGraph {
    graph: DiGraph<Entity, RelationKind>,
    /// Entity key -> NodeIndex mapping for merge lookups
    index: HashMap<EntityKey, NodeIndex>,
}

/// Property graph of resources and the concepts, tech stack and authors
/// they link to, held in process memory.
#[derive(Default)]
pub struct MemoryGraphStore {
    inner: RwLock<EntityGraph>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EntityGraph>> {
        self.inner.read().map_err(|_| anyhow!("graph lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EntityGraph>> {
        self.inner.write().map_err(|_| anyhow!("graph lock poisoned"))
    }

    pub fn node_count(&self) -> usize {
        self.read().map(|g| g.graph.node_count()).unwrap_or(0)
    }

    pub fn edge_count(&self) -> usize {
        self.read().map(|g| g.graph.edge_count()).unwrap_or(0)
    }
}

fn matches(entity: &Entity, needle: &str) -> bool {
    if entity.name.to_lowercase().contains(needle) {
        return true;
    }
    entity.key.label == EntityLabel::Resource
        && entity.property("summary").is_some_and(|s| s.to_lowercase().contains(needle))
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn ping(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    async fn upsert_entity(&self, entity: &Entity) -> Result<()> {
        let mut g = self.write()?;
        match g.index.get(&entity.key).copied() {
            Some(idx) => {
                let existing = &mut g.graph[idx];
                existing.name = entity.name.clone();
                for (k, v) in &entity.properties {
                    existing.properties.insert(k.clone(), v.clone());
                }
            }
            None => {
                let idx = g.graph.add_node(entity.clone());
                g.index.insert(entity.key.clone(), idx);
            }
        }
        Ok(())
    }

    async fn upsert_relation(&self, relation: &Relation) -> Result<()> {
        let mut g = self.write()?;
        let (Some(&from), Some(&to)) = (g.index.get(&relation.from), g.index.get(&relation.to)) else {
            bail!("relation {} references a missing entity", relation.kind.as_str());
        };
        let exists = g.graph.edges_connecting(from, to).any(|e| *e.weight() == relation.kind);
        if !exists {
            g.graph.add_edge(from, to, relation.kind);
        }
        Ok(())
    }

    async fn neighbors(&self, key: &EntityKey, limit: usize) -> Result<Vec<(Relation, Entity)>> {
        let g = self.read()?;
        let Some(&idx) = g.index.get(key) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for direction in [Direction::Outgoing, Direction::Incoming] {
            for edge in g.graph.edges_directed(idx, direction) {
                let (source, target) = (&g.graph[edge.source()], &g.graph[edge.target()]);
                let other = if direction == Direction::Outgoing { target } else { source };
                let relation = Relation { from: source.key.clone(), to: target.key.clone(), kind: *edge.weight() };
                out.push((relation, other.clone()));
            }
        }
        out.sort_by(|a, b| (a.1.key.label, &a.1.name).cmp(&(b.1.key.label, &b.1.name)));
        out.truncate(limit);
        Ok(out)
    }

    async fn match_entities(&self, needle: &str, limit: usize) -> Result<Vec<Entity>> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let g = self.read()?;
        let mut found: Vec<Entity> = g.graph.node_weights().filter(|e| matches(e, &needle)).cloned().collect();
        found.sort_by(|a, b| (a.key.label, &a.name).cmp(&(b.key.label, &b.name)));
        found.truncate(limit);
        Ok(found)
    }
}
