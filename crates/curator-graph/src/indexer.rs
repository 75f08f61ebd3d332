use anyhow::Result;
use tracing::debug;

use curator_core::traits::GraphStore;
use curator_core::types::{Entity, EntityKey, EntityLabel, Record, Relation, RelationKind};

pub const UNKNOWN_AUTHOR: &str = "Unknown";

pub fn resource_entity(record: &Record) -> Entity {
    Entity::new(EntityLabel::Resource, &record.id, &record.title)
        .with_property("url", &record.url)
        .with_property("summary", &record.summary)
        .with_property("kind", record.kind.as_str())
        .with_property("published_at", record.published_at.to_rfc3339())
}

/// Merge a record into the graph: its Resource node, then Author, Concept
/// and TechStack nodes with AUTHORED_BY, TEACHES and USES edges. Running it
/// twice for one record changes nothing.
pub async fn index_record(graph: &dyn GraphStore, record: &Record) -> Result<()> {
    let resource = resource_entity(record);
    graph.upsert_entity(&resource).await?;

    let author = match record.author.trim() {
        "" => UNKNOWN_AUTHOR,
        name => name,
    };
    let linked = std::iter::once((EntityLabel::Author, author, RelationKind::AuthoredBy))
        .chain(record.concepts.iter().map(|c| (EntityLabel::Concept, c.as_str(), RelationKind::Teaches)))
        .chain(record.tech_stack.iter().map(|t| (EntityLabel::TechStack, t.as_str(), RelationKind::Uses)));

    let mut edges = 0usize;
    for (label, name, kind) in linked {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        graph.upsert_entity(&Entity::new(label, name, name)).await?;
        graph
            .upsert_relation(&Relation {
                from: resource.key.clone(),
                to: EntityKey::new(label, name),
                kind,
            })
            .await?;
        edges += 1;
    }
    debug!(record_id = %record.id, edges, "indexed record into graph");
    Ok(())
}
