use async_trait::async_trait;
use tracing::warn;

use crate::types::{
    Analysis, Classification, Entity, EntityKey, FeedbackExample, FetchedContent, InsertOutcome,
    KeywordSet, Record, RecordId, Relation, RetrievalResult, SourceKind, VectorEntry, VectorHit,
    Vote,
};

/// Embedding function shared by index time and query time.
///
/// Implementations must return L2-normalized vectors of `dim()` floats.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Authoritative record store with a unique constraint on `url`.
#[async_trait]
pub trait StructuredStore: Send + Sync {
    /// Insert a record. A url conflict is reported as `InsertOutcome::Duplicate`.
    async fn insert(&self, record: &Record) -> anyhow::Result<InsertOutcome>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<Record>>;
    /// Batch lookup; missing ids are skipped.
    async fn get_many(&self, ids: &[RecordId]) -> anyhow::Result<Vec<Record>>;
    async fn find_by_url(&self, url: &str) -> anyhow::Result<Option<Record>>;
    async fn exists_by_url(&self, url: &str) -> anyhow::Result<bool>;
    /// Case-insensitive substring match over title and summary. Records
    /// matching earlier needles come first.
    async fn search_text(&self, needles: &[String], limit: usize) -> anyhow::Result<Vec<Record>>;
    async fn all(&self) -> anyhow::Result<Vec<Record>>;
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
    async fn add_feedback(&self, record_id: &str, vote: Vote, reason: Option<&str>) -> anyhow::Result<()>;
    /// Most recent feedback with a reason, newest first.
    async fn recent_feedback(&self, vote: Vote, limit: usize) -> anyhow::Result<Vec<FeedbackExample>>;
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;
    /// Merge semantics: properties of an existing entity are overwritten key by key.
    async fn upsert_entity(&self, entity: &Entity) -> anyhow::Result<()>;
    /// Both endpoints must exist. Re-adding the same relation is a no-op.
    async fn upsert_relation(&self, relation: &Relation) -> anyhow::Result<()>;
    /// One-hop neighbours regardless of edge direction.
    async fn neighbors(&self, key: &EntityKey, limit: usize) -> anyhow::Result<Vec<(Relation, Entity)>>;
    /// Case-insensitive substring match on entity names and resource summaries.
    async fn match_entities(&self, needle: &str, limit: usize) -> anyhow::Result<Vec<Entity>>;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace entries by id.
    async fn upsert(&self, entries: &[VectorEntry]) -> anyhow::Result<()>;
    /// Cosine nearest neighbours, best first.
    async fn search(&self, vector: &[f32], limit: usize) -> anyhow::Result<Vec<VectorHit>>;
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedContent>;
}

#[async_trait]
pub trait RelevanceClassifier: Send + Sync {
    async fn classify(&self, content: &FetchedContent, examples: &[FeedbackExample]) -> anyhow::Result<Analysis>;
}

#[async_trait]
pub trait QueryClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> anyhow::Result<Classification>;
}

#[async_trait]
pub trait KeywordBackend: Send + Sync {
    async fn extract(&self, query: &str) -> anyhow::Result<KeywordSet>;
}

/// One per-source retriever.
///
/// `try_search` reports infrastructure failures; `search` is the fail-soft
/// form that logs them and yields nothing.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn try_search(&self, query: &str, keywords: &KeywordSet, limit: usize) -> anyhow::Result<Vec<RetrievalResult>>;

    async fn search(&self, query: &str, keywords: &KeywordSet, limit: usize) -> Vec<RetrievalResult> {
        match self.try_search(query, keywords, limit).await {
            Ok(results) => results,
            Err(e) => {
                warn!(retriever = %self.kind(), error = %e, "retriever failed");
                Vec::new()
            }
        }
    }
}
