use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use curator_core::traits::{Embedder, Retriever, VectorStore};
use curator_core::types::{KeywordSet, RetrievalResult, SourceKind};

/// Nearest chunks to the embedded query. Only the original query is
/// embedded; keyword expansion would shift it away from what the user typed.
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    fn kind(&self) -> SourceKind {
        SourceKind::Vector
    }

    async fn try_search(&self, query: &str, _keywords: &KeywordSet, limit: usize) -> Result<Vec<RetrievalResult>> {
        let embedder = Arc::clone(&self.embedder);
        let text = vec![query.to_string()];
        let mut vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&text))
            .await
            .context("query embedding task panicked")??;
        let vector = vectors.pop().context("embedder returned no vector for the query")?;

        let hits = self.store.search(&vector, limit).await?;
        debug!(hits = hits.len(), "vector search done");
        Ok(hits
            .into_iter()
            .map(|hit| {
                let p = hit.payload;
                let mut result = RetrievalResult::new(SourceKind::Vector, p.text, hit.score).with_record_id(p.record_id);
                result.url = Some(p.url).filter(|u| !u.is_empty());
                result.title = Some(p.title).filter(|t| !t.is_empty());
                result.kind = Some(p.kind);
                result
            })
            .collect())
    }
}
