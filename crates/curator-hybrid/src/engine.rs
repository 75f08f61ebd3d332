use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use curator_core::config::RetrievalSettings;
use curator_core::traits::{Embedder, GraphStore, Retriever, StructuredStore, VectorStore};
use curator_core::types::{RetrievalResult, SourceKind};
use curator_core::{Error, Result};
use curator_text::LexicalRetriever;

use crate::fusion::round_robin;
use crate::graph::GraphRetriever;
use crate::hydrate::hydrate;
use crate::keywords::KeywordExtractor;
use crate::router::QueryRouter;
use crate::structured::StructuredRetriever;
use crate::vector::VectorRetriever;

/// Routes a query, fans it out to the activated retrievers in parallel,
/// waits for them up to a shared deadline, then fuses and hydrates.
pub struct RetrievalEngine {
    router: QueryRouter,
    keywords: KeywordExtractor,
    store: Arc<dyn StructuredStore>,
    retrievers: HashMap<SourceKind, Arc<dyn Retriever>>,
    per_retriever_limit: usize,
    timeout: Duration,
}

impl RetrievalEngine {
    pub fn new(router: QueryRouter, keywords: KeywordExtractor, store: Arc<dyn StructuredStore>, settings: &RetrievalSettings) -> Self {
        Self {
            router,
            keywords,
            store,
            retrievers: HashMap::new(),
            per_retriever_limit: settings.per_retriever_limit,
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    /// Registers `retriever` under its kind, replacing any earlier one.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retrievers.insert(retriever.kind(), retriever);
        self
    }

    /// All four retrievers over the given stores.
    pub fn with_standard_retrievers(
        self,
        graph: Arc<dyn GraphStore>,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: &RetrievalSettings,
    ) -> anyhow::Result<Self> {
        let store = Arc::clone(&self.store);
        Ok(self
            .with_retriever(Arc::new(LexicalRetriever::new(Arc::clone(&store))))
            .with_retriever(Arc::new(GraphRetriever::new(graph, settings.graph_max_neighbors)))
            .with_retriever(Arc::new(VectorRetriever::new(embedder, vectors)))
            .with_retriever(Arc::new(StructuredRetriever::new(store)?)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let (routing, keywords) = tokio::join!(self.router.route(query), self.keywords.extract(query));
        let keywords = Arc::new(keywords);
        let per_retriever = self.per_retriever_limit.max(limit);
        let deadline = Instant::now() + self.timeout;

        let mut tasks = Vec::new();
        for kind in routing.strategy.active_sources() {
            let Some(retriever) = self.retrievers.get(kind) else {
                debug!(retriever = %kind, "retriever not configured, skipping");
                continue;
            };
            let retriever = Arc::clone(retriever);
            let keywords = Arc::clone(&keywords);
            let query = query.to_string();
            let handle = tokio::spawn(async move { retriever.try_search(&query, &keywords, per_retriever).await });
            tasks.push((*kind, handle));
        }

        let attempted = tasks.len();
        let mut failed = 0usize;
        let mut lists: HashMap<SourceKind, Vec<RetrievalResult>> = HashMap::new();
        for (kind, mut handle) in tasks {
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(Ok(results))) => {
                    debug!(retriever = %kind, hits = results.len(), "retriever finished");
                    lists.insert(kind, results);
                }
                Ok(Ok(Err(e))) => {
                    warn!(retriever = %kind, error = %e, "retriever failed");
                    failed += 1;
                }
                Ok(Err(e)) => {
                    warn!(retriever = %kind, error = %e, "retriever task aborted");
                    failed += 1;
                }
                Err(_) => {
                    handle.abort();
                    warn!(retriever = %kind, timeout_ms = self.timeout.as_millis() as u64, "retriever timed out");
                    failed += 1;
                }
            }
        }
        if failed == attempted {
            return Err(Error::NoStoresReachable);
        }

        let ordered: Vec<Vec<RetrievalResult>> =
            SourceKind::FUSION_ORDER.iter().filter_map(|kind| lists.remove(kind)).collect();
        let mut fused = round_robin(ordered, limit);
        hydrate(self.store.as_ref(), &mut fused).await;
        info!(
            strategy = routing.strategy.as_str(),
            fell_back = routing.fell_back,
            failed,
            results = fused.len(),
            "query answered"
        );
        Ok(fused)
    }
}
