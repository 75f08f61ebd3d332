use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use curator_core::chunker::StructuralChunker;
use curator_core::config::{ChunkingConfig, IngestionSettings};
use curator_core::normalizer::normalize;
use curator_core::traits::{ContentFetcher, Embedder, GraphStore, RelevanceClassifier, StructuredStore, VectorStore};
use curator_core::types::{
    Analysis, Chunk, ChunkPayload, FeedbackExample, FetchedContent, InsertOutcome, Record, RecordId, VectorEntry, Vote,
};
use curator_core::{Error, Result};
use curator_graph::{index_record, indexer::UNKNOWN_AUTHOR};

use crate::freshness::{is_stale, parse_published};
use crate::heuristic::heuristic_analysis;

/// Pipeline position of one URL; logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    New,
    Fetched,
    Analyzed,
    Rejected,
    Persisted,
    GraphIndexed,
    Chunked,
    VectorIndexed,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Stale { published: DateTime<Utc> },
    NotRelevant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub record_id: RecordId,
    pub chunks: usize,
    pub graph_indexed: bool,
    pub vector_indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A record for the url existed already, or a concurrent ingest won.
    AlreadyIngested,
    Rejected(RejectReason),
    Ingested(IngestReport),
}

struct VectorSink {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

/// Drives one URL at a time through
/// `New → Fetched → Analyzed → {Rejected | Persisted} → GraphIndexed → Chunked → VectorIndexed → Done`.
///
/// Only a fetch failure or a failing structured store surface as errors;
/// graph and vector indexing are best-effort once the record is persisted.
pub struct IngestionCoordinator {
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn StructuredStore>,
    classifier: Option<Arc<dyn RelevanceClassifier>>,
    graph: Option<Arc<dyn GraphStore>>,
    vectors: Option<VectorSink>,
    chunker: StructuralChunker,
    settings: IngestionSettings,
}

impl IngestionCoordinator {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<dyn StructuredStore>,
        chunking: ChunkingConfig,
        settings: IngestionSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            classifier: None,
            graph: None,
            vectors: None,
            chunker: StructuralChunker::new(chunking),
            settings,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn RelevanceClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_graph(mut self, graph: Arc<dyn GraphStore>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_vectors(mut self, store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        self.vectors = Some(VectorSink { store, embedder });
        self
    }

    pub async fn ingest(&self, url: &str) -> Result<IngestOutcome> {
        let url = url.trim();
        transition(url, Stage::New);
        if self.store.exists_by_url(url).await.map_err(store_error)? {
            info!(url, "already ingested, skipping fetch");
            transition(url, Stage::Done);
            return Ok(IngestOutcome::AlreadyIngested);
        }

        let fetched = self.fetcher.fetch(url).await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: format!("{e:#}"),
        })?;
        transition(url, Stage::Fetched);

        let published = fetched.published_at.as_deref().and_then(parse_published);
        if let Some(published) = published {
            if is_stale(published, Utc::now(), self.settings.recency_days) {
                info!(url, %published, window_days = self.settings.recency_days, "rejected as stale");
                transition(url, Stage::Rejected);
                return Ok(IngestOutcome::Rejected(RejectReason::Stale { published }));
            }
        } else {
            debug!(url, raw = ?fetched.published_at, "no usable publish date");
        }

        let analysis = self.analyze(&fetched).await;
        transition(url, Stage::Analyzed);
        if !analysis.relevant {
            info!(url, "rejected as not relevant");
            transition(url, Stage::Rejected);
            return Ok(IngestOutcome::Rejected(RejectReason::NotRelevant));
        }

        let record = build_record(&fetched, analysis, published.unwrap_or_else(Utc::now));
        if self.store.insert(&record).await.map_err(store_error)? == InsertOutcome::Duplicate {
            info!(url, "lost the race to a concurrent ingest of the same url");
            transition(url, Stage::Done);
            return Ok(IngestOutcome::AlreadyIngested);
        }
        transition(url, Stage::Persisted);

        let graph_indexed = self.index_graph(&record).await;
        transition(url, Stage::GraphIndexed);

        let content = normalize(&fetched, self.chunker.config().min_markup_chars);
        let chunks = self.chunker.chunk(&record, &content);
        debug!(url, chunks = chunks.len(), format = ?content.format, "chunked");
        transition(url, Stage::Chunked);

        let vector_indexed = self.index_vectors(&record, &chunks).await;
        transition(url, Stage::VectorIndexed);

        info!(url, record_id = %record.id, chunks = chunks.len(), graph_indexed, vector_indexed, "ingested");
        transition(url, Stage::Done);
        Ok(IngestOutcome::Ingested(IngestReport {
            record_id: record.id,
            chunks: chunks.len(),
            graph_indexed,
            vector_indexed,
        }))
    }

    /// Ingest several URLs, at most `ingestion.concurrency` at a time.
    /// Results come back in input order.
    pub async fn ingest_many(&self, urls: &[String]) -> Vec<Result<IngestOutcome>> {
        self.ingest_many_with(urls, |_, _| {}).await
    }

    /// Like [`ingest_many`](Self::ingest_many), calling `on_done` as each URL
    /// finishes.
    pub async fn ingest_many_with<F>(&self, urls: &[String], on_done: F) -> Vec<Result<IngestOutcome>>
    where
        F: Fn(&str, &Result<IngestOutcome>),
    {
        let mut finished: Vec<(usize, Result<IngestOutcome>)> = stream::iter(urls.iter().enumerate())
            .map(|(i, url)| async move { (i, self.ingest(url).await) })
            .buffer_unordered(self.settings.concurrency.max(1))
            .inspect(|(i, result)| on_done(&urls[*i], result))
            .collect()
            .await;
        finished.sort_by_key(|(i, _)| *i);
        finished.into_iter().map(|(_, result)| result).collect()
    }

    async fn analyze(&self, fetched: &FetchedContent) -> Analysis {
        let Some(classifier) = self.classifier.as_ref() else {
            debug!(url = %fetched.url, "no relevance classifier, using keyword heuristic");
            return heuristic_analysis(fetched, &self.settings.fallback_keywords, &self.settings.always_relevant_urls);
        };
        let examples = self.feedback_examples().await;
        match classifier.classify(fetched, &examples).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(url = %fetched.url, error = %e, "relevance classifier failed, using keyword heuristic");
                heuristic_analysis(fetched, &self.settings.fallback_keywords, &self.settings.always_relevant_urls)
            }
        }
    }

    async fn feedback_examples(&self) -> Vec<FeedbackExample> {
        let n = self.settings.feedback_examples;
        let mut examples = Vec::new();
        for vote in [Vote::Like, Vote::Dislike] {
            match self.store.recent_feedback(vote, n).await {
                Ok(found) => examples.extend(found),
                Err(e) => warn!(vote = vote.as_str(), error = %e, "could not load feedback examples"),
            }
        }
        examples
    }

    async fn index_graph(&self, record: &Record) -> bool {
        let Some(graph) = self.graph.as_ref() else {
            return false;
        };
        match index_record(graph.as_ref(), record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "graph indexing failed, record kept");
                false
            }
        }
    }

    async fn index_vectors(&self, record: &Record, chunks: &[Chunk]) -> bool {
        let Some(sink) = self.vectors.as_ref() else {
            return false;
        };
        if chunks.is_empty() {
            return true;
        }
        match embed_and_upsert(sink, record, chunks).await {
            Ok(()) => true,
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "vector indexing failed, record kept");
                false
            }
        }
    }
}

async fn embed_and_upsert(sink: &VectorSink, record: &Record, chunks: &[Chunk]) -> anyhow::Result<()> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embedder = Arc::clone(&sink.embedder);
    let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
        .await
        .context("chunk embedding task panicked")??;
    anyhow::ensure!(
        vectors.len() == chunks.len(),
        "embedder returned {} vectors for {} chunks",
        vectors.len(),
        chunks.len()
    );
    let entries: Vec<VectorEntry> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| VectorEntry {
            id: chunk.id.clone(),
            vector,
            payload: ChunkPayload {
                record_id: record.id.clone(),
                ordinal: chunk.ordinal,
                section_path: chunk.section_path.clone(),
                text: chunk.text.clone(),
                title: record.title.clone(),
                url: record.url.clone(),
                kind: record.kind,
            },
        })
        .collect();
    sink.store.upsert(&entries).await
}

fn transition(url: &str, stage: Stage) {
    debug!(url, stage = ?stage, "stage");
}

fn store_error(e: anyhow::Error) -> Error {
    Error::Store(format!("{e:#}"))
}

fn clean_set(values: Vec<String>) -> BTreeSet<String> {
    values.into_iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
}

fn build_record(fetched: &FetchedContent, analysis: Analysis, published_at: DateTime<Utc>) -> Record {
    let title = analysis
        .title
        .filter(|t| !t.trim().is_empty())
        .or_else(|| Some(fetched.title.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| fetched.url.clone());
    let summary = analysis
        .summary
        .unwrap_or_else(|| fetched.content.trim().chars().take(200).collect());
    Record {
        id: Uuid::new_v4().to_string(),
        url: fetched.url.trim().to_string(),
        kind: fetched.kind,
        title,
        summary,
        author: resolve_author(analysis.author.as_deref(), fetched.author.as_deref()),
        published_at,
        concepts: clean_set(analysis.concepts),
        tech_stack: clean_set(analysis.tech_stack),
        recommended_reason: analysis.recommended_reason,
    }
}

/// Classifier's author unless blank or "Unknown", then the page's, then "Unknown".
pub fn resolve_author(analyzed: Option<&str>, fetched: Option<&str>) -> String {
    fn known(a: Option<&str>) -> Option<&str> {
        a.map(str::trim).filter(|a| !a.is_empty() && *a != UNKNOWN_AUTHOR)
    }
    known(analyzed).or_else(|| known(fetched)).unwrap_or(UNKNOWN_AUTHOR).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_resolution_order() {
        assert_eq!(resolve_author(Some("Grace"), Some("Ada")), "Grace");
        assert_eq!(resolve_author(Some("Unknown"), Some("Ada")), "Ada");
        assert_eq!(resolve_author(Some("  "), None), "Unknown");
        assert_eq!(resolve_author(None, Some("Unknown")), "Unknown");
    }
}
