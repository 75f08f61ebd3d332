use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use curator_core::traits::{Retriever, StructuredStore};
use curator_core::types::{KeywordSet, Record, RetrievalResult, SourceKind};

use crate::index::LexicalIndex;

/// Ranks every current record against the expanded query (original query
/// plus all extracted keywords).
pub struct LexicalRetriever {
    store: Arc<dyn StructuredStore>,
}

impl LexicalRetriever {
    pub fn new(store: Arc<dyn StructuredStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    fn kind(&self) -> SourceKind {
        SourceKind::Lexical
    }

    async fn try_search(&self, query: &str, keywords: &KeywordSet, limit: usize) -> anyhow::Result<Vec<RetrievalResult>> {
        let records = self.store.all().await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let expanded = keywords.expanded_query(query);
        let (ranked, records) = tokio::task::spawn_blocking(move || {
            let index = LexicalIndex::build(&records)?;
            let ranked = index.search(&expanded, limit)?;
            anyhow::Ok((ranked, records))
        })
        .await
        .context("lexical ranking task panicked")??;

        let by_id: HashMap<&str, &Record> = records.iter().map(|r| (r.id.as_str(), r)).collect();
        let results: Vec<RetrievalResult> = ranked
            .into_iter()
            .filter_map(|(score, id)| {
                by_id
                    .get(id.as_str())
                    .map(|r| RetrievalResult::new(SourceKind::Lexical, r.describe(), score).with_record(r))
            })
            .collect();
        debug!(corpus = records.len(), hits = results.len(), "lexical ranking done");
        Ok(results)
    }
}
