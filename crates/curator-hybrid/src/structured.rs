use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use curator_core::traits::{Retriever, StructuredStore};
use curator_core::types::{KeywordSet, RetrievalResult, SourceKind};

/// Substring match over record titles and summaries.
///
/// When the query mixes Latin and non-Latin script ("LangChain 에이전트 튜토리얼"),
/// the Latin runs are searched as well so embedded technical terms still
/// hit.
pub struct StructuredRetriever {
    store: Arc<dyn StructuredStore>,
    latin_phrase: Regex,
}

impl StructuredRetriever {
    pub fn new(store: Arc<dyn StructuredStore>) -> Result<Self> {
        let latin_phrase = Regex::new(r"[A-Za-z][A-Za-z0-9+#.\-]*(?:\s+[A-Za-z][A-Za-z0-9+#.\-]*)*")?;
        Ok(Self { store, latin_phrase })
    }

    /// The trimmed query first, then any Latin phrases of a mixed-script query.
    pub fn needles(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        let mut needles = vec![query.to_string()];
        if mixes_scripts(query) {
            for m in self.latin_phrase.find_iter(query) {
                let phrase = m.as_str().trim_end_matches(['.', '-']).trim();
                if phrase.len() > 1 && !needles.iter().any(|n| n.eq_ignore_ascii_case(phrase)) {
                    needles.push(phrase.to_string());
                }
            }
        }
        needles.retain(|n| !n.is_empty());
        needles
    }
}

fn mixes_scripts(query: &str) -> bool {
    let latin = query.chars().any(|c| c.is_ascii_alphabetic());
    let other = query.chars().any(|c| c.is_alphabetic() && !c.is_ascii());
    latin && other
}

#[async_trait]
impl Retriever for StructuredRetriever {
    fn kind(&self) -> SourceKind {
        SourceKind::Structured
    }

    async fn try_search(&self, query: &str, _keywords: &KeywordSet, limit: usize) -> Result<Vec<RetrievalResult>> {
        let needles = self.needles(query);
        if needles.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.store.search_text(&needles, limit).await?;
        debug!(needles = needles.len(), hits = records.len(), "structured match done");
        Ok(records
            .iter()
            .enumerate()
            .map(|(rank, r)| RetrievalResult::new(SourceKind::Structured, r.describe(), 1.0 / (rank as f32 + 1.0)).with_record(r))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_detection() {
        assert!(mixes_scripts("LangChain 튜토리얼"));
        assert!(!mixes_scripts("LangChain tutorial"));
        assert!(!mixes_scripts("튜토리얼"));
    }
}
