use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use curator_core::traits::KeywordBackend;
use curator_core::types::KeywordSet;

/// Splits a query into entity and topic keywords. Never fails: a missing,
/// slow, failing or empty-handed backend degrades to whitespace tokens.
pub struct KeywordExtractor {
    backend: Option<Arc<dyn KeywordBackend>>,
    timeout: Duration,
}

impl KeywordExtractor {
    pub fn new(backend: Arc<dyn KeywordBackend>, timeout: Duration) -> Self {
        Self { backend: Some(backend), timeout }
    }

    /// Always tokenizes; used when no extraction backend is configured.
    pub fn naive() -> Self {
        Self { backend: None, timeout: Duration::ZERO }
    }

    pub async fn extract(&self, query: &str) -> KeywordSet {
        let Some(backend) = self.backend.as_ref() else {
            return KeywordSet::naive(query);
        };
        match tokio::time::timeout(self.timeout, backend.extract(query)).await {
            Ok(Ok(set)) if !set.is_empty() => {
                debug!(entities = set.entity_keywords.len(), topics = set.topic_keywords.len(), "keywords extracted");
                set
            }
            Ok(Ok(_)) => {
                warn!("keyword extractor returned nothing, tokenizing query");
                KeywordSet::naive(query)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "keyword extraction failed, tokenizing query");
                KeywordSet::naive(query)
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "keyword extraction timed out, tokenizing query");
                KeywordSet::naive(query)
            }
        }
    }
}
