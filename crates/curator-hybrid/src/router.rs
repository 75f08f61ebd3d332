use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use curator_core::traits::{GraphStore, QueryClassifier};
use curator_core::types::Strategy;

const DEFAULT_ROUTING_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub strategy: Strategy,
    pub rationale: Option<String>,
    /// The baseline was chosen because classification or the graph store failed.
    pub fell_back: bool,
}

impl Routing {
    fn fallback(reason: impl Into<String>) -> Self {
        Self { strategy: Strategy::BASELINE, rationale: Some(reason.into()), fell_back: true }
    }
}

/// Picks the retriever subset for a query. Any failure or timeout lands on
/// the baseline strategy; routing itself never errors.
pub struct QueryRouter {
    classifier: Option<Arc<dyn QueryClassifier>>,
    graph: Option<Arc<dyn GraphStore>>,
    timeout: Duration,
}

impl QueryRouter {
    pub fn new(classifier: Option<Arc<dyn QueryClassifier>>, graph: Option<Arc<dyn GraphStore>>) -> Self {
        Self { classifier, graph, timeout: DEFAULT_ROUTING_TIMEOUT }
    }

    /// Each of classification and the graph ping gets this much time.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn route(&self, query: &str) -> Routing {
        let Some(classifier) = self.classifier.as_ref() else {
            return Routing::fallback("no query classifier configured");
        };
        let classification = match tokio::time::timeout(self.timeout, classifier.classify(query)).await {
            Ok(Ok(c)) => c,
            Ok(Err(e)) => {
                warn!(error = %e, "query classification failed, using baseline strategy");
                return Routing::fallback(format!("classification failed: {e}"));
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "query classification timed out, using baseline strategy");
                return Routing::fallback("classification timed out");
            }
        };

        if classification.strategy != Strategy::BASELINE {
            let reachable = match self.graph.as_ref() {
                Some(graph) => match tokio::time::timeout(self.timeout, graph.ping()).await {
                    Ok(pinged) => pinged.map_err(|e| e.to_string()),
                    Err(_) => Err("ping timed out".to_string()),
                },
                None => Err("no graph store configured".to_string()),
            };
            if let Err(reason) = reachable {
                warn!(wanted = classification.strategy.as_str(), reason = %reason, "graph store unavailable, using baseline strategy");
                return Routing::fallback(format!("graph store unavailable: {reason}"));
            }
        }

        info!(strategy = classification.strategy.as_str(), "query routed");
        debug!(rationale = ?classification.rationale, "routing rationale");
        Routing { strategy: classification.strategy, rationale: classification.rationale, fell_back: false }
    }
}
