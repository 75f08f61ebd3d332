use std::collections::HashMap;

use tracing::{debug, warn};

use curator_core::traits::StructuredStore;
use curator_core::types::{Record, RecordId, RetrievalResult};

/// Fill `url`, `title` and `kind` on results that carry a record id but no
/// url, using one batched store lookup. A failed lookup leaves the results
/// as they are.
pub async fn hydrate(store: &dyn StructuredStore, results: &mut [RetrievalResult]) {
    let mut missing: Vec<RecordId> = Vec::new();
    for r in results.iter().filter(|r| !r.has_url()) {
        if let Some(id) = r.source_record_id.as_ref() {
            if !missing.contains(id) {
                missing.push(id.clone());
            }
        }
    }
    if missing.is_empty() {
        return;
    }

    let records = match store.get_many(&missing).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, ids = missing.len(), "hydration lookup failed");
            return;
        }
    };
    let by_id: HashMap<&str, &Record> = records.iter().map(|r| (r.id.as_str(), r)).collect();
    let mut filled = 0usize;
    for result in results.iter_mut().filter(|r| !r.has_url()) {
        let Some(record) = result.source_record_id.as_deref().and_then(|id| by_id.get(id)) else {
            continue;
        };
        result.url = Some(record.url.clone());
        if result.title.as_deref().map_or(true, str::is_empty) {
            result.title = Some(record.title.clone());
        }
        if result.kind.is_none() {
            result.kind = Some(record.kind);
        }
        filled += 1;
    }
    debug!(requested = missing.len(), filled, "hydrated results");
}
