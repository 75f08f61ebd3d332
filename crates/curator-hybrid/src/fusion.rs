use std::collections::HashSet;
use std::hash::Hasher;

use twox_hash::XxHash64;

use curator_core::types::RetrievalResult;

/// Identity used to drop repeats across retrievers: the source record when
/// known, otherwise a hash of the text.
pub fn dedup_key(result: &RetrievalResult) -> String {
    match result.source_record_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(result.text.trim().as_bytes());
            format!("text:{:016x}", hasher.finish())
        }
    }
}

/// Interleave `lists` (already in priority order): round `i` takes element
/// `i` of every list that still has one. First occurrence of a key wins.
pub fn round_robin(lists: Vec<Vec<RetrievalResult>>, limit: usize) -> Vec<RetrievalResult> {
    let rounds = lists.iter().map(Vec::len).max().unwrap_or(0);
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for _ in 0..rounds {
        for it in &mut iters {
            if out.len() >= limit {
                return out;
            }
            let Some(candidate) = it.next() else { continue };
            if seen.insert(dedup_key(&candidate)) {
                out.push(candidate);
            }
        }
    }
    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::types::SourceKind;

    #[test]
    fn text_key_ignores_surrounding_whitespace() {
        let a = RetrievalResult::new(SourceKind::Graph, "same text", 1.0);
        let b = RetrievalResult::new(SourceKind::Vector, "  same text\n", 0.2);
        assert_eq!(dedup_key(&a), dedup_key(&b));
        assert!(dedup_key(&a).starts_with("text:"));
    }

    #[test]
    fn record_id_wins_over_text() {
        let a = RetrievalResult::new(SourceKind::Graph, "one", 1.0).with_record_id("r1");
        let b = RetrievalResult::new(SourceKind::Vector, "two", 1.0).with_record_id("r1");
        assert_eq!(dedup_key(&a), dedup_key(&b));
    }
}
