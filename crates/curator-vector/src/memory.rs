use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use curator_core::traits::VectorStore;
use curator_core::types::{VectorEntry, VectorHit};

/// Brute-force cosine search over entries held in memory.
#[derive(Default)]
pub struct MemoryVectorStore {
    entries: RwLock<HashMap<String, VectorEntry>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<()> {
        let mut map = self.entries.write().map_err(|_| anyhow!("vector map lock poisoned"))?;
        for e in entries {
            map.insert(e.id.clone(), e.clone());
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        let map = self.entries.read().map_err(|_| anyhow!("vector map lock poisoned"))?;
        let mut hits: Vec<VectorHit> = map
            .values()
            .map(|e| VectorHit { id: e.id.clone(), score: cosine(vector, &e.vector), payload: e.payload.clone() })
            .collect();
        hits.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }
}
