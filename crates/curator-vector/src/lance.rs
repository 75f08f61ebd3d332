use anyhow::{bail, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use curator_core::traits::VectorStore;
use curator_core::types::{ChunkPayload, VectorEntry, VectorHit};

use crate::schema::build_chunk_schema;
use crate::table::{float32_column, int32_column, open_db, string_column, table_exists};

/// Chunk vectors in a LanceDB table, searched by cosine distance.
pub struct LanceVectorStore {
    db: Connection,
    table_name: String,
    dim: usize,
    // Serializes writers so that the first upsert creates the table once.
    write_lock: Mutex<()>,
}

impl LanceVectorStore {
    pub async fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
        let db = open_db(db_path.to_string_lossy().as_ref()).await?;
        info!(path = %db_path.display(), table = table_name, dim, "opened vector store");
        Ok(Self { db, table_name: table_name.to_string(), dim, write_lock: Mutex::new(()) })
    }

    fn entries_to_record_batch(&self, entries: &[VectorEntry]) -> Result<RecordBatch> {
        let schema = build_chunk_schema(self.dim as i32);
        let mut ids = Vec::with_capacity(entries.len());
        let mut record_ids = Vec::with_capacity(entries.len());
        let mut ordinals = Vec::with_capacity(entries.len());
        let mut section_paths = Vec::with_capacity(entries.len());
        let mut texts = Vec::with_capacity(entries.len());
        let mut titles = Vec::with_capacity(entries.len());
        let mut urls = Vec::with_capacity(entries.len());
        let mut kinds = Vec::with_capacity(entries.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(entries.len());
        for e in entries {
            if e.vector.len() != self.dim {
                bail!("vector for {} has dim {}, expected {}", e.id, e.vector.len(), self.dim);
            }
            let p = &e.payload;
            ids.push(e.id.clone());
            record_ids.push(p.record_id.clone());
            ordinals.push(i32::try_from(p.ordinal)?);
            section_paths.push(serde_json::to_string(&p.section_path)?);
            texts.push(p.text.clone());
            titles.push(p.title.clone());
            urls.push(p.url.clone());
            kinds.push(p.kind.as_str().to_string());
            vectors.push(Some(e.vector.iter().map(|&x| Some(x)).collect()));
        }
        let record_batch = RecordBatch::try_new(schema, vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(record_ids)),
            Arc::new(Int32Array::from(ordinals)),
            Arc::new(StringArray::from(section_paths)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(titles)),
            Arc::new(StringArray::from(urls)),
            Arc::new(StringArray::from(kinds)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), self.dim as i32)),
        ])?;
        Ok(record_batch)
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let record_batch = self.entries_to_record_batch(entries)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));

        let _guard = self.write_lock.lock().await;
        if table_exists(&self.db, &self.table_name).await? {
            let table = self.db.open_table(&self.table_name).execute().await?;
            // Upsert keyed on chunk id: re-indexing a record replaces its rows.
            let mut mi = table.merge_insert(&["id"]);
            mi.when_matched_update_all(None).when_not_matched_insert_all();
            mi.execute(reader).await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        debug!(table = %self.table_name, rows = entries.len(), "upserted chunk vectors");
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        if limit == 0 || !table_exists(&self.db, &self.table_name).await? {
            return Ok(Vec::new());
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table
            .vector_search(vector.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let ids = string_column(&batch, "id")?;
            let record_ids = string_column(&batch, "record_id")?;
            let ordinals = int32_column(&batch, "ordinal")?;
            let section_paths = string_column(&batch, "section_path")?;
            let texts = string_column(&batch, "text")?;
            let titles = string_column(&batch, "title")?;
            let urls = string_column(&batch, "url")?;
            let kinds = string_column(&batch, "kind")?;
            let distances = float32_column(&batch, "_distance")?;
            for i in 0..batch.num_rows() {
                let payload = ChunkPayload {
                    record_id: record_ids.value(i).to_string(),
                    ordinal: usize::try_from(ordinals.value(i))?,
                    section_path: serde_json::from_str(section_paths.value(i))?,
                    text: texts.value(i).to_string(),
                    title: titles.value(i).to_string(),
                    url: urls.value(i).to_string(),
                    kind: kinds.value(i).parse()?,
                };
                hits.push(VectorHit { id: ids.value(i).to_string(), score: 1.0 - distances.value(i), payload });
            }
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }
}
