use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{doc, Index, TantivyDocument};
use tracing::debug;

use curator_core::types::{Record, RecordId};

use crate::tantivy_utils::{build_schema, register_tokenizer, RecordFields};

const WRITER_HEAP_BYTES: usize = 20_000_000;

/// BM25 ranking over record titles and summaries, held in RAM.
///
/// The index is built from a snapshot of the record set, so callers rebuild
/// it when the corpus changes. Rebuilding per query is linear in corpus size
/// and only suits small collections.
pub struct LexicalIndex {
    index: Index,
    fields: RecordFields,
    docs: usize,
}

impl LexicalIndex {
    pub fn build(records: &[Record]) -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        register_tokenizer(&index);
        let mut writer = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        for r in records {
            writer.add_document(doc!(
                fields.record_id => r.id.clone(),
                fields.title => r.title.clone(),
                fields.summary => r.summary.clone(),
            ))?;
        }
        writer.commit()?;
        Ok(Self { index, fields, docs: records.len() })
    }

    pub fn len(&self) -> usize {
        self.docs
    }

    pub fn is_empty(&self) -> bool {
        self.docs == 0
    }

    /// Ranked `(score, record_id)` pairs, best first. Query syntax is not
    /// interpreted: the text is reduced to lowercase plain terms joined with
    /// OR, so `AND`/`OR`/`NOT` in user text are ordinary words.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<(f32, RecordId)>> {
        let terms = plain_terms(query);
        if terms.is_empty() || limit == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let reader = self.index.reader()?;
        let searcher = reader.searcher();
        let qp = QueryParser::for_index(&self.index, vec![self.fields.title, self.fields.summary]);
        let (q, errors) = qp.parse_query_lenient(&terms);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "lenient query parse dropped terms");
        }
        let top_docs = searcher.search(&q, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            if let Some(id) = doc.get_first(self.fields.record_id).and_then(|v| v.as_str()) {
                hits.push((score, id.to_string()));
            }
        }
        Ok(hits)
    }
}

fn plain_terms(query: &str) -> String {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
