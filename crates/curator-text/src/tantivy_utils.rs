use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const TOKENIZER: &str = "text_with_stopwords";

pub struct RecordFields {
    pub record_id: Field,
    pub title: Field,
    pub summary: Field,
}

pub fn build_schema() -> (Schema, RecordFields) {
    let mut schema_builder = Schema::builder();
    let record_id = schema_builder.add_text_field("record_id", STRING | STORED);
    let text_field_indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
    let title = schema_builder.add_text_field("title", text_options.clone());
    let summary = schema_builder.add_text_field("summary", text_options);
    (schema_builder.build(), RecordFields { record_id, title, summary })
}

pub fn register_tokenizer(index: &Index) {
    let stop_words = [
        "a","an","and","are","as","at","be","by","for","from","has","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","there","then","than","so","if","when","where","why","how","what","which","who","can","could","should","would","do","does","did","have","had",
    ];
    let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
        .build();
    index.tokenizers().register(TOKENIZER, tokenizer);
}
