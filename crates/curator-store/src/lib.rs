//! curator-store
//!
//! The authoritative record store on SQLite, plus the user feedback that
//! seeds relevance analysis with few-shot examples.
pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;
