//! curator-ingest
//!
//! Per-URL ingestion: fetch, staleness gate, relevance analysis, canonical
//! persistence, then best-effort graph and vector indexing.
pub mod coordinator;
pub mod freshness;
pub mod heuristic;

pub use coordinator::{IngestOutcome, IngestReport, IngestionCoordinator, RejectReason, Stage};
pub use freshness::{is_stale, parse_published};
pub use heuristic::heuristic_analysis;
