//! curator-core
//!
//! Shared data model, collaborator traits, configuration and the
//! ingestion-side text pipeline (normalizer + structural chunker).

pub mod chunker;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
