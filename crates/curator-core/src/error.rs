use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Fatal for the URL being ingested; nothing was persisted.
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Indexing failed: {0}")]
    Index(String),

    #[error("Record already exists for url {0}")]
    DuplicateUrl(String),

    #[error("Store operation failed: {0}")]
    Store(String),

    /// Every activated retriever failed or timed out.
    #[error("No retrieval store was reachable")]
    NoStoresReachable,
}

pub type Result<T> = std::result::Result<T, Error>;
