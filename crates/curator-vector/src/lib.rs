//! curator-vector
//!
//! Chunk vector storage behind the `VectorStore` contract: a LanceDB table
//! searched by cosine distance, and an in-memory store for tests and small
//! deployments.
pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceVectorStore;
pub use memory::MemoryVectorStore;
