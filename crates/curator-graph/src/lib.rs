//! curator-graph
//!
//! Entity graph behind the `GraphStore` contract (petgraph, in memory) and
//! the mapping from records to entities and relations.
pub mod indexer;
pub mod memory;

pub use indexer::{index_record, resource_entity};
pub use memory::MemoryGraphStore;
