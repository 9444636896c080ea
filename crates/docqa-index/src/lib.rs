//! docqa-index
//!
//! The two vector index partitions behind the retrieval engine. Both are
//! LanceDB tables addressed through an `active:` meta pointer so rebuilds
//! are all-or-nothing; `memory` offers an exact in-process stand-in with
//! the same contract.

pub mod memory;
pub mod meta;
pub mod partition;
pub mod schema;

pub use memory::MemoryPartition;
pub use meta::open_db;
pub use partition::LancePartition;
