//! docqa-ingest
//!
//! Document loading and chunking for the local collection. See `builder`
//! for the directory-to-chunks pipeline and `loader` for the per-format
//! loaders.

pub mod builder;
pub mod chunker;
pub mod loader;

pub use builder::{ChunkStoreBuilder, SourceDocument};
pub use chunker::Chunker;
pub use loader::{load_document, LoadedDocument};
