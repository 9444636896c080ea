//! Query engine: classifiers, retrieval over the dual-partition index,
//! prompt assembly and answer generation, plus the index build
//! orchestrator the CLI drives.

pub mod classify;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

pub use ingest::IndexBuilder;
pub use llm::OllamaClient;
pub use pipeline::{QaPipeline, FALLBACK_MESSAGE};
pub use retrieval::{PartitionHandle, RetrievalEngine};
