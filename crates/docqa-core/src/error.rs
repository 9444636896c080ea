use thiserror::Error;

use crate::types::PartitionId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index partition '{0}' has not been built yet; run an ingest first")]
    IndexNotReady(PartitionId),

    #[error("Embedding provider failed: {0}")]
    EmbeddingFailure(String),

    #[error("Language model failed: {0}")]
    GenerationFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
