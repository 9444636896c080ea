use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DocumentChunk, ProviderKind, ScoredChunk, Topic};

/// One of the two embedding backends. Implementations embed text into
/// fixed-dimension, L2-normalized vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `local:minilm:d384`).
    fn provider_id(&self) -> &str;
    fn kind(&self) -> ProviderKind;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// Compute embeddings for a batch of input texts, one vector per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Blocking single request/response text generation. Timeout and retry
/// policy, if any, belong to the implementation, not to callers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A single index partition. Rebuild and search are mutually exclusive
/// on the same partition; search never mutates state.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace the partition's content with the given chunks and vectors,
    /// all-or-nothing: a failed rebuild leaves prior content queryable.
    async fn rebuild(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()>;

    /// Insert or update chunks keyed by chunk id.
    async fn upsert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()>;

    /// k-nearest-neighbor search by ascending cosine distance, optionally
    /// restricted to chunks carrying one topic and/or from one exact
    /// filename. Fails with `IndexNotReady` before the first successful
    /// rebuild.
    async fn search(
        &self,
        query_vec: &[f32],
        k: usize,
        topic: Option<Topic>,
        filename: Option<&str>,
    ) -> Result<Vec<ScoredChunk>>;

    async fn is_ready(&self) -> Result<bool>;

    async fn count(&self) -> Result<usize>;
}
