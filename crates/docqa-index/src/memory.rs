//! Exact-cosine in-memory partition, used by engine tests and offline
//! smoke runs. Mirrors the LanceDB partition's contract, including
//! `IndexNotReady` before the first rebuild and all-or-nothing rebuilds.

use async_trait::async_trait;
use tokio::sync::RwLock;

use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorStore;
use docqa_core::types::{DocumentChunk, PartitionId, ScoredChunk, Topic};

pub struct MemoryPartition {
    partition: PartitionId,
    dim: usize,
    rows: RwLock<Option<Vec<(DocumentChunk, Vec<f32>)>>>,
}

impl MemoryPartition {
    pub fn new(partition: PartitionId, dim: usize) -> Self {
        Self { partition, dim, rows: RwLock::new(None) }
    }

    fn validate(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(Error::Storage(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        for v in vectors {
            if v.len() != self.dim {
                return Err(Error::Storage(format!(
                    "vector dimension {} does not match partition '{}' dimension {}",
                    v.len(),
                    self.partition,
                    self.dim
                )));
            }
        }
        Ok(())
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na * nb)
}

#[async_trait]
impl VectorStore for MemoryPartition {
    async fn rebuild(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()> {
        let mut rows = self.rows.write().await;
        // validate before touching state so a failed rebuild leaves the
        // prior content queryable
        self.validate(chunks, vectors)?;
        *rows = Some(chunks.iter().cloned().zip(vectors.iter().cloned()).collect());
        Ok(())
    }

    async fn upsert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()> {
        let mut rows = self.rows.write().await;
        self.validate(chunks, vectors)?;
        let rows = rows.get_or_insert_with(Vec::new);
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            if let Some(existing) = rows.iter_mut().find(|(c, _)| c.id == chunk.id) {
                *existing = (chunk.clone(), vector.clone());
            } else {
                rows.push((chunk.clone(), vector.clone()));
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query_vec: &[f32],
        k: usize,
        topic: Option<Topic>,
        filename: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let rows = self.rows.read().await;
        let Some(rows) = rows.as_ref() else {
            return Err(Error::IndexNotReady(self.partition));
        };
        if query_vec.len() != self.dim {
            return Err(Error::Storage(format!(
                "query vector dimension {} does not match partition '{}' dimension {}",
                query_vec.len(),
                self.partition,
                self.dim
            )));
        }
        let mut hits: Vec<ScoredChunk> = rows
            .iter()
            .filter(|(chunk, _)| {
                topic.map_or(true, |t| chunk.topic == t)
                    && filename.map_or(true, |f| chunk.filename == f)
            })
            .map(|(chunk, vector)| ScoredChunk {
                chunk: chunk.clone(),
                distance: cosine_distance(query_vec, vector),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn is_ready(&self) -> Result<bool> {
        Ok(self.rows.read().await.is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.rows.read().await.as_ref().map_or(0, Vec::len))
    }
}
