//! LanceDB-backed index partition.
//!
//! Each partition owns its own chunk tables and an exclusive lock:
//! rebuild holds it in write mode, search in read mode, so a rebuild in
//! progress blocks queries against that partition and nothing else.
//! Rebuilds write a versioned table and flip the `active:` meta pointer
//! only after every batch landed.

use arrow_array::{
    FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorStore;
use docqa_core::types::{DocumentChunk, PartitionId, ScoredChunk, Topic};

use crate::meta::{escape_literal, get_meta, set_meta};
use crate::schema::build_chunk_schema;

const INSERT_BATCH_SIZE: usize = 1000;

pub struct LancePartition {
    conn: Connection,
    partition: PartitionId,
    dim: usize,
    lock: RwLock<()>,
}

impl LancePartition {
    pub fn new(conn: Connection, partition: PartitionId, dim: usize) -> Self {
        Self { conn, partition, dim, lock: RwLock::new(()) }
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn active_key(&self) -> String {
        format!("active:{}", self.partition)
    }

    async fn active_table(&self) -> Result<Option<String>> {
        get_meta(&self.conn, &self.active_key()).await
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

    fn to_record_batch(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
        let schema = build_chunk_schema(self.dim as i32);
        let mut ids = Vec::new();
        let mut filenames = Vec::new();
        let mut topics = Vec::new();
        let mut formats = Vec::new();
        let mut contents = Vec::new();
        let mut chunk_indices = Vec::new();
        let mut total_chunks = Vec::new();
        let mut vecs: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            ids.push(chunk.id.clone());
            filenames.push(chunk.filename.clone());
            topics.push(chunk.topic.as_str().to_string());
            formats.push(chunk.format.as_str().to_string());
            contents.push(chunk.content.clone());
            chunk_indices.push(chunk.chunk_index as i32);
            total_chunks.push(chunk.total_chunks as i32);
            vecs.push(Some(vector.iter().copied().map(Some).collect()));
        }
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(filenames)),
                Arc::new(StringArray::from(topics)),
                Arc::new(StringArray::from(formats)),
                Arc::new(StringArray::from(contents)),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(Int32Array::from(total_chunks)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<
                    arrow_array::types::Float32Type,
                    _,
                    _,
                >(vecs.into_iter(), self.dim as i32)),
            ],
        )
        .map_err(|e| Error::Storage(format!("failed to build record batch: {e}")))
    }

    async fn write_table(
        &self,
        table_name: &str,
        chunks: &[DocumentChunk],
        vectors: &[Vec<f32>],
    ) -> Result<()> {
        let schema = build_chunk_schema(self.dim as i32);
        let mut batches = Vec::new();
        for (chunk_batch, vec_batch) in
            chunks.chunks(INSERT_BATCH_SIZE).zip(vectors.chunks(INSERT_BATCH_SIZE))
        {
            batches.push(Ok(self.to_record_batch(chunk_batch, vec_batch)?));
        }
        let reader = Box::new(RecordBatchIterator::new(batches.into_iter(), schema));
        self.conn
            .create_table(table_name, reader)
            .execute()
            .await
            .map_err(|e| Error::Storage(format!("failed to create table '{table_name}': {e}")))?;
        Ok(())
    }

    fn decode_hits(&self, batch: &RecordBatch) -> Result<Vec<ScoredChunk>> {
        fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| Error::Storage(format!("result missing '{name}' column")))
        }
        fn int_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| Error::Storage(format!("result missing '{name}' column")))
        }

        let ids = string_col(batch, "id")?;
        let filenames = string_col(batch, "filename")?;
        let topics = string_col(batch, "topic")?;
        let formats = string_col(batch, "format")?;
        let contents = string_col(batch, "content")?;
        let chunk_indices = int_col(batch, "chunk_index")?;
        let totals = int_col(batch, "total_chunks")?;
        let distances = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| Error::Storage("result missing '_distance' column".to_string()))?;

        let mut hits = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let chunk = DocumentChunk {
                id: ids.value(i).to_string(),
                filename: filenames.value(i).to_string(),
                topic: topics.value(i).parse().map_err(|_| {
                    Error::Storage(format!("bad topic tag '{}' in index", topics.value(i)))
                })?,
                format: formats.value(i).parse().map_err(|_| {
                    Error::Storage(format!("bad format tag '{}' in index", formats.value(i)))
                })?,
                content: contents.value(i).to_string(),
                chunk_index: chunk_indices.value(i) as usize,
                total_chunks: totals.value(i) as usize,
            };
            hits.push(ScoredChunk { chunk, distance: distances.value(i) });
        }
        Ok(hits)
    }
}

#[async_trait]
impl VectorStore for LancePartition {
    async fn rebuild(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()> {
        let _guard = self.lock.write().await;
        self.validate(chunks, vectors)?;

        let staging = format!("{}_chunks_v{}", self.partition, Utc::now().timestamp_millis());
        debug!(partition = %self.partition, table = %staging, "building staging table");
        if let Err(e) = self.write_table(&staging, chunks, vectors).await {
            // leave the previously active table untouched
            let _ = self.conn.drop_table(&staging, &[]).await;
            return Err(e);
        }

        let previous = self.active_table().await?;
        set_meta(&self.conn, &self.active_key(), &staging).await?;
        if let Some(old) = previous {
            if old != staging {
                if let Err(e) = self.conn.drop_table(&old, &[]).await {
                    warn!(table = %old, "failed to drop superseded table: {e}");
                }
            }
        }
        info!(partition = %self.partition, chunks = chunks.len(), "partition rebuilt");
        Ok(())
    }

    async fn upsert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()> {
        let _guard = self.lock.write().await;
        self.validate(chunks, vectors)?;
        let Some(active) = self.active_table().await? else {
            // first write: behaves like a small rebuild
            let staging = format!("{}_chunks_v{}", self.partition, Utc::now().timestamp_millis());
            self.write_table(&staging, chunks, vectors).await?;
            return set_meta(&self.conn, &self.active_key(), &staging).await;
        };
        let table = self
            .conn
            .open_table(&active)
            .execute()
            .await
            .map_err(|e| Error::Storage(format!("failed to open table '{active}': {e}")))?;
        let schema = build_chunk_schema(self.dim as i32);
        let batch = self.to_record_batch(chunks, vectors)?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader)
            .await
            .map_err(|e| Error::Storage(format!("failed to upsert chunks: {e}")))?;
        Ok(())
    }

    async fn search(
        &self,
        query_vec: &[f32],
        k: usize,
        topic: Option<Topic>,
        filename: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let _guard = self.lock.read().await;
        if query_vec.len() != self.dim {
            return Err(Error::Storage(format!(
                "query vector dimension {} does not match partition '{}' dimension {}",
                query_vec.len(),
                self.partition,
                self.dim
            )));
        }
        let Some(active) = self.active_table().await? else {
            return Err(Error::IndexNotReady(self.partition));
        };
        let table = self
            .conn
            .open_table(&active)
            .execute()
            .await
            .map_err(|e| Error::Storage(format!("failed to open table '{active}': {e}")))?;
        let mut query = table
            .vector_search(query_vec.to_vec())
            .map_err(|e| Error::Storage(format!("failed to build search: {e}")))?
            .distance_type(DistanceType::Cosine)
            .limit(k);
        let mut predicates = Vec::new();
        if let Some(topic) = topic {
            predicates.push(format!("topic = '{}'", topic.as_str()));
        }
        if let Some(name) = filename {
            predicates.push(format!("filename = '{}'", escape_literal(name)));
        }
        if !predicates.is_empty() {
            query = query.only_if(predicates.join(" AND "));
        }
        let mut stream = query
            .execute()
            .await
            .map_err(|e| Error::Storage(format!("search failed: {e}")))?;
        let mut hits = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| Error::Storage(format!("failed to read search results: {e}")))?
        {
            hits.extend(self.decode_hits(&batch)?);
        }
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn is_ready(&self) -> Result<bool> {
        let _guard = self.lock.read().await;
        Ok(self.active_table().await?.is_some())
    }

    async fn count(&self) -> Result<usize> {
        let _guard = self.lock.read().await;
        let Some(active) = self.active_table().await? else {
            return Ok(0);
        };
        let table = self
            .conn
            .open_table(&active)
            .execute()
            .await
            .map_err(|e| Error::Storage(format!("failed to open table '{active}': {e}")))?;
        table
            .count_rows(None)
            .await
            .map_err(|e| Error::Storage(format!("failed to count rows: {e}")))
    }
}
