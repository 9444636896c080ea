//! Index build orchestration: chunk the collection, split chunks by
//! route, embed each partition's chunks with its own provider and
//! rebuild both partitions atomically.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use docqa_core::error::Result;
use docqa_core::routing::RoutingTable;
use docqa_core::types::{DocumentChunk, PartitionId};
use docqa_ingest::builder::ChunkStoreBuilder;

use crate::retrieval::PartitionHandle;

const EMBED_BATCH_SIZE: usize = 32;

pub struct IndexBuilder {
    builder: ChunkStoreBuilder,
    routing: RoutingTable,
    remote: PartitionHandle,
    local: PartitionHandle,
}

impl IndexBuilder {
    pub fn new(
        builder: ChunkStoreBuilder,
        routing: RoutingTable,
        remote: PartitionHandle,
        local: PartitionHandle,
    ) -> Self {
        Self { builder, routing, remote, local }
    }

    /// Rebuild both partitions from the document folder. A no-op when
    /// both partitions are already populated, unless `force` is set.
    pub async fn rebuild_all(&self, docs_dir: &Path, force: bool) -> Result<()> {
        if !force
            && self.remote.store.is_ready().await?
            && self.local.store.is_ready().await?
        {
            info!("both partitions ready, skipping rebuild");
            return Ok(());
        }

        let chunks = self.builder.build_chunks(docs_dir)?;
        let (remote_chunks, local_chunks): (Vec<_>, Vec<_>) = chunks
            .into_iter()
            .partition(|c| self.routing.route(c.format).partition == PartitionId::Remote);

        tokio::try_join!(
            self.build_partition(PartitionId::Remote, &self.remote, remote_chunks),
            self.build_partition(PartitionId::Local, &self.local, local_chunks),
        )?;
        Ok(())
    }

    async fn build_partition(
        &self,
        partition: PartitionId,
        handle: &PartitionHandle,
        chunks: Vec<DocumentChunk>,
    ) -> Result<()> {
        info!(
            partition = %partition,
            provider = handle.provider.provider_id(),
            chunks = chunks.len(),
            "rebuilding partition"
        );
        let bar = ProgressBar::new(chunks.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(format!("embedding {partition}"));

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            vectors.extend(handle.provider.embed_batch(&texts).await?);
            bar.inc(batch.len() as u64);
        }
        bar.finish_and_clear();

        handle.store.rebuild(&chunks, &vectors).await?;
        info!(partition = %partition, chunks = chunks.len(), "partition rebuilt");
        Ok(())
    }
}
