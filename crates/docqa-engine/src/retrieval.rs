//! Retrieval over the two index partitions. A query searches exactly
//! one partition, embedded with that partition's own provider, and only
//! hits under the distance threshold survive.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use docqa_core::config::RetrievalSettings;
use docqa_core::error::{Error, Result};
use docqa_core::routing::RoutingTable;
use docqa_core::traits::{EmbeddingProvider, VectorStore};
use docqa_core::types::{Classification, DocFormat, PartitionId, ScoredChunk, Topic};

/// A partition paired with the provider that built it. Query vectors
/// must come from this provider and no other.
#[derive(Clone)]
pub struct PartitionHandle {
    pub store: Arc<dyn VectorStore>,
    pub provider: Arc<dyn EmbeddingProvider>,
}

pub struct RetrievalEngine {
    remote: PartitionHandle,
    local: PartitionHandle,
    routing: RoutingTable,
    settings: RetrievalSettings,
}

impl RetrievalEngine {
    pub fn new(
        remote: PartitionHandle,
        local: PartitionHandle,
        routing: RoutingTable,
        settings: RetrievalSettings,
    ) -> Self {
        Self { remote, local, routing, settings }
    }

    fn handle(&self, partition: PartitionId) -> &PartitionHandle {
        match partition {
            PartitionId::Remote => &self.remote,
            PartitionId::Local => &self.local,
        }
    }

    /// Resolve the partition scope and hit predicate for this query. A
    /// filename restriction wins over topic scoping and must resolve to a
    /// known format; otherwise the query is confined to chunks carrying
    /// the classified topic, not just to that topic's partition.
    fn scope(
        &self,
        classification: &Classification,
        filename: Option<&str>,
    ) -> Result<(PartitionId, Option<Topic>)> {
        match filename {
            Some(name) => {
                let format = DocFormat::from_path(Path::new(name)).ok_or_else(|| {
                    Error::InvalidInput(format!("cannot resolve a document format for '{name}'"))
                })?;
                Ok((self.routing.route(format).partition, None))
            }
            None => Ok((
                self.routing.partition_for_topic(classification.topic),
                Some(classification.topic),
            )),
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        classification: &Classification,
        filename: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let (partition, topic) = self.scope(classification, filename)?;
        let handle = self.handle(partition);

        let vectors = handle.provider.embed_batch(&[query.to_string()]).await?;
        let query_vec = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingFailure("provider returned no vector".into()))?;

        let k = self.settings.max_results * self.settings.candidate_multiplier;
        let mut hits = handle.store.search(&query_vec, k, topic, filename).await?;
        let candidates = hits.len();
        hits.retain(|hit| hit.distance <= self.settings.distance_threshold);
        hits.truncate(self.settings.max_results);
        debug!(
            partition = %partition,
            candidates,
            kept = hits.len(),
            threshold = self.settings.distance_threshold,
            "retrieval complete"
        );
        Ok(hits)
    }
}
