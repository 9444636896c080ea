//! Dual embedding router: the single mapping from document format to
//! embedding provider and index partition, plus the topic-to-partition
//! scoping used for unrestricted queries.
//!
//! Both mappings are built from `[routing]` config. The topic mapping is
//! a fact about how this collection's documents were classified, not a
//! design rule, so nothing here is hard-coded.

use std::collections::HashSet;

use crate::config::RoutingSettings;
use crate::error::{Error, Result};
use crate::types::{DocFormat, PartitionId, ProviderKind, Topic};

/// Where a document's chunks go: which provider embeds them and which
/// partition stores them. The pairing is fixed — a partition only ever
/// holds vectors from its own provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub provider: ProviderKind,
    pub partition: PartitionId,
}

impl Route {
    pub const REMOTE: Route =
        Route { provider: ProviderKind::Remote, partition: PartitionId::Remote };
    pub const LOCAL: Route =
        Route { provider: ProviderKind::Local, partition: PartitionId::Local };
}

#[derive(Debug, Clone)]
pub struct RoutingTable {
    remote_formats: HashSet<DocFormat>,
    remote_topics: HashSet<Topic>,
}

impl RoutingTable {
    pub fn from_settings(settings: &RoutingSettings) -> Result<Self> {
        let remote_formats = settings
            .remote_formats
            .iter()
            .map(|s| s.parse::<DocFormat>())
            .collect::<Result<HashSet<_>>>()?;
        let remote_topics = settings
            .remote_topics
            .iter()
            .map(|s| {
                s.parse::<Topic>()
                    .map_err(|_| Error::InvalidConfig(format!("bad topic '{s}' in routing.remote_topics")))
            })
            .collect::<Result<HashSet<_>>>()?;
        Ok(Self { remote_formats, remote_topics })
    }

    /// Pure function of format. No fallback, no retry: provider failures
    /// propagate from the caller.
    pub fn route(&self, format: DocFormat) -> Route {
        if self.remote_formats.contains(&format) {
            Route::REMOTE
        } else {
            Route::LOCAL
        }
    }

    /// Partition scope for a query constrained only by topic.
    pub fn partition_for_topic(&self, topic: Topic) -> PartitionId {
        if self.remote_topics.contains(&topic) {
            PartitionId::Remote
        } else {
            PartitionId::Local
        }
    }

    /// Provider bound to a partition. Query embedding must use the same
    /// provider the partition was built with.
    pub fn provider_for_partition(&self, partition: PartitionId) -> ProviderKind {
        match partition {
            PartitionId::Remote => ProviderKind::Remote,
            PartitionId::Local => ProviderKind::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_table() -> RoutingTable {
        RoutingTable::from_settings(&RoutingSettings::default()).expect("routing table")
    }

    #[test]
    fn portable_documents_route_to_remote() {
        let table = default_table();
        assert_eq!(table.route(DocFormat::PortableDocument), Route::REMOTE);
        assert_eq!(table.route(DocFormat::PlainText), Route::LOCAL);
        assert_eq!(table.route(DocFormat::StructuredMarkup), Route::LOCAL);
        assert_eq!(table.route(DocFormat::Hypertext), Route::LOCAL);
    }

    #[test]
    fn technology_scopes_to_remote_partition() {
        let table = default_table();
        assert_eq!(table.partition_for_topic(Topic::Technology), PartitionId::Remote);
        assert_eq!(table.partition_for_topic(Topic::Literature), PartitionId::Local);
        assert_eq!(table.partition_for_topic(Topic::Science), PartitionId::Local);
        assert_eq!(table.partition_for_topic(Topic::People), PartitionId::Local);
    }

    #[test]
    fn topic_scope_is_config_driven_not_hard_coded() {
        let settings = RoutingSettings {
            remote_topics: vec!["Literature".to_string()],
            ..RoutingSettings::default()
        };
        let table = RoutingTable::from_settings(&settings).expect("routing table");
        assert_eq!(table.partition_for_topic(Topic::Literature), PartitionId::Remote);
        assert_eq!(table.partition_for_topic(Topic::Technology), PartitionId::Local);
    }

    #[test]
    fn bad_config_is_rejected() {
        let settings = RoutingSettings {
            remote_topics: vec!["Gastronomy".to_string()],
            ..RoutingSettings::default()
        };
        assert!(RoutingTable::from_settings(&settings).is_err());
    }
}
