//! docqa-embed
//!
//! The two embedding backends behind the dual-partition index: a local
//! candle BERT encoder and a remote HTTP API, plus a deterministic fake
//! provider for tests and offline development.

pub mod device;
pub mod fake;
pub mod local;
pub mod pooling;
pub mod remote;
pub mod tokenize;

use std::sync::Arc;

use docqa_core::config::EmbeddingSettings;
use docqa_core::error::Result;
use docqa_core::traits::EmbeddingProvider;
use docqa_core::types::ProviderKind;

pub use fake::FakeProvider;
pub use local::LocalBertProvider;
pub use remote::RemoteEmbeddingProvider;

fn fake_requested(settings: &EmbeddingSettings) -> bool {
    if settings.use_fake {
        return true;
    }
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Construct the provider for one side of the dual router. With fake
/// embeddings enabled, both kinds become deterministic hash providers at
/// their configured dimensions, so partition binding stays observable in
/// tests.
pub fn provider_for(
    kind: ProviderKind,
    settings: &EmbeddingSettings,
) -> Result<Arc<dyn EmbeddingProvider>> {
    let dim = match kind {
        ProviderKind::Remote => settings.remote.dim,
        ProviderKind::Local => settings.local.dim,
    };
    if fake_requested(settings) {
        tracing::info!(?kind, dim, "using fake embeddings");
        return Ok(Arc::new(FakeProvider::new(kind, dim)));
    }
    match kind {
        ProviderKind::Remote => Ok(Arc::new(RemoteEmbeddingProvider::new(&settings.remote)?)),
        ProviderKind::Local => Ok(Arc::new(LocalBertProvider::load(&settings.local)?)),
    }
}
