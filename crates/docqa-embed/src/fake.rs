//! Deterministic hash-based embeddings for tests and offline runs.
//! Selected via `embedding.use_fake` or `APP_USE_FAKE_EMBEDDINGS=1`.

use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use docqa_core::error::Result;
use docqa_core::traits::EmbeddingProvider;
use docqa_core::types::ProviderKind;

pub struct FakeProvider {
    dim: usize,
    kind: ProviderKind,
    id: String,
}

impl FakeProvider {
    pub fn new(kind: ProviderKind, dim: usize) -> Self {
        let tag = match kind {
            ProviderKind::Remote => "remote",
            ProviderKind::Local => "local",
        };
        Self { dim, kind, id: format!("fake:{tag}:d{dim}") }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for FakeProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
