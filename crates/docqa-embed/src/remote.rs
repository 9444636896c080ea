//! Remote embedding provider over the Gemini-style `batchEmbedContents`
//! HTTP API. May fail on network or quota errors; failures surface as
//! `EmbeddingFailure` and are never retried or rerouted to the local
//! provider here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docqa_core::config::RemoteEmbeddingSettings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::EmbeddingProvider;
use docqa_core::types::ProviderKind;

pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    dim: usize,
    id: String,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl RemoteEmbeddingProvider {
    pub fn new(settings: &RemoteEmbeddingSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env).map_err(|_| {
            Error::InvalidConfig(format!(
                "remote embedding API key missing; set the {} environment variable",
                settings.api_key_env
            ))
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            dim: settings.dim,
            id: format!("remote:{}:d{}", settings.model, settings.dim),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let url = format!(
            "{}/v1beta/models/{}:batchEmbedContents?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{}", self.model),
                    content: Content { parts: vec![Part { text: text.clone() }] },
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::EmbeddingFailure(format!("remote embedding request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingFailure(format!(
                "remote embedding API returned {status}: {body}"
            )));
        }
        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingFailure(format!("bad embedding response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::EmbeddingFailure(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        let mut out = Vec::with_capacity(parsed.embeddings.len());
        for emb in parsed.embeddings {
            if emb.values.len() != self.dim {
                return Err(Error::EmbeddingFailure(format!(
                    "remote embedding dimension {} does not match configured {}",
                    emb.values.len(),
                    self.dim
                )));
            }
            out.push(emb.values);
        }
        Ok(out)
    }
}
