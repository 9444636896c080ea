//! Local embedding provider: a MiniLM-class BERT encoder run through
//! candle, with masked mean pooling. Loaded once from a local model
//! directory; assumed available for the life of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::info;

use docqa_core::config::LocalEmbeddingSettings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::EmbeddingProvider;
use docqa_core::types::ProviderKind;

use crate::device::select_device;
use crate::pooling::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

pub struct LocalBertProvider {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl LocalBertProvider {
    pub fn load(settings: &LocalEmbeddingSettings) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(&settings.model_dir)?;
        info!(dir = %model_dir.display(), "loading local embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::EmbeddingFailure(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let config_path = model_dir.join("config.json");
        let config_text = std::fs::read_to_string(&config_path).map_err(|e| {
            Error::EmbeddingFailure(format!("failed to read {}: {e}", config_path.display()))
        })?;
        let config: BertConfig = serde_json::from_str(&config_text)
            .map_err(|e| Error::EmbeddingFailure(format!("bad model config: {e}")))?;

        let vb = load_weights(&model_dir, &device)?;
        let model = BertModel::load(vb, &config)
            .map_err(|e| Error::EmbeddingFailure(format!("failed to load model: {e}")))?;
        info!("local embedding model ready");

        let id = format!("local:minilm:d{}", settings.dim);
        Ok(Self {
            model,
            tokenizer,
            device,
            dim: settings.dim,
            max_len: settings.max_len,
            id,
        })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) =
            tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::U32, &self.device)
            .map_err(|e| Error::EmbeddingFailure(format!("tensor build failed: {e}")))?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| Error::EmbeddingFailure(format!("forward pass failed: {e}")))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vector: Vec<f32> = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1())
            .map_err(|e| Error::EmbeddingFailure(format!("failed to read embedding: {e}")))?;
        if vector.len() != self.dim {
            return Err(Error::EmbeddingFailure(format!(
                "model produced dimension {} but {} is configured",
                vector.len(),
                self.dim
            )));
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalBertProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_one(text)?);
        }
        Ok(out)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        let tensors = candle_core::safetensors::load(&safetensors, device)
            .map_err(|e| Error::EmbeddingFailure(format!("failed to load weights: {e}")))?;
        return Ok(VarBuilder::from_tensors(tensors, DType::F32, device));
    }
    let pickle = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&pickle)
        .map_err(|e| Error::EmbeddingFailure(format!("failed to load weights: {e}")))?;
    let map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(map, DType::F32, device))
}

fn resolve_model_dir(configured: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    let p = docqa_core::config::expand_path(configured);
    if p.exists() {
        return Ok(p);
    }
    Err(Error::EmbeddingFailure(format!(
        "could not locate local embedding model directory '{configured}'"
    )))
}
