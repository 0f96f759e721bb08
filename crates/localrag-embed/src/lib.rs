use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{XLMRobertaModel, Config as XLMRobertaConfig};
use tokenizers::Tokenizer;

use localrag_core::config::{EmbeddingBackend, EmbeddingConfig};
use localrag_core::traits::Embedder;

pub mod fake;
pub mod pool;
pub mod tokenize;

pub use fake::FakeEmbedder;
pub use pool::masked_mean_l2;

/// Texts per forward pass.
const BATCH_SIZE: usize = 16;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                tracing::info!(device = "metal", "embedding device selected");
                return dev;
            }
            Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to cpu"),
        }
    }
    tracing::info!(device = "cpu", "embedding device selected");
    Device::Cpu
}

/// BGE-M3 sentence embedder on an XLM-RoBERTa backbone.
pub struct BgeM3Embedder { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl BgeM3Embedder {
    pub fn load(model_dir: &Path, dim: usize, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(model_dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(dim, max_len, "BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let batch = tokenize::encode_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.attention_mask, &batch.token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let rows = pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?;
        if let Some(row) = rows.iter().find(|r| r.len() != self.dim) {
            return Err(anyhow!("model produced {}-d embeddings, configured for {}", row.len(), self.dim));
        }
        tracing::debug!(texts = texts.len(), elapsed = ?start.elapsed(), "embedded batch");
        Ok(rows)
    }
}

impl Embedder for BgeM3Embedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        Ok(out)
    }
}

/// Build the configured embedder once; callers share it behind an `Arc`.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Fake => {
            tracing::info!(dim = config.dim, "using fake lexical embedder");
            Ok(Arc::new(FakeEmbedder::new(config.dim)))
        }
        EmbeddingBackend::BgeM3 => {
            let model_dir = resolve_model_dir(config.model_dir.as_deref())?;
            Ok(Arc::new(BgeM3Embedder::load(&model_dir, config.dim, config.max_len)?))
        }
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = localrag_core::config::expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { return Ok(p); } }
    for candidate in ["models/bge-m3", "../models/bge-m3"] {
        let p = Path::new(candidate);
        if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate BGE-M3 model directory. Set embedding.model_dir or MODEL_DIR"))
}
