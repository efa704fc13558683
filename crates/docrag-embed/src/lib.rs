//! docrag-embed
//!
//! Embedding providers: a candle-backed local sentence-embedding model
//! (all-MiniLM-L6-v2 layout) and a deterministic hash embedder for
//! tests and development. `APP_USE_FAKE_EMBEDDINGS=1` selects the hash
//! embedder so nothing downloads or loads model weights.

pub mod device;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use device::select_device;
use pool::masked_mean_l2;
use tokenize::tokenize_padded;

pub use docrag_core::traits::Embedder;

const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
const MAX_TOKENS: usize = 256;
const PAD_TOKEN_ID: u32 = 0;

/// Dimension of the hash embedder, matching the default MiniLM model so
/// fake and real runs produce same-shaped indexes.
pub const HASH_DIM: usize = 384;

/// Sentence embeddings from a local BERT-style model directory holding
/// `tokenizer.json`, `config.json` and either `model.safetensors` or
/// `pytorch_model.bin`.
pub struct LocalEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    name: String,
}

impl LocalEmbedder {
    pub fn new() -> Result<Self> {
        Self::from_dir(&resolve_model_dir()?)
    }

    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!("loading embedding model from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;

        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
        info!("embedding model ready (dim={})", config.hidden_size);

        Ok(Self { model, tokenizer, device, dim: config.hidden_size, name })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) =
            tokenize_padded(&self.tokenizer, text, MAX_TOKENS, PAD_TOKEN_ID, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let row = pooled.squeeze(0)?.to_dtype(DType::F32)?.to_vec1()?;
        Ok(row)
    }
}

impl Embedder for LocalEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_one(text)?);
        }
        Ok(out)
    }
}

/// Deterministic token-hashing embedder. Not semantically meaningful,
/// but stable across runs and L2-normalized, which is all the index and
/// engine tests need.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(HASH_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        "hash-embedder"
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
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
            out.push(v);
        }
        Ok(out)
    }
}

/// The embedder the rest of the system should use:
/// `APP_USE_FAKE_EMBEDDINGS=1` selects the hash embedder, anything else
/// loads the local model.
pub fn default_embedder() -> Result<Box<dyn Embedder>> {
    embedder_from(None)
}

/// Like [`default_embedder`], but with an explicit model directory
/// taking precedence over the search paths.
pub fn embedder_from(model_dir: Option<&Path>) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        info!("using hash embedder");
        return Ok(Box::new(HashEmbedder::default()));
    }
    let embedder = match model_dir {
        Some(dir) => LocalEmbedder::from_dir(dir)?,
        None => LocalEmbedder::new()?,
    };
    Ok(Box::new(embedder))
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // Memory-maps the file; safe as long as it is not modified
        // while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let pytorch = model_dir.join("pytorch_model.bin");
    if pytorch.exists() {
        let weights = candle_core::pickle::read_all(&pytorch)?;
        let weights_map: std::collections::HashMap<String, Tensor> =
            weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(weights_map, DType::F32, device));
    }
    Err(anyhow!(
        "no model weights found in {} (expected model.safetensors or pytorch_model.bin)",
        model_dir.display()
    ))
}

fn resolve_model_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            info!("using APP_MODEL_DIR: {}", p.display());
            return Ok(p);
        }
    }
    for candidate in [
        PathBuf::from(format!("models/{DEFAULT_MODEL_NAME}")),
        PathBuf::from(format!("../models/{DEFAULT_MODEL_NAME}")),
    ] {
        if candidate.exists() {
            info!("using model dir: {}", candidate.display());
            return Ok(candidate);
        }
    }
    Err(anyhow!(
        "could not locate the {DEFAULT_MODEL_NAME} model directory; set APP_MODEL_DIR"
    ))
}
