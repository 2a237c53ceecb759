//! Sentence embeddings for chunks and queries.
//!
//! [`BertEmbedder`] runs a BERT-family sentence-transformer (default
//! `all-MiniLM-L6-v2`, D = 384) through candle with masked mean pooling and
//! L2 normalisation. [`FakeEmbedder`] hashes tokens into a fixed-size vector
//! and is used for tests and offline development.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Instant;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use syllabus_core::config::EmbeddingSettings;
use syllabus_core::traits::Embedder;
use syllabus_core::Error;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

const BERT_PAD_ID: u32 = 0;
pub const FAKE_EMBEDDING_DIM: usize = 384;

/// The subset of `config.json` needed before the model is built.
#[derive(Deserialize)]
struct ModelShape {
    hidden_size: usize,
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
}

impl BertEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let device = device::select_device();
        let files = resolve_model_files(settings)?;
        info!(model = %settings.model, "loading embedding model");

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", files.tokenizer.display(), e))?;
        let raw_config = std::fs::read_to_string(&files.config)
            .with_context(|| format!("Failed to read {}", files.config.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config).context("Failed to parse model config")?;
        let shape: ModelShape = serde_json::from_str(&raw_config).context("Model config has no hidden_size")?;

        // SAFETY: the weights file is only read, and is not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)? };
        let model = BertModel::load(vb, &config).context("Failed to build BERT model")?;
        info!(dim = shape.hidden_size, "embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            id: format!("bert:{}", settings.model),
            dim: shape.hidden_size,
            max_len: settings.max_len,
        })
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, BERT_PAD_ID, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(vectors)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> syllabus_core::Result<Vec<Vec<f32>>> {
        self.embed_texts(texts).map_err(|e| Error::Embedding(format!("{e:#}")))
    }
}

/// Deterministic bag-of-words hashing embedder, L2-normalised.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake-hash:d{dim}") } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self { Self::new(FAKE_EMBEDDING_DIM) }
}

impl Embedder for FakeEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> syllabus_core::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Select the embedder named by configuration.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> syllabus_core::Result<Box<dyn Embedder>> {
    if settings.use_fake {
        info!("using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::default()));
    }
    let embedder = BertEmbedder::new(settings).map_err(|e| Error::Embedding(format!("{e:#}")))?;
    Ok(Box::new(embedder))
}

fn resolve_model_files(settings: &EmbeddingSettings) -> Result<ModelFiles> {
    if let Some(dir) = settings.model_dir.as_deref() {
        let dir = syllabus_core::config::expand_path(dir);
        if !dir.is_dir() {
            return Err(anyhow!("embedding.model_dir {} does not exist", dir.display()));
        }
        info!(dir = %dir.display(), "using local model directory");
        return Ok(ModelFiles {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        });
    }
    let api = Api::new().context("Failed to create Hugging Face API client")?;
    let repo = api.repo(Repo::new(settings.model.clone(), RepoType::Model));
    Ok(ModelFiles {
        config: repo.get("config.json").context("Failed to fetch config.json")?,
        tokenizer: repo.get("tokenizer.json").context("Failed to fetch tokenizer.json")?,
        weights: repo.get("model.safetensors").context("Failed to fetch model.safetensors")?,
    })
}
