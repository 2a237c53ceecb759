//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys) + the short provider
//! variables (`GROQ_API_KEY`, `GROQ_MODEL`, `COLLECTION_NAME`,
//! `EMBEDDING_MODEL`). The result is a typed [`Settings`] value that is built
//! once and handed to each component.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub index: IndexSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory scanned for source PDFs.
    pub data_dir: String,
    /// Directory holding the persistent vector collection.
    pub db_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { data_dir: "./data".into(), db_dir: "./vector_db".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub collection: String,
    pub batch_size: usize,
    /// Clear the collection before ingesting instead of skipping a populated one.
    pub force_reindex: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { collection: "rag_documents".into(), batch_size: 64, force_reindex: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Overrides the built-in syllabus separators when set.
    pub separators: Option<Vec<String>>,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200, separators: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Hugging Face model id, downloaded on first use unless `model_dir` is set.
    pub model: String,
    /// Local directory with `config.json`, `tokenizer.json`, `model.safetensors`.
    pub model_dir: Option<String>,
    pub max_len: usize,
    /// Use the hashing embedder instead of loading a model.
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/all-MiniLM-L6-v2".into(),
            model_dir: None,
            max_len: 256,
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Defaults to the provider's public endpoint.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "groq".into(),
            api_key: None,
            model: "llama-3.1-8b-instant".into(),
            base_url: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl LlmSettings {
    /// The generation credential; its absence is a fatal startup condition.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::InvalidConfig(
                "No valid API key found. Please set GROQ_API_KEY in your .env file".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_n: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_n: 3 } }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be greater than 0".into()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if self.index.batch_size == 0 {
            return Err(Error::InvalidConfig("index.batch_size must be greater than 0".into()));
        }
        if self.index.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("index.collection must not be empty".into()));
        }
        if self.retrieval.top_n == 0 {
            return Err(Error::InvalidConfig("retrieval.top_n must be greater than 0".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::InvalidConfig(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }

    pub fn data_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.data.data_dir) }
    pub fn db_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.data.db_dir) }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Ok(Self { figment: Self::figment_for_env(&env_name) })
    }

    fn figment_for_env(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["GROQ_API_KEY"]).map(|_| "llm.api_key".into()))
            .merge(Env::raw().only(&["GROQ_MODEL"]).map(|_| "llm.model".into()))
            .merge(Env::raw().only(&["COLLECTION_NAME"]).map(|_| "index.collection".into()))
            .merge(Env::raw().only(&["EMBEDDING_MODEL"]).map(|_| "embedding.model".into()))
            .merge(Env::raw().only(&["APP_MODEL_DIR"]).map(|_| "embedding.model_dir".into()))
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if env_flag("APP_USE_FAKE_EMBEDDINGS") {
            settings.embedding.use_fake = true;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
