use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub source: SourceConfig,
    pub chat: ChatConfig,
    pub search: SearchConfig,
    pub pages: Vec<PageSpec>,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub uri: String,
    pub collection: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingBackend {
    #[serde(rename = "bge-m3")]
    BgeM3,
    #[serde(rename = "fake")]
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Directory holding `tokenizer.json`, `config.json` and `pytorch_model.bin`.
    pub model_dir: Option<String>,
    pub dim: usize,
    pub max_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub drop_if_blank: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Wikipedia,
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub api_url: String,
    pub user_agent: String,
    pub language: String,
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub limit: usize,
}

/// A page to ingest and the label its chunks are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    pub title: String,
    pub category: String,
}

impl PageSpec {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self { title: title.into(), category: category.into() }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let settings: Settings = Self::figment_for_env(env_name)
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate_for_env(env_name)?;
        tracing::debug!(env = env_name, ?settings, "configuration loaded");
        Ok(settings)
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
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn validate_for_env(&self, env_name: &str) -> Result<()> {
        if self.chat.model.trim().is_empty() {
            return Err(Error::InvalidConfig("chat.model must not be empty".into()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be positive".into()));
        }
        if self.search.limit == 0 {
            return Err(Error::InvalidConfig("search.limit must be >= 1".into()));
        }
        if self.pages.is_empty() {
            return Err(Error::InvalidConfig("at least one page must be configured".into()));
        }
        if self.source.kind == SourceKind::Directory && self.source.dir.is_none() {
            return Err(Error::InvalidConfig("source.dir is required for the directory source".into()));
        }
        match env_name {
            "prod" | "production" => {
                if self.embedding.backend == EmbeddingBackend::Fake {
                    return Err(Error::InvalidConfig("fake embeddings are not allowed in prod".into()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        expand_path(&self.store.uri)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreConfig { uri: "./data/lancedb".to_string(), collection: "docs".to_string() },
            embedding: EmbeddingConfig {
                backend: EmbeddingBackend::BgeM3,
                model_dir: None,
                dim: 1024,
                max_len: 256,
            },
            chunking: ChunkingConfig { drop_if_blank: true },
            source: SourceConfig {
                kind: SourceKind::Wikipedia,
                api_url: "https://{lang}.wikipedia.org/w/api.php".to_string(),
                user_agent: "RAGBot9000".to_string(),
                language: "en".to_string(),
                dir: None,
            },
            chat: ChatConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
                max_retries: 3,
                backoff_ms: 500,
                connect_timeout_secs: 10,
            },
            search: SearchConfig { limit: 1 },
            pages: vec![
                PageSpec::new("Maru (cat)", "cat"),
                PageSpec::new("Venus Anadyomene (Titian)", "painting"),
            ],
            query: "Who is Maru?".to_string(),
        }
    }
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
