//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `CURATOR_*` env vars (nested keys split on `__`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name, Path::new("."))
    }

    /// Load using `dir` as the location of the TOML files.
    pub fn load_for_env(env_name: &str, dir: &Path) -> crate::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("CURATOR_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> crate::Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub chunking: ChunkingConfig,
    pub ingestion: IngestionSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        let c = &self.chunking;
        if c.max_chars == 0 {
            return Err(Error::InvalidConfig("chunking.max_chars must be positive".into()));
        }
        if c.overlap >= c.max_chars {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_chars ({})",
                c.overlap, c.max_chars
            )));
        }
        if self.retrieval.timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval.timeout_ms must be positive".into()));
        }
        if self.ingestion.concurrency == 0 {
            return Err(Error::InvalidConfig("ingestion.concurrency must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub sqlite_path: String,
    pub lancedb_dir: String,
    pub chunks_table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "data/curator.db".to_string(),
            lancedb_dir: "data/lancedb".to_string(),
            chunks_table: "chunks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_limit: usize,
    pub per_retriever_limit: usize,
    /// Bounded wait for the whole retriever fan-out.
    pub timeout_ms: u64,
    pub keyword_timeout_ms: u64,
    /// Bound on query classification plus the graph reachability check.
    pub routing_timeout_ms: u64,
    pub graph_max_neighbors: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_limit: 5,
            per_retriever_limit: 10,
            timeout_ms: 20_000,
            keyword_timeout_ms: 10_000,
            routing_timeout_ms: 10_000,
            graph_max_neighbors: 8,
        }
    }
}

/// Length units are characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap: usize,
    pub summary_prefix_chars: usize,
    /// Markup shorter than this is not worth converting.
    pub min_markup_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 1000, overlap: 200, summary_prefix_chars: 200, min_markup_chars: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    pub recency_days: i64,
    pub feedback_examples: usize,
    pub concurrency: usize,
    pub fallback_keywords: Vec<String>,
    /// URL fragments the keyword heuristic accepts without a keyword match.
    pub always_relevant_urls: Vec<String>,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            recency_days: 90,
            feedback_examples: 3,
            concurrency: 4,
            fallback_keywords: ["ai", "gpt", "llm", "rag", "transformer", "learning", "model", "prompt", "agent"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            always_relevant_urls: vec!["github.com/trending".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub use_fake: bool,
    pub max_len: usize,
    pub dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, use_fake: false, max_len: 256, dim: 1024 }
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

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
