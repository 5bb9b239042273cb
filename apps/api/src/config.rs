use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::embedding::cache::DEFAULT_CAPACITY;
use crate::embedding::hash::DEFAULT_DIMENSION;
use crate::matching::search::{DEFAULT_MIN_QUERY_TOKENS, DEFAULT_SEARCH_LIMIT};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingBackend {
    /// Offline FNV-1a hash embeddings.
    Hash { dimension: usize },
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi {
        base_url: String,
        api_key: String,
        model: String,
        dimensions: Option<usize>,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub policy_path: Option<PathBuf>,
    pub embedding: EmbeddingBackend,
    pub embedding_batch_size: usize,
    pub embedding_cache_size: usize,
    pub min_query_tokens: usize,
    pub search_limit: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            catalog_path: PathBuf::from(require_env("CATALOG_PATH")?),
            policy_path: optional_env("POLICY_PATH").map(PathBuf::from),
            embedding: embedding_backend()?,
            embedding_batch_size: parse_env("EMBEDDING_BATCH_SIZE", 64)?,
            embedding_cache_size: parse_env("EMBEDDING_CACHE_SIZE", DEFAULT_CAPACITY)?,
            min_query_tokens: parse_env("MIN_QUERY_TOKENS", DEFAULT_MIN_QUERY_TOKENS)?,
            search_limit: parse_env("SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn embedding_backend() -> Result<EmbeddingBackend> {
    let backend = optional_env("EMBEDDING_BACKEND").unwrap_or_else(|| "hash".to_string());
    match backend.to_lowercase().as_str() {
        "hash" => Ok(EmbeddingBackend::Hash {
            dimension: parse_env("EMBEDDING_DIMENSIONS", DEFAULT_DIMENSION)?,
        }),
        "openai" => Ok(EmbeddingBackend::OpenAi {
            base_url: optional_env("EMBEDDING_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            api_key: require_env("EMBEDDING_API_KEY")?,
            model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            dimensions: optional_env("EMBEDDING_DIMENSIONS")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("EMBEDDING_DIMENSIONS must be a positive integer")?,
        }),
        other => bail!("EMBEDDING_BACKEND must be 'hash' or 'openai', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
