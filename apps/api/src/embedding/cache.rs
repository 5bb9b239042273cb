//! Embedding cache: memoises vectors by content fingerprint.
//!
//! Key: SHA-256 of `model_id` + text, so a model change never serves stale vectors.
//! Invalidated on catalog reload. Only misses reach the inner provider, as one batch.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{EmbeddingError, EmbeddingProvider};

pub const DEFAULT_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    entries: Mutex<LruCache<String, Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Drops every cached vector. Called whenever the catalog snapshot changes.
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        debug!("Embedding cache invalidated ({dropped} entries dropped)");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }

    fn fingerprint(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.inner.model_id().as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let keys: Vec<String> = texts.iter().map(|t| self.fingerprint(t)).collect();

        // Lookups happen under the lock; the provider call must not.
        let mut resolved: HashMap<&str, Vec<f32>> = HashMap::new();
        let mut pending: Vec<(&str, &String)> = Vec::new();
        {
            let mut entries = self.entries.lock();
            for (key, text) in keys.iter().zip(texts) {
                if resolved.contains_key(key.as_str())
                    || pending.iter().any(|(k, _)| *k == key.as_str())
                {
                    continue;
                }
                match entries.get(key) {
                    Some(vector) => {
                        resolved.insert(key.as_str(), vector.clone());
                    }
                    None => pending.push((key.as_str(), text)),
                }
            }
        }

        let hits = texts.len() - pending.len();
        self.hits.fetch_add(hits as u64, Ordering::Relaxed);
        self.misses
            .fetch_add(pending.len() as u64, Ordering::Relaxed);

        if !pending.is_empty() {
            let inputs: Vec<String> = pending.iter().map(|(_, t)| (*t).clone()).collect();
            let vectors = self.inner.embed_batch(&inputs).await?;
            if vectors.len() != inputs.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: inputs.len(),
                    got: vectors.len(),
                });
            }

            let mut entries = self.entries.lock();
            for ((key, _), vector) in pending.into_iter().zip(vectors) {
                entries.put(key.to_string(), vector.clone());
                resolved.insert(key, vector);
            }
        }

        debug!(
            "Embedding batch: {} inputs, {} cache hits",
            texts.len(),
            hits
        );

        keys.iter()
            .map(|key| {
                resolved.get(key.as_str()).cloned().ok_or_else(|| {
                    EmbeddingError::Unavailable("cached embedding missing for input".to_string())
                })
            })
            .collect()
    }
}
