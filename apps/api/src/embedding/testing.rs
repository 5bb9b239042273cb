//! Scripted embedding provider for tests: fixed vectors per text and call counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{EmbeddingError, EmbeddingProvider};

pub struct ScriptedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    fail: bool,
    batch_calls: AtomicUsize,
    texts_embedded: AtomicUsize,
}

impl ScriptedEmbedder {
    /// Texts not in `vectors` embed to `fallback`.
    pub fn new(vectors: Vec<(&str, Vec<f32>)>, fallback: Vec<f32>) -> Self {
        Self {
            vectors: vectors
                .into_iter()
                .map(|(text, v)| (text.to_string(), v))
                .collect(),
            fallback,
            fail: false,
            batch_calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
        }
    }

    /// A provider whose every call fails as if the model were unreachable.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new(), vec![0.0])
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::Unavailable("scripted failure".to_string()));
        }
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| self.vectors.get(t).unwrap_or(&self.fallback).clone())
            .collect())
    }
}
