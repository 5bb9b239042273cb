//! OpenAI-compatible embedding client.
//!
//! Posts batches to `{base_url}/embeddings`, capped at the configured batch size.
//! 429, 5xx and transport failures are retried with exponential backoff, and a
//! response whose indices are not exactly `0..n` is rejected.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{EmbeddingError, EmbeddingProvider};

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: Option<usize>,
    pub batch_size: usize,
}

pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    model_id: String,
    dimensions: Option<usize>,
    batch_size: usize,
    /// Delay before the first retry; doubles on each further attempt.
    backoff: Duration,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let model_id = match config.dimensions {
            Some(d) => format!("{}-{d}", config.model),
            None => config.model.clone(),
        };
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key: config.api_key,
            model: config.model,
            model_id,
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
            backoff: INITIAL_BACKOFF,
        })
    }

    /// Sends one request of at most `batch_size` inputs, retrying transient failures.
    async fn embed_chunk(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.backoff * 2u32.pow(attempt - 1);
                warn!(
                    "Embedding request attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, body);
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let mut parsed: EmbeddingResponse = response.json().await?;
            if parsed.data.len() != inputs.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: inputs.len(),
                    got: parsed.data.len(),
                });
            }
            parsed.data.sort_by_key(|entry| entry.index);
            let in_order = parsed
                .data
                .iter()
                .enumerate()
                .all(|(position, entry)| entry.index == position);
            if !in_order {
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: "response indices do not match the inputs".to_string(),
                });
            }

            debug!("Embedded {} inputs with {}", inputs.len(), self.model);
            let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|e| e.embedding).collect();
            return Ok(vectors);
        }

        Err(last_error.unwrap_or_else(|| {
            EmbeddingError::Unavailable(format!("no response after {MAX_RETRIES} attempts"))
        }))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_chunk(chunk).await?);
        }
        Ok(vectors)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    fn config(dimensions: Option<usize>) -> HttpEmbedderConfig {
        HttpEmbedderConfig {
            base_url: "http://localhost:9/v1/".to_string(),
            api_key: "test-key".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions,
            batch_size: 0,
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let embedder = HttpEmbedder::new(config(None)).unwrap();
        assert_eq!(embedder.endpoint, "http://localhost:9/v1/embeddings");
        assert_eq!(embedder.batch_size, 1);
    }

    #[test]
    fn test_model_id_includes_requested_dimension() {
        assert_eq!(
            HttpEmbedder::new(config(Some(256))).unwrap().model_id(),
            "text-embedding-3-small-256"
        );
        assert_eq!(
            HttpEmbedder::new(config(None)).unwrap().model_id(),
            "text-embedding-3-small"
        );
    }

    #[test]
    fn test_request_omits_absent_dimensions() {
        let input = vec!["a".to_string()];
        let body = serde_json::to_value(EmbeddingRequest {
            model: "m",
            input: &input,
            dimensions: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "model": "m", "input": ["a"] }));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let embedder = HttpEmbedder::new(config(None)).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    // Local stand-in for the embeddings endpoint.

    /// Maps (0-based call number, request body) to (status, response body).
    type Reply = Arc<dyn Fn(usize, &Value) -> (u16, Value) + Send + Sync>;

    fn reply(f: impl Fn(usize, &Value) -> (u16, Value) + Send + Sync + 'static) -> Reply {
        Arc::new(f)
    }

    #[derive(Clone)]
    struct Upstream {
        calls: Arc<AtomicUsize>,
        reply: Reply,
    }

    async fn handle_embeddings(
        State(upstream): State<Upstream>,
        Json(body): Json<Value>,
    ) -> (axum::http::StatusCode, Json<Value>) {
        let call = upstream.calls.fetch_add(1, Ordering::SeqCst);
        let (status, reply) = (upstream.reply)(call, &body);
        let status = axum::http::StatusCode::from_u16(status).unwrap();
        (status, Json(reply))
    }

    async fn serve(batch_size: usize, reply: Reply) -> (HttpEmbedder, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let upstream = Upstream {
            calls: calls.clone(),
            reply,
        };
        let app = Router::new()
            .route("/v1/embeddings", post(handle_embeddings))
            .with_state(upstream);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut embedder = HttpEmbedder::new(HttpEmbedderConfig {
            base_url: format!("http://{addr}/v1"),
            batch_size,
            ..config(None)
        })
        .unwrap();
        embedder.client = Client::builder().no_proxy().build().unwrap();
        embedder.backoff = Duration::from_millis(5);
        (embedder, calls)
    }

    fn input_count(body: &Value) -> usize {
        body["input"].as_array().map_or(0, Vec::len)
    }

    /// One vector per requested text, listed in reverse index order.
    /// Each vector holds the number at the end of its input ("t3" → [3.0]).
    fn reversed_vectors(body: &Value) -> Value {
        let inputs = body["input"].as_array().cloned().unwrap_or_default();
        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(index, text)| {
                let n: f32 = text.as_str().unwrap()[1..].parse().unwrap();
                json!({ "index": index, "embedding": [n] })
            })
            .collect();
        json!({ "data": data })
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{i}")).collect()
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_with_backoff() {
        let upstream = reply(|call, body| match call {
            0 | 1 => (503, json!({ "error": { "message": "overloaded" } })),
            _ => (200, reversed_vectors(body)),
        });
        let (embedder, calls) = serve(8, upstream).await;

        let started = Instant::now();
        let vectors = embedder.embed_batch(&texts(2)).await.unwrap();
        assert_eq!(vectors, vec![vec![0.0], vec![1.0]]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 5ms before the second attempt, 10ms before the third
        assert!(started.elapsed() >= Duration::from_millis(15));
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_three_attempts() {
        let upstream = reply(|_, _| (429, json!({ "error": { "message": "slow down" } })));
        let (embedder, calls) = serve(8, upstream).await;

        let err = embedder.embed_batch(&texts(1)).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Api { status: 429, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_fails_fast_with_api_message() {
        let upstream = reply(|_, _| (400, json!({ "error": { "message": "bad input" } })));
        let (embedder, calls) = serve(8, upstream).await;

        match embedder.embed_batch(&texts(1)).await {
            Err(EmbeddingError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad input");
            }
            other => panic!("expected an API error, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_response_is_count_mismatch() {
        let upstream = reply(|_, body| {
            let data: Vec<Value> = (0..input_count(body) - 1)
                .map(|index| json!({ "index": index, "embedding": [0.5] }))
                .collect();
            (200, json!({ "data": data }))
        });
        let (embedder, calls) = serve(8, upstream).await;

        let err = embedder.embed_batch(&texts(3)).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::CountMismatch { .. }));
        assert_eq!(err.to_string(), "provider returned 2 embeddings for 3 inputs");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeated_indices_are_rejected() {
        let upstream = reply(|_, _| {
            let entry = json!({ "index": 0, "embedding": [0.5] });
            (200, json!({ "data": [entry.clone(), entry] }))
        });
        let (embedder, _) = serve(8, upstream).await;

        let err = embedder.embed_batch(&texts(2)).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_inputs_are_chunked_by_batch_size_in_order() {
        let upstream = reply(|_, body| (200, reversed_vectors(body)));
        let (embedder, calls) = serve(2, upstream).await;

        let vectors = embedder.embed_batch(&texts(5)).await.unwrap();
        let expected: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32]).collect();
        assert_eq!(vectors, expected);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_after_retries() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut embedder = HttpEmbedder::new(HttpEmbedderConfig {
            base_url: format!("http://{addr}/v1"),
            ..config(None)
        })
        .unwrap();
        embedder.client = Client::builder().no_proxy().build().unwrap();
        embedder.backoff = Duration::from_millis(1);

        let err = embedder.embed_batch(&texts(1)).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Http(_)));
    }
}
