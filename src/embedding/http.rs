// OpenAI-compatible embeddings endpoint.
//
// Used when the ONNX model isn't available locally. Any server that speaks
// the `/embeddings` request shape works (OpenAI, Ollama, vLLM, LM Studio).
// Requests are paced through a rate limiter and batched.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::TextEmbedder;

/// Maximum number of texts sent in a single request.
const MAX_BATCH: usize = 64;

/// Embedder that calls a remote `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    rate_limiter: RateLimiter,
}

impl HttpEmbedder {
    pub fn new(base_url: &str, api_key: String, model: String, requests_per_second: f64) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            rate_limiter: RateLimiter::new(requests_per_second),
        }
    }

    async fn request_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut builder = self.client.post(&url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to call embeddings endpoint {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embeddings endpoint returned {}: {}", status, body);
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embeddings response")?;

        let vectors = order_by_index(parsed, texts.len())?;

        debug!(
            count = vectors.len(),
            model = %self.model,
            "Fetched remote embeddings"
        );

        Ok(vectors)
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            out.extend(self.request_chunk(chunk).await?);
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// The API may return items out of order; `index` is authoritative.
fn order_by_index(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f64>>> {
    if response.data.len() != expected {
        anyhow::bail!(
            "Embeddings endpoint returned {} vectors for {} inputs",
            response.data.len(),
            expected
        );
    }

    let mut slots: Vec<Option<Vec<f64>>> = vec![None; expected];
    for item in response.data {
        let slot = slots
            .get_mut(item.index)
            .with_context(|| format!("Embedding index {} out of range", item.index))?;
        *slot = Some(item.embedding);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.with_context(|| format!("Missing embedding for input {i}")))
        .collect()
}

// --- request/response types ---

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_order_by_index_reorders() {
        let resp = parse(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        );
        let vectors = order_by_index(resp, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_order_by_index_rejects_count_mismatch() {
        let resp = parse(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#);
        assert!(order_by_index(resp, 2).is_err());
    }

    #[test]
    fn test_order_by_index_rejects_duplicate_index() {
        let resp = parse(
            r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[2.0]}]}"#,
        );
        assert!(order_by_index(resp, 2).is_err());
    }

    #[test]
    fn test_request_serializes_openai_shape() {
        let input = vec!["Leadership".to_string()];
        let req = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "text-embedding-3-small");
        assert_eq!(json["input"][0], "Leadership");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let e = HttpEmbedder::new("http://localhost:11434/v1/", String::new(), "m".into(), 1.0);
        assert_eq!(e.base_url, "http://localhost:11434/v1");
    }
}
