//! HTTP client for an Ollama-compatible embedding endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{EmbedError, EmbeddingProvider};

pub const DEFAULT_MODEL: &str = "qwen3-embedding-4b";
pub const DEFAULT_DIMENSION: usize = 2560;

const DEFAULT_BATCH_SIZE: usize = 50;
/// Batched embedding calls are slow for large codes; bounded well above
/// the per-request network timeout used elsewhere.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Embedding client for Ollama's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dim: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create a client for the given base URL (no trailing slash needed),
    /// model name, and expected vector dimension. `auth_token`, when
    /// present, is sent as a bearer token.
    pub fn new(
        base_url: &str,
        model: &str,
        dim: usize,
        auth_token: Option<&str>,
    ) -> Result<Self, EmbedError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| EmbedError::Config("auth token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dim,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Override the declared per-request batch limit.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let resp = self.client.post(&url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let response: EmbedResponse = resp.json().await?;
        if response.embeddings.len() != texts.len() {
            return Err(EmbedError::CountMismatch {
                expected: texts.len(),
                got: response.embeddings.len(),
            });
        }
        for vector in &response.embeddings {
            if vector.len() != self.dim {
                return Err(EmbedError::Dimension {
                    expected: self.dim,
                    got: vector.len(),
                });
            }
        }

        debug!(count = response.embeddings.len(), model = %self.model, "generated embeddings");
        Ok(response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let embedder =
            OllamaEmbedder::new("http://localhost:11434/", DEFAULT_MODEL, 4, None).unwrap();
        assert_eq!(embedder.base_url, "http://localhost:11434");
        assert_eq!(embedder.dimension(), 4);
        assert_eq!(embedder.max_batch_size(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn batch_size_never_zero() {
        let embedder = OllamaEmbedder::new("http://localhost:11434", DEFAULT_MODEL, 4, None)
            .unwrap()
            .with_batch_size(0);
        assert_eq!(embedder.max_batch_size(), 1);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_request() {
        // Unroutable base URL: the validation must fire first.
        let embedder =
            OllamaEmbedder::new("http://invalid.localdomain:1", DEFAULT_MODEL, 4, None).unwrap();
        let err = embedder.embed(&[]).await.unwrap_err();
        assert!(matches!(err, EmbedError::EmptyInput));
    }

    #[test]
    fn response_body_shape() {
        let response: EmbedResponse =
            serde_json::from_str(r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[0], vec![0.1, 0.2]);
    }

    #[test]
    fn request_body_shape() {
        let texts = vec!["erster".to_string(), "zweiter".to_string()];
        let request = EmbedRequest {
            model: "qwen3-embedding-4b",
            input: &texts,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "qwen3-embedding-4b");
        assert_eq!(json["input"][1], "zweiter");
    }
}
