//! OpenAI-based embedding client implementation.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::Embedder;

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Vector length produced by [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Blocking embeddings client that talks to OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_attempts: usize,
}

impl OpenAiEmbedder {
    /// Builds a new OpenAI embeddings client.
    ///
    /// `max_attempts` of 1 sends each request exactly once.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: String,
        dimensions: Option<usize>,
        timeout: Duration,
        max_attempts: usize,
    ) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        anyhow::ensure!(!model.trim().is_empty(), "missing OpenAI model name");
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build OpenAI HTTP client")?;
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model,
            dimensions,
            max_attempts: max_attempts.max(1),
        })
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn should_retry(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn is_retryable_error(&self, err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, input: &str) -> Result<Vec<f32>> {
        anyhow::ensure!(!input.trim().is_empty(), "refusing to embed blank input");
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input,
                dimensions: self.dimensions,
            };
            let response = self.client.post(&self.endpoint).json(&request).send();
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbeddingResponse = resp
                            .json()
                            .context("failed to parse OpenAI embedding response")?;
                        return parsed.into_vector();
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if self.should_retry(status) && attempt + 1 < self.max_attempts {
                        attempt += 1;
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    anyhow::bail!("OpenAI embeddings request failed ({}): {}", status, body);
                }
                Err(err) => {
                    if self.is_retryable_error(&err) && attempt + 1 < self.max_attempts {
                        attempt += 1;
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(err).context("failed to call OpenAI embeddings endpoint");
                }
            }
        }
    }
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

impl EmbeddingResponse {
    fn into_vector(self) -> Result<Vec<f32>> {
        let mut data = self.data;
        data.sort_by_key(|entry| entry.index);
        let first = data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("OpenAI response contained no embeddings"))?;
        Ok(first.embedding)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_dimensions() {
        let request = EmbeddingRequest {
            model: DEFAULT_EMBEDDING_MODEL,
            input: "Baseball is America's pastime.",
            dimensions: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["model"], "text-embedding-ada-002");
        assert_eq!(json["input"], "Baseball is America's pastime.");
        assert!(json.get("dimensions").is_none());
    }

    #[test]
    fn response_yields_lowest_index_vector() {
        let parsed: EmbeddingResponse = serde_json::from_str(
            r#"{"object": "list", "data": [
                {"object": "embedding", "index": 1, "embedding": [9.0]},
                {"object": "embedding", "index": 0, "embedding": [0.25, -0.5]}
            ], "model": "text-embedding-ada-002"}"#,
        )
        .expect("parse");
        assert_eq!(parsed.into_vector().expect("vector"), vec![0.25, -0.5]);
    }

    #[test]
    fn empty_response_is_an_error() {
        let parsed: EmbeddingResponse = serde_json::from_str(r#"{"data": []}"#).expect("parse");
        assert!(parsed.into_vector().is_err());
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(retry_backoff(1), Duration::from_millis(1000));
        assert_eq!(retry_backoff(9), retry_backoff(5));
    }

    #[test]
    fn rejects_blank_key() {
        let result = OpenAiEmbedder::new(
            "  ",
            DEFAULT_OPENAI_BASE,
            DEFAULT_EMBEDDING_MODEL.to_string(),
            None,
            Duration::from_secs(5),
            1,
        );
        assert!(result.is_err());
    }
}
