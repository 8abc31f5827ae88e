use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::services::cache::EmbeddingCache;

/// Errors that can occur when embedding text
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Embedding service returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Client for an Ollama-compatible embedding endpoint
///
/// Used for query vectors at match time and for trial vectors during ingestion.
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: Client,
    cache: Option<EmbeddingCache>,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            model,
            client,
            cache: None,
        })
    }

    /// Attach a cache consulted before every request
    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&EmbeddingCache> {
        self.cache.as_ref()
    }

    /// Embed a single text
    pub async fn embed(&self, text: &str) -> Result<Arc<Vec<f32>>, EmbeddingError> {
        if let Some(cache) = &self.cache {
            if let Some(vector) = cache.get(text).await {
                return Ok(vector);
            }
        }

        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ApiError(format!(
                "Failed to embed text: {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if body.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse("Empty embedding".into()));
        }

        let vector = Arc::new(body.embedding);
        if let Some(cache) = &self.cache {
            cache.insert(text, vector.clone()).await;
        }

        tracing::debug!("Embedded {} chars into {} dimensions", text.len(), vector.len());

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embed_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": [0.5, -0.25, 1.0]}"#)
            .create_async()
            .await;

        let client = EmbeddingClient::new(server.url(), "all-minilm".into(), 5).unwrap();
        let vector = client.embed("Clinical trials for: asthma").await.unwrap();

        assert_eq!(vector.as_slice(), &[0.5, -0.25, 1.0]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_uses_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_body(r#"{"embedding": [1.0]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = EmbeddingClient::new(server.url(), "all-minilm".into(), 5)
            .unwrap()
            .with_cache(EmbeddingCache::new(10, 60));

        client.embed("same text").await.unwrap();
        client.embed("same text").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embeddings")
            .with_status(500)
            .create_async()
            .await;

        let client = EmbeddingClient::new(server.url(), "all-minilm".into(), 5).unwrap();
        let err = client.embed("text").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_embed_empty_vector_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_body(r#"{"embedding": []}"#)
            .create_async()
            .await;

        let client = EmbeddingClient::new(server.url(), "all-minilm".into(), 5).unwrap();
        let err = client.embed("text").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }
}
