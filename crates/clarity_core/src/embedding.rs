//! Embedding model client (Ollama-compatible API) with a process-wide
//! bounded cache.
//!
//! Built once at engine construction and shared read-mostly afterwards;
//! the cache is the only cross-request state in the engine.

use crate::config::EmbeddingConfig;
use crate::error::ModelError;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// HTTP client for the sentence-embedding server.
pub struct EmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout_secs: u64,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let capacity =
            NonZeroUsize::new(config.cache_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Probe the server once at startup. Any non-success counts as down.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Embed one text, cache first.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        if let Some(hit) = self.cache.lock().await.get(text) {
            debug!("embedding cache hit ({} chars)", text.len());
            return Ok(hit.clone());
        }

        let body = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::from_reqwest(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(ModelError::Http(format!(
                "HTTP {} from embedding server",
                response.status()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(ModelError::InvalidResponse(
                "empty embedding vector".to_string(),
            ));
        }

        self.cache
            .lock()
            .await
            .put(text.to_string(), parsed.embedding.clone());
        Ok(parsed.embedding)
    }
}
