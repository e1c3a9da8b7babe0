//! Embedding generation: turns a fingerprint's text projection into a dense
//! vector for the vector store.

pub mod vector_store;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Error, Result};

/// Native output dimensionality of the configured embedding model.
pub const EMBEDDING_DIMENSION: usize = 768;

/// Generates embeddings for fingerprint text projections. Implementations
/// must not retry internally — retry policy belongs to the caller, if any.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// The fixed dimensionality every vector this client produces has.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

fn build_http_client(timeout: Duration) -> Client {
    match catch_unwind(AssertUnwindSafe(|| Client::builder().timeout(timeout).build())) {
        Ok(Ok(client)) => client,
        Ok(Err(_)) | Err(_) => Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client"),
    }
}

/// Calls a Gemini-style `embedContent` endpoint.
pub struct GenerativeEmbeddingClient {
    api_key: String,
    http: Client,
    model: String,
}

impl GenerativeEmbeddingClient {
    const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    const DEFAULT_MODEL: &'static str = "text-embedding-004";

    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            http: build_http_client(timeout),
            model: Self::DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequestBody<'a> {
    content: EmbedContent<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponseBody {
    embedding: EmbedValues,
}

#[derive(Debug, Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for GenerativeEmbeddingClient {
    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            Self::DEFAULT_BASE_URL,
            self.model,
            self.api_key
        );

        let body = EmbedRequestBody {
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider_transient("embedding", e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::provider_transient(
                "embedding",
                format!("http {}", response.status()),
            ));
        }

        let parsed: EmbedResponseBody = response
            .json()
            .await
            .map_err(|e| Error::provider_transient("embedding", e.to_string()))?;

        Ok(parsed.embedding.values)
    }
}
