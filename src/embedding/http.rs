//! OpenAI-compatible `/embeddings` HTTP backend.
//!
//! Request: `{"model": "...", "input": ["...", ...]}`.
//! Response: `{"data": [{"index": 0, "embedding": [...]}, ...]}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::EmbeddingBackend;
use super::error::EmbeddingError;

pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Expected output dimension, if known.
    pub dimension: Option<usize>,
}

impl HttpBackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            dimension: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingBackend {
    client: reqwest::blocking::Client,
    config: HttpBackendConfig,
}

impl std::fmt::Debug for HttpEmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbeddingBackend")
            .field("url", &self.config.url)
            .field("model", &self.config.model)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl HttpEmbeddingBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, EmbeddingError> {
        if config.url.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding endpoint url cannot be empty".to_string(),
            });
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("failed to build http client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }
}

impl EmbeddingBackend for HttpEmbeddingBackend {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            url = %self.config.url,
            model = %self.config.model,
            batch = texts.len(),
            "Calling embedding endpoint"
        );

        let mut request = self.client.post(&self.config.url).json(&EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        });
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, "Embedding endpoint returned an error status");
            return Err(EmbeddingError::backend(
                self.name(),
                format!("status {}: {}", status, body),
            ));
        }

        let mut parsed: EmbeddingResponse = response.json()?;
        if parsed.data.iter().all(|d| d.index.is_some()) {
            parsed.data.sort_by_key(|d| d.index);
        }

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: parsed.data.len(),
            });
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> Option<usize> {
        self.config.dimension
    }

    fn name(&self) -> &str {
        "http"
    }
}
