//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `MEDRANK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CANDIDATE_MULTIPLIER, DEFAULT_EMBED_BATCH_SIZE,
    DEFAULT_EMBEDDING_DIM, DEFAULT_FUSION_ALPHA, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_RRF_K,
};
use crate::embedding::http::DEFAULT_EMBEDDING_MODEL;
use crate::embedding::{
    EmbeddingBackend, EmbeddingCacheConfig, EmbeddingError, HttpBackendConfig,
    HttpEmbeddingBackend, StubEmbeddingBackend,
};
use crate::fusion::FusionConfig;
use crate::rerank::{RerankerConfig, RerankerWeights};

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `MEDRANK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Max entries in the embedding cache. Default: `100_000`.
    pub cache_capacity: u64,

    /// Max texts per embedding backend call. Default: `32`.
    pub embed_batch_size: usize,

    /// Embedding dimension. Default: `384`.
    pub embedding_dim: usize,

    /// OpenAI-compatible embeddings endpoint. `None` selects the stub backend.
    pub embedding_url: Option<String>,

    /// Model name sent to the embeddings endpoint.
    pub embedding_model: String,

    /// Bearer token for the embeddings endpoint.
    pub embedding_api_key: Option<String>,

    /// JSON clinical knowledge tables. `None` uses the built-in tables.
    pub clinical_knowledge_path: Option<PathBuf>,

    /// Default semantic weight in fusion. Default: `0.5`.
    pub fusion_alpha: f32,

    /// Fusion pool is `top_k * candidate_multiplier`. Default: `3`.
    pub candidate_multiplier: usize,

    /// RRF damping constant. Default: `60`.
    pub rrf_k: f32,

    /// Reranker signal weights.
    pub weights: RerankerWeights,

    /// Candidate count at which reranking goes parallel. Default: `64`.
    pub parallel_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            embedding_url: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_key: None,
            clinical_knowledge_path: None,
            fusion_alpha: DEFAULT_FUSION_ALPHA,
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
            rrf_k: DEFAULT_RRF_K,
            weights: RerankerWeights::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl Config {
    const ENV_CACHE_CAPACITY: &'static str = "MEDRANK_CACHE_CAPACITY";
    const ENV_EMBED_BATCH_SIZE: &'static str = "MEDRANK_EMBED_BATCH_SIZE";
    const ENV_EMBEDDING_DIM: &'static str = "MEDRANK_EMBEDDING_DIM";
    const ENV_EMBEDDING_URL: &'static str = "MEDRANK_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "MEDRANK_EMBEDDING_MODEL";
    const ENV_EMBEDDING_API_KEY: &'static str = "MEDRANK_EMBEDDING_API_KEY";
    const ENV_CLINICAL_KNOWLEDGE: &'static str = "MEDRANK_CLINICAL_KNOWLEDGE";
    const ENV_FUSION_ALPHA: &'static str = "MEDRANK_FUSION_ALPHA";
    const ENV_CANDIDATE_MULTIPLIER: &'static str = "MEDRANK_CANDIDATE_MULTIPLIER";
    const ENV_RRF_K: &'static str = "MEDRANK_RRF_K";
    const ENV_WEIGHT_SEMANTIC: &'static str = "MEDRANK_WEIGHT_SEMANTIC";
    const ENV_WEIGHT_LEXICAL: &'static str = "MEDRANK_WEIGHT_LEXICAL";
    const ENV_WEIGHT_ENTITY: &'static str = "MEDRANK_WEIGHT_ENTITY";
    const ENV_WEIGHT_MEDICAL_CONTEXT: &'static str = "MEDRANK_WEIGHT_MEDICAL_CONTEXT";
    const ENV_PARALLEL_THRESHOLD: &'static str = "MEDRANK_PARALLEL_THRESHOLD";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Unparseable values are errors, not silently defaulted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let weights = RerankerWeights::new(
            Self::parse_float_from_env(Self::ENV_WEIGHT_SEMANTIC, defaults.weights.semantic)?,
            Self::parse_float_from_env(Self::ENV_WEIGHT_LEXICAL, defaults.weights.lexical)?,
            Self::parse_float_from_env(Self::ENV_WEIGHT_ENTITY, defaults.weights.entity)?,
            Self::parse_float_from_env(
                Self::ENV_WEIGHT_MEDICAL_CONTEXT,
                defaults.weights.medical_context,
            )?,
        );

        Ok(Self {
            cache_capacity: Self::parse_int_from_env(
                Self::ENV_CACHE_CAPACITY,
                defaults.cache_capacity,
            )?,
            embed_batch_size: Self::parse_int_from_env(
                Self::ENV_EMBED_BATCH_SIZE,
                defaults.embed_batch_size,
            )?,
            embedding_dim: Self::parse_int_from_env(
                Self::ENV_EMBEDDING_DIM,
                defaults.embedding_dim,
            )?,
            embedding_url: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_URL),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            embedding_api_key: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY),
            clinical_knowledge_path: Self::parse_optional_string_from_env(
                Self::ENV_CLINICAL_KNOWLEDGE,
            )
            .map(PathBuf::from),
            fusion_alpha: Self::parse_float_from_env(
                Self::ENV_FUSION_ALPHA,
                defaults.fusion_alpha,
            )?,
            candidate_multiplier: Self::parse_int_from_env(
                Self::ENV_CANDIDATE_MULTIPLIER,
                defaults.candidate_multiplier,
            )?,
            rrf_k: Self::parse_float_from_env(Self::ENV_RRF_K, defaults.rrf_k)?,
            weights,
            parallel_threshold: Self::parse_int_from_env(
                Self::ENV_PARALLEL_THRESHOLD,
                defaults.parallel_threshold,
            )?,
        })
    }

    /// Validates ranges and paths (does not read the clinical knowledge file).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(Self::invalid(Self::ENV_CACHE_CAPACITY, "must be at least 1"));
        }
        if self.embed_batch_size == 0 {
            return Err(Self::invalid(Self::ENV_EMBED_BATCH_SIZE, "must be at least 1"));
        }
        if self.embedding_dim == 0 {
            return Err(Self::invalid(Self::ENV_EMBEDDING_DIM, "cannot be zero"));
        }
        if !self.fusion_alpha.is_finite() || !(0.0..=1.0).contains(&self.fusion_alpha) {
            return Err(Self::invalid(Self::ENV_FUSION_ALPHA, "must be within [0, 1]"));
        }
        if self.candidate_multiplier == 0 {
            return Err(Self::invalid(
                Self::ENV_CANDIDATE_MULTIPLIER,
                "must be at least 1",
            ));
        }
        if !self.rrf_k.is_finite() || self.rrf_k < 0.0 {
            return Err(Self::invalid(Self::ENV_RRF_K, "must be finite and non-negative"));
        }
        self.weights
            .normalized()
            .map_err(|e| Self::invalid("MEDRANK_WEIGHT_*", e.to_string()))?;

        if let Some(ref path) = self.clinical_knowledge_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// HTTP backend when a URL is configured, otherwise the deterministic stub.
    pub fn embedding_backend(&self) -> Result<Arc<dyn EmbeddingBackend>, EmbeddingError> {
        match self.embedding_url {
            Some(ref url) => {
                let mut http = HttpBackendConfig::new(url.clone())
                    .with_model(self.embedding_model.clone())
                    .with_dimension(self.embedding_dim);
                if let Some(ref key) = self.embedding_api_key {
                    http = http.with_api_key(key.clone());
                }
                Ok(Arc::new(HttpEmbeddingBackend::new(http)?))
            }
            None => Ok(Arc::new(StubEmbeddingBackend::new(self.embedding_dim)?)),
        }
    }

    pub fn cache_config(&self) -> EmbeddingCacheConfig {
        EmbeddingCacheConfig::default()
            .with_capacity(self.cache_capacity)
            .with_max_batch_size(self.embed_batch_size)
            .with_expected_dim(self.embedding_dim)
    }

    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig {
            k: self.rrf_k,
            default_alpha: self.fusion_alpha,
        }
    }

    pub fn reranker_config(&self) -> RerankerConfig {
        RerankerConfig::default()
            .with_weights(self.weights)
            .with_parallel_threshold(self.parallel_threshold)
    }

    fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            name,
            reason: reason.into(),
        }
    }

    fn parse_int_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::IntParse {
                    name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_float_from_env(name: &'static str, default: f32) -> Result<f32, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::FloatParse {
                    name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_string_from_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(name).unwrap_or(default)
    }
}
