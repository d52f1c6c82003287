//! Top-level error for engine operations.

use thiserror::Error;

use crate::clinical::ClinicalKnowledgeError;
use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use crate::rerank::RerankError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The embedding backend failed; callers may fall back to lexical-only search.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("reranker error: {0}")]
    Rerank(#[from] RerankError),

    #[error("clinical knowledge error: {0}")]
    ClinicalKnowledge(#[from] ClinicalKnowledgeError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid document '{document_id}': {reason}")]
    InvalidDocument { document_id: String, reason: String },
}

impl EngineError {
    /// Returns `true` when the failure came from the embedding backend.
    pub fn is_embedding_failure(&self) -> bool {
        matches!(self, EngineError::Embedding(e) if e.is_backend_failure())
    }
}
