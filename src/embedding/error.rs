use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The external embedding call failed; nothing from that call was cached.
    #[error("embedding backend '{backend}' failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("embedding backend returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid embedding configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    pub fn backend(backend: impl Into<String>, reason: impl ToString) -> Self {
        EmbeddingError::Backend {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for failures that originate in the external backend call.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Backend { .. }
                | EmbeddingError::CountMismatch { .. }
                | EmbeddingError::DimensionMismatch { .. }
        )
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::backend("http", err)
    }
}
