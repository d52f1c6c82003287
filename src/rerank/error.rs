use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankError {
    /// Weights or tuning constants rejected at construction.
    #[error("invalid reranker configuration: {reason}")]
    Configuration { reason: String },
}

impl RerankError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        RerankError::Configuration {
            reason: reason.into(),
        }
    }
}
