use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntityError {
    /// The token classifier failed to label the input.
    #[error("token classifier '{classifier}' failed: {reason}")]
    Classifier { classifier: String, reason: String },

    #[error("token classifier returned {actual} labels for {expected} words")]
    LabelCountMismatch { expected: usize, actual: usize },
}
