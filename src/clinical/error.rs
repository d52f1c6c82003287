use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClinicalKnowledgeError {
    #[error("failed to read clinical knowledge file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse clinical knowledge: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid clinical knowledge: {reason}")]
    Invalid { reason: String },
}
