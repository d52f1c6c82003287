//! Embedding backend seam and the deterministic stub backend.

use tracing::debug;

use crate::hashing::hash_to_u64;

use super::error::EmbeddingError;

/// External text → vector function.
///
/// Implementations must return exactly one vector per input, in input order.
pub trait EmbeddingBackend: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Output dimension, when the backend knows it up front.
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Deterministic hashed bag-of-words embedder.
///
/// Every lowercase alphanumeric token is hashed into one of `dim` buckets and the
/// result is L2-normalized. Texts sharing vocabulary get higher cosine similarity,
/// which is enough for tests and the demo binary. No model files are needed.
#[derive(Debug, Clone)]
pub struct StubEmbeddingBackend {
    dim: usize,
}

impl StubEmbeddingBackend {
    pub fn new(dim: usize) -> Result<Self, EmbeddingError> {
        if dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "stub embedding dimension cannot be zero".to_string(),
            });
        }
        Ok(Self { dim })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        let lower = text.to_lowercase();

        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = hash_to_u64(token.as_bytes());
            let bucket = (h % self.dim as u64) as usize;
            // High bits pick the sign so unrelated tokens partly cancel.
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl EmbeddingBackend for StubEmbeddingBackend {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(batch = texts.len(), dim = self.dim, "Generating stub embeddings");
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dim)
    }

    fn name(&self) -> &str {
        "stub"
    }
}
