//! Text embeddings behind a content-addressed cache.
//!
//! - [`EmbeddingBackend`] is the external text → vector function.
//! - [`EmbeddingCache`] deduplicates by content hash and batches misses.
//! - [`similarity`] provides cosine scoring over cached vectors.

/// Backend trait and deterministic stub backend.
pub mod backend;
/// Content-addressed embedding cache.
pub mod cache;
mod error;
/// OpenAI-compatible HTTP backend.
pub mod http;
#[cfg(any(test, feature = "mock"))]
/// Instrumented backend for tests.
pub mod mock;
pub mod similarity;


pub use backend::{EmbeddingBackend, StubEmbeddingBackend};
pub use cache::{CacheStats, Embedding, EmbeddingCache, EmbeddingCacheConfig, EmbeddingCacheHandle};
pub use error::EmbeddingError;
pub use http::{HttpBackendConfig, HttpEmbeddingBackend};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingBackend;
pub use similarity::{cosine_similarity, normalize};
