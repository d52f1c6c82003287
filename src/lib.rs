//! Medrank library crate (used by the demo binary, benches and integration tests).
//!
//! Retrieval and ranking for medical text: a content-addressed embedding cache,
//! BM25 lexical scoring, pattern-based medical entity recognition, reciprocal rank
//! fusion and a multi-signal reranker with clinical contraindication checks.
//!
//! # Public API Surface
//!
//! ## Engine
//! - [`RetrievalEngine`], [`Document`], [`Chunk`] - Corpus and hybrid search
//! - [`Config`], [`ConfigError`] - `MEDRANK_*` environment configuration
//! - [`EngineError`] - Top-level error
//!
//! ## Components
//! - [`EmbeddingCache`], [`EmbeddingCacheHandle`], [`EmbeddingBackend`] - Embeddings
//! - [`LexicalScorer`] - BM25
//! - [`EntityRecognizer`], [`PatternRecognizer`], [`ModelRecognizer`] - Entities
//! - [`RrfFusion`] - Rank fusion
//! - [`MultiSignalReranker`], [`ClinicalKnowledge`] - Reranking
//!
//! ## Test/Mock Support
//! [`MockEmbeddingBackend`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod clinical;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod engine;
pub mod entity;
pub mod error;
pub mod fusion;
pub mod hashing;
pub mod lexical;
pub mod rerank;

pub use clinical::{ClinicalKnowledge, ClinicalKnowledgeError, Contraindication, Severity};
pub use config::{Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingBackend;
pub use embedding::{
    EmbeddingBackend, EmbeddingCache, EmbeddingCacheConfig, EmbeddingCacheHandle, EmbeddingError,
    HttpBackendConfig, HttpEmbeddingBackend, StubEmbeddingBackend,
};
pub use engine::{Chunk, Document, DocumentMetadata, EngineStats, RetrievalEngine};
pub use entity::{
    EntityMap, EntityMention, EntityRecognizer, EntityType, ExtractionResult, MedicalRelevance,
    ModelRecognizer, PatternRecognizer, RecognizerKind, TokenClassifier,
};
pub use error::EngineError;
pub use fusion::{FusedCandidate, FusionConfig, RrfFusion, ScoredId};
pub use hashing::{ContentHash, hash_content};
pub use lexical::{LexicalHit, LexicalScorer};
pub use rerank::{
    Candidate, MultiSignalReranker, RankedResult, RankingSignal, RerankError, RerankerConfig,
    RerankerWeights, SignalKind,
};
