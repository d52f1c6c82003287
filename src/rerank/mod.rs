//! Multi-signal reranking of fused candidates.
//!
//! Each candidate gets four [`RankingSignal`]s (semantic, lexical, entity,
//! medical context). The combined score is the confidence-weighted mean
//! `Σ s·w·c / Σ w·c`, and every result carries a human-readable explanation.
//!
//! Signal computation is independent per candidate and runs on the rayon pool
//! once the candidate count reaches [`RerankerConfig::parallel_threshold`].
//! Output is identical either way.

pub mod config;
pub mod error;
pub mod reranker;
mod signals;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{RerankerConfig, RerankerWeights};
pub use error::RerankError;
pub use reranker::MultiSignalReranker;
pub use types::{Candidate, Metadata, RankedResult, RankingSignal, SignalKind};
