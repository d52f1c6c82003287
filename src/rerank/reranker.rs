use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::clinical::ClinicalKnowledge;
use crate::entity::{EntityMap, EntityRecognizer, PatternRecognizer};

use super::config::RerankerConfig;
use super::error::RerankError;
use super::signals::{self, QueryContext};
use super::types::{Candidate, RankedResult, RankingSignal, SignalKind};

struct Scored<'c> {
    id: &'c str,
    candidate: &'c Candidate,
    signals: Vec<RankingSignal>,
    combined: f32,
}

/// Four-signal reranker: semantic, lexical, entity overlap, medical context.
pub struct MultiSignalReranker {
    config: RerankerConfig,
    recognizer: Arc<dyn EntityRecognizer>,
    knowledge: Arc<ClinicalKnowledge>,
}

impl std::fmt::Debug for MultiSignalReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSignalReranker")
            .field("weights", &self.config.weights)
            .field("recognizer", &self.recognizer.name())
            .field("diseases", &self.knowledge.disease_count())
            .finish()
    }
}

impl MultiSignalReranker {
    /// Validates `config` and normalizes its weights.
    pub fn new(
        config: RerankerConfig,
        recognizer: Arc<dyn EntityRecognizer>,
        knowledge: Arc<ClinicalKnowledge>,
    ) -> Result<Self, RerankError> {
        let config = config.validated()?;
        debug!(
            semantic = config.weights.semantic,
            lexical = config.weights.lexical,
            entity = config.weights.entity,
            medical_context = config.weights.medical_context,
            recognizer = recognizer.name(),
            "Reranker weights normalized"
        );
        Ok(Self {
            config,
            recognizer,
            knowledge,
        })
    }

    /// Default config, pattern recognizer, built-in clinical tables.
    pub fn with_defaults() -> Result<Self, RerankError> {
        Self::new(
            RerankerConfig::default(),
            Arc::new(PatternRecognizer::new()),
            Arc::new(ClinicalKnowledge::builtin()),
        )
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    pub fn recognizer(&self) -> &Arc<dyn EntityRecognizer> {
        &self.recognizer
    }

    pub fn knowledge(&self) -> &ClinicalKnowledge {
        &self.knowledge
    }

    /// Scores, sorts and explains `candidates`, returning at most `top_k`.
    ///
    /// Candidates without an id are skipped with a warning. Missing text is
    /// treated as empty. Equal combined scores keep input order.
    pub fn rerank(
        &self,
        query: &str,
        candidates: &[Candidate],
        query_entities: Option<&EntityMap>,
        semantic_scores: Option<&HashMap<String, f32>>,
        top_k: usize,
    ) -> Vec<RankedResult> {
        if top_k == 0 || candidates.is_empty() {
            return vec![];
        }

        let valid: Vec<(&str, &Candidate)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(position, c)| match c.id.as_deref() {
                Some(id) if !id.trim().is_empty() => Some((id, c)),
                _ => {
                    warn!(position, "Skipping candidate without id");
                    None
                }
            })
            .collect();

        let ctx = QueryContext::new(query, query_entities, &self.config);
        let parallel = valid.len() >= self.config.parallel_threshold;

        debug!(
            num_candidates = valid.len(),
            skipped = candidates.len() - valid.len(),
            top_k,
            parallel,
            "Reranking candidates"
        );

        let mut scored: Vec<Scored<'_>> = if parallel {
            valid
                .par_iter()
                .map(|&(id, c)| self.score_candidate(&ctx, id, c, semantic_scores))
                .collect()
        } else {
            valid
                .iter()
                .map(|&(id, c)| self.score_candidate(&ctx, id, c, semantic_scores))
                .collect()
        };

        scored.sort_by(|a, b| b.combined.total_cmp(&a.combined));
        scored.truncate(top_k);

        scored
            .into_iter()
            .enumerate()
            .map(|(i, s)| RankedResult {
                id: s.id.to_string(),
                original_score: s.candidate.original_score,
                combined_score: s.combined,
                rank: i + 1,
                explanation: self.explain(query, &s.signals),
                signals: s.signals,
                text: s.candidate.text.clone().unwrap_or_default(),
                metadata: s.candidate.metadata.clone(),
            })
            .collect()
    }

    fn score_candidate<'c>(
        &self,
        ctx: &QueryContext<'_>,
        id: &'c str,
        candidate: &'c Candidate,
        semantic_scores: Option<&HashMap<String, f32>>,
    ) -> Scored<'c> {
        let text = candidate.text.as_deref().unwrap_or_default();
        let text_lower = text.to_lowercase();

        let extracted;
        let candidate_entities = match candidate.entities.as_ref() {
            Some(entities) => entities,
            None => {
                extracted = self
                    .recognizer
                    .extract(text, None, self.config.min_token_length)
                    .entity_map();
                &extracted
            }
        };

        let semantic_score = semantic_scores
            .and_then(|m| m.get(id).copied())
            .unwrap_or(candidate.original_score);

        let signals = vec![
            signals::semantic(semantic_score, &self.config),
            signals::lexical(ctx, &text_lower, &self.config),
            signals::entity(ctx.entities, candidate_entities, &self.config),
            signals::medical_context(ctx.entities, candidate_entities, &self.knowledge, &self.config),
        ];
        let combined = signals::combine(&signals);

        Scored {
            id,
            candidate,
            signals,
            combined,
        }
    }

    fn explain(&self, query: &str, signals: &[RankingSignal]) -> String {
        let mut out = format!("Query: '{}'", query);
        for s in signals {
            let _ = write!(out, " | {}: {:.3} (w={:.2})", s.kind, s.score, s.weight);
        }

        let score_of = |kind: SignalKind| {
            signals
                .iter()
                .find(|s| s.kind == kind)
                .map_or(0.0, |s| s.score)
        };
        let gap = (score_of(SignalKind::Semantic) - score_of(SignalKind::Lexical)).abs();
        if gap > self.config.disparity_threshold {
            let _ = write!(out, " | semantic/lexical divergence: {:.3}", gap);
        }
        out
    }
}
