//! Per-candidate signal functions. Pure; no shared mutable state.

use std::collections::BTreeSet;

use crate::clinical::{ClinicalKnowledge, Severity};
use crate::entity::{EntityMap, EntityType};

use super::config::RerankerConfig;
use super::types::{RankingSignal, SignalKind};

/// Query-derived values reused across every candidate.
pub(crate) struct QueryContext<'a> {
    pub terms: Vec<String>,
    /// Generic keywords present in the query.
    pub keywords: Vec<&'a str>,
    pub entities: Option<&'a EntityMap>,
}

impl<'a> QueryContext<'a> {
    pub fn new(query: &str, entities: Option<&'a EntityMap>, config: &'a RerankerConfig) -> Self {
        let lower = query.to_lowercase();
        Self {
            terms: lower.split_whitespace().map(str::to_string).collect(),
            keywords: config
                .generic_keywords
                .iter()
                .map(String::as_str)
                .filter(|k| lower.contains(k))
                .collect(),
            entities,
        }
    }
}

fn terms_match(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}

pub(crate) fn semantic(score: f32, config: &RerankerConfig) -> RankingSignal {
    RankingSignal::new(
        SignalKind::Semantic,
        score,
        config.weights.semantic,
        config.semantic_confidence,
    )
}

/// `text_lower` must already be lowercased.
pub(crate) fn lexical(query: &QueryContext<'_>, text_lower: &str, config: &RerankerConfig) -> RankingSignal {
    let mut score = 0.0;

    if !query.terms.is_empty() && !text_lower.is_empty() {
        let present = query
            .terms
            .iter()
            .filter(|t| text_lower.contains(t.as_str()))
            .count();
        score = present as f32 / query.terms.len() as f32 * config.lexical_term_scale;

        let shared = query
            .keywords
            .iter()
            .filter(|k| text_lower.contains(**k))
            .count();
        score += shared as f32 * config.lexical_keyword_bonus;
    }

    RankingSignal::new(
        SignalKind::Lexical,
        score,
        config.weights.lexical,
        config.lexical_confidence,
    )
}

/// Mean per-type overlap of query terms found among candidate terms.
pub(crate) fn entity(
    query: Option<&EntityMap>,
    candidate: &EntityMap,
    config: &RerankerConfig,
) -> RankingSignal {
    let weight = config.weights.entity;

    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return RankingSignal::new(
            SignalKind::Entity,
            config.neutral_entity_score,
            weight,
            config.neutral_entity_confidence,
        );
    };

    let mut total = 0.0;
    let mut types = 0usize;
    for (entity_type, terms) in query.iter() {
        let query_terms: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
        if query_terms.is_empty() {
            continue;
        }
        let candidate_terms: BTreeSet<&str> =
            candidate.terms(entity_type).iter().map(String::as_str).collect();
        let overlap = query_terms.intersection(&candidate_terms).count();
        total += overlap as f32 / query_terms.len() as f32;
        types += 1;
    }

    let score = if types == 0 { 0.0 } else { total / types as f32 };
    RankingSignal::new(SignalKind::Entity, score, weight, config.entity_confidence)
}

/// Treatment alignment bonus and contraindication penalties.
pub(crate) fn medical_context(
    query: Option<&EntityMap>,
    candidate: &EntityMap,
    knowledge: &ClinicalKnowledge,
    config: &RerankerConfig,
) -> RankingSignal {
    let empty = EntityMap::new();
    let query = query.unwrap_or(&empty);

    let mut score = config.medical_context_base;
    let mut confidence = config.medical_context_confidence;

    let query_treatments: Vec<&str> = query
        .terms(EntityType::Treatment)
        .iter()
        .chain(query.terms(EntityType::Drug))
        .map(String::as_str)
        .collect();

    for disease in query.terms(EntityType::Disease) {
        let Some(recommended) = knowledge.treatments_for(disease) else {
            continue;
        };
        let aligned = query_treatments
            .iter()
            .any(|q| recommended.iter().any(|r| terms_match(q, r)));
        if aligned {
            score += config.treatment_alignment_bonus;
        }
    }

    let candidate_treatments: Vec<&str> = candidate
        .terms(EntityType::Treatment)
        .iter()
        .chain(candidate.terms(EntityType::Drug))
        .map(String::as_str)
        .collect();
    let diseases: Vec<&str> = query
        .terms(EntityType::Disease)
        .iter()
        .chain(candidate.terms(EntityType::Disease))
        .map(String::as_str)
        .collect();

    for contraindication in knowledge.contraindications() {
        let has_treatment = candidate_treatments
            .iter()
            .any(|t| terms_match(t, &contraindication.treatment));
        let has_disease = diseases
            .iter()
            .any(|d| terms_match(d, &contraindication.disease));
        if has_treatment && has_disease {
            score -= match contraindication.severity {
                Severity::High => config.high_severity_penalty,
                Severity::Moderate => config.moderate_severity_penalty,
            };
            confidence = config.contraindicated_confidence;
        }
    }

    RankingSignal::new(
        SignalKind::MedicalContext,
        score,
        config.weights.medical_context,
        confidence,
    )
}

/// `Σ s·w·c / Σ w·c`, clamped to `[0, 1]`.
pub(crate) fn combine(signals: &[RankingSignal]) -> f32 {
    let (num, den) = signals.iter().fold((0.0f32, 0.0f32), |(n, d), s| {
        (n + s.score * s.weight * s.confidence, d + s.weight * s.confidence)
    });
    if den <= 0.0 {
        0.0
    } else {
        (num / den).clamp(0.0, 1.0)
    }
}
