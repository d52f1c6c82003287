use crate::constants::{
    CONTRAINDICATED_CONFIDENCE, DEFAULT_DISPARITY_THRESHOLD, DEFAULT_ENTITY_WEIGHT,
    DEFAULT_LEXICAL_WEIGHT, DEFAULT_MEDICAL_CONTEXT_WEIGHT, DEFAULT_MIN_TOKEN_LENGTH,
    DEFAULT_PARALLEL_THRESHOLD, DEFAULT_SEMANTIC_WEIGHT, ENTITY_CONFIDENCE,
    GENERIC_MEDICAL_KEYWORDS, HIGH_SEVERITY_PENALTY, LEXICAL_CONFIDENCE, LEXICAL_KEYWORD_BONUS,
    LEXICAL_TERM_SCALE, MEDICAL_CONTEXT_BASE, MEDICAL_CONTEXT_CONFIDENCE,
    MODERATE_SEVERITY_PENALTY, NEUTRAL_ENTITY_CONFIDENCE, NEUTRAL_ENTITY_SCORE,
    SEMANTIC_CONFIDENCE, TREATMENT_ALIGNMENT_BONUS,
};

use super::error::RerankError;
use super::types::SignalKind;

/// Relative signal weights. Normalized to sum to 1 before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankerWeights {
    pub semantic: f32,
    pub lexical: f32,
    pub entity: f32,
    pub medical_context: f32,
}

impl Default for RerankerWeights {
    fn default() -> Self {
        Self {
            semantic: DEFAULT_SEMANTIC_WEIGHT,
            lexical: DEFAULT_LEXICAL_WEIGHT,
            entity: DEFAULT_ENTITY_WEIGHT,
            medical_context: DEFAULT_MEDICAL_CONTEXT_WEIGHT,
        }
    }
}

impl RerankerWeights {
    pub fn new(semantic: f32, lexical: f32, entity: f32, medical_context: f32) -> Self {
        Self {
            semantic,
            lexical,
            entity,
            medical_context,
        }
    }

    pub fn get(&self, kind: SignalKind) -> f32 {
        match kind {
            SignalKind::Semantic => self.semantic,
            SignalKind::Lexical => self.lexical,
            SignalKind::Entity => self.entity,
            SignalKind::MedicalContext => self.medical_context,
        }
    }

    pub fn sum(&self) -> f32 {
        self.semantic + self.lexical + self.entity + self.medical_context
    }

    /// Returns the weights scaled to sum to 1.
    ///
    /// Fails on any negative or non-finite weight, or when all are zero.
    pub fn normalized(&self) -> Result<Self, RerankError> {
        for kind in SignalKind::ALL {
            let w = self.get(kind);
            if !w.is_finite() {
                return Err(RerankError::configuration(format!(
                    "{} weight must be finite, got {}",
                    kind, w
                )));
            }
            if w < 0.0 {
                return Err(RerankError::configuration(format!(
                    "{} weight must be non-negative, got {}",
                    kind, w
                )));
            }
        }

        let total = self.sum();
        if total <= 0.0 {
            return Err(RerankError::configuration("weights cannot all be zero"));
        }

        Ok(Self {
            semantic: self.semantic / total,
            lexical: self.lexical / total,
            entity: self.entity / total,
            medical_context: self.medical_context / total,
        })
    }
}

/// Reranker tuning. Every empirical constant is a field here so deployments can
/// override it; defaults live in [`crate::constants`].
#[derive(Debug, Clone)]
pub struct RerankerConfig {
    pub weights: RerankerWeights,

    pub semantic_confidence: f32,
    pub lexical_confidence: f32,
    pub entity_confidence: f32,

    /// Multiplier on the fraction of query terms found in the text.
    pub lexical_term_scale: f32,
    /// Added per generic keyword shared by query and text.
    pub lexical_keyword_bonus: f32,
    pub generic_keywords: Vec<String>,

    /// Entity score and confidence used when the query has no entities.
    pub neutral_entity_score: f32,
    pub neutral_entity_confidence: f32,

    pub medical_context_base: f32,
    pub treatment_alignment_bonus: f32,
    pub high_severity_penalty: f32,
    pub moderate_severity_penalty: f32,
    pub medical_context_confidence: f32,
    /// Medical-context confidence once a contraindication fires.
    pub contraindicated_confidence: f32,

    /// |semantic - lexical| above this adds a divergence note to the explanation.
    pub disparity_threshold: f32,
    /// Candidate count at which signals are computed in parallel.
    pub parallel_threshold: usize,
    /// Passed to the recognizer when extracting candidate entities.
    pub min_token_length: usize,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            weights: RerankerWeights::default(),
            semantic_confidence: SEMANTIC_CONFIDENCE,
            lexical_confidence: LEXICAL_CONFIDENCE,
            entity_confidence: ENTITY_CONFIDENCE,
            lexical_term_scale: LEXICAL_TERM_SCALE,
            lexical_keyword_bonus: LEXICAL_KEYWORD_BONUS,
            generic_keywords: GENERIC_MEDICAL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            neutral_entity_score: NEUTRAL_ENTITY_SCORE,
            neutral_entity_confidence: NEUTRAL_ENTITY_CONFIDENCE,
            medical_context_base: MEDICAL_CONTEXT_BASE,
            treatment_alignment_bonus: TREATMENT_ALIGNMENT_BONUS,
            high_severity_penalty: HIGH_SEVERITY_PENALTY,
            moderate_severity_penalty: MODERATE_SEVERITY_PENALTY,
            medical_context_confidence: MEDICAL_CONTEXT_CONFIDENCE,
            contraindicated_confidence: CONTRAINDICATED_CONFIDENCE,
            disparity_threshold: DEFAULT_DISPARITY_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
        }
    }
}

impl RerankerConfig {
    pub fn with_weights(mut self, weights: RerankerWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_disparity_threshold(mut self, threshold: f32) -> Self {
        self.disparity_threshold = threshold;
        self
    }

    /// Checks every field and returns a copy with normalized weights.
    pub fn validated(&self) -> Result<Self, RerankError> {
        let weights = self.weights.normalized()?;

        let unit_fields = [
            ("semantic_confidence", self.semantic_confidence),
            ("lexical_confidence", self.lexical_confidence),
            ("entity_confidence", self.entity_confidence),
            ("neutral_entity_score", self.neutral_entity_score),
            ("neutral_entity_confidence", self.neutral_entity_confidence),
            ("medical_context_base", self.medical_context_base),
            ("medical_context_confidence", self.medical_context_confidence),
            ("contraindicated_confidence", self.contraindicated_confidence),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(RerankError::configuration(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        let non_negative_fields = [
            ("lexical_term_scale", self.lexical_term_scale),
            ("lexical_keyword_bonus", self.lexical_keyword_bonus),
            ("treatment_alignment_bonus", self.treatment_alignment_bonus),
            ("high_severity_penalty", self.high_severity_penalty),
            ("moderate_severity_penalty", self.moderate_severity_penalty),
            ("disparity_threshold", self.disparity_threshold),
        ];
        for (name, value) in non_negative_fields {
            if !value.is_finite() || value < 0.0 {
                return Err(RerankError::configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let mut config = self.clone();
        config.weights = weights;
        config.generic_keywords = self
            .generic_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Ok(config)
    }
}
