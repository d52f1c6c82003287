//! Cross-cutting, shared constants.
//!
//! Every tuning value used by fusion and reranking lives here as a named default.
//! None of them are validated clinical weights: they are empirical starting points,
//! and each one can be overridden through [`crate::rerank::RerankerConfig`] or
//! [`crate::fusion::FusionConfig`].

/// Default embedding dimension (MiniLM-class sentence encoders).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Default max number of texts sent to the embedding backend per call.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Default max entries kept in the embedding cache.
pub const DEFAULT_CACHE_CAPACITY: u64 = 100_000;

/// Added to vector norms before dividing, so zero vectors do not produce NaN.
pub const NORM_EPSILON: f32 = 1e-10;

/// Reciprocal rank fusion damping constant.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Default semantic share in fusion (`1 - alpha` goes to the lexical list).
pub const DEFAULT_FUSION_ALPHA: f32 = 0.5;

/// How many fused candidates are handed to the reranker per requested result.
pub const DEFAULT_CANDIDATE_MULTIPLIER: usize = 3;

pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.35;
pub const DEFAULT_LEXICAL_WEIGHT: f32 = 0.25;
pub const DEFAULT_ENTITY_WEIGHT: f32 = 0.20;
pub const DEFAULT_MEDICAL_CONTEXT_WEIGHT: f32 = 0.20;

pub const SEMANTIC_CONFIDENCE: f32 = 0.95;
pub const LEXICAL_CONFIDENCE: f32 = 0.85;
pub const ENTITY_CONFIDENCE: f32 = 0.90;
pub const NEUTRAL_ENTITY_SCORE: f32 = 0.5;
pub const NEUTRAL_ENTITY_CONFIDENCE: f32 = 0.5;

/// Scale applied to the fraction of query terms found in a candidate.
pub const LEXICAL_TERM_SCALE: f32 = 0.8;

/// Bonus per generic medical keyword shared by query and candidate.
pub const LEXICAL_KEYWORD_BONUS: f32 = 0.05;

pub const MEDICAL_CONTEXT_BASE: f32 = 0.5;
pub const TREATMENT_ALIGNMENT_BONUS: f32 = 0.15;
pub const HIGH_SEVERITY_PENALTY: f32 = 0.20;
pub const MODERATE_SEVERITY_PENALTY: f32 = 0.10;
pub const MEDICAL_CONTEXT_CONFIDENCE: f32 = 0.70;
pub const CONTRAINDICATED_CONFIDENCE: f32 = 0.85;

/// Semantic/lexical gap above which the explanation flags diverging signals.
pub const DEFAULT_DISPARITY_THRESHOLD: f32 = 0.10;

/// Candidate count at which signal computation switches to the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Minimum characters for a recognized entity mention.
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 2;

/// Unique entities needed before text counts as medical.
pub const DEFAULT_MIN_MEDICAL_ENTITIES: usize = 3;

/// Generic medical keywords that earn the lexical bonus when shared.
pub const GENERIC_MEDICAL_KEYWORDS: &[&str] = &[
    "disease",
    "treatment",
    "drug",
    "symptom",
    "diagnosis",
    "procedure",
    "therapy",
    "medication",
    "condition",
    "patient",
];
