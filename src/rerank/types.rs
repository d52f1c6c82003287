use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityMap;

/// Free-form string metadata carried through ranking untouched.
pub type Metadata = BTreeMap<String, String>;

/// A retrieval candidate handed to the reranker.
///
/// `id` and `text` are optional so malformed upstream records can be reported
/// and skipped instead of failing the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub original_score: f32,
    /// Precomputed entities; extracted from `text` when absent.
    #[serde(default)]
    pub entities: Option<EntityMap>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Candidate {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.original_score = score;
        self
    }

    pub fn with_entities(mut self, entities: EntityMap) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Closed set of ranking signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Semantic,
    Lexical,
    Entity,
    MedicalContext,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        SignalKind::Semantic,
        SignalKind::Lexical,
        SignalKind::Entity,
        SignalKind::MedicalContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Semantic => "semantic",
            SignalKind::Lexical => "lexical",
            SignalKind::Entity => "entity",
            SignalKind::MedicalContext => "medical_context",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingSignal {
    pub kind: SignalKind,
    /// In `[0, 1]`.
    pub score: f32,
    pub weight: f32,
    /// In `[0, 1]`.
    pub confidence: f32,
}

impl RankingSignal {
    pub fn new(kind: SignalKind, score: f32, weight: f32, confidence: f32) -> Self {
        Self {
            kind,
            score: clamp_unit(score),
            weight,
            confidence: clamp_unit(confidence),
        }
    }
}

/// Clamps to `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: String,
    pub original_score: f32,
    pub combined_score: f32,
    /// 1-based.
    pub rank: usize,
    pub signals: Vec<RankingSignal>,
    pub explanation: String,
    pub text: String,
    pub metadata: Metadata,
}

impl RankedResult {
    pub fn signal(&self, kind: SignalKind) -> Option<&RankingSignal> {
        self.signals.iter().find(|s| s.kind == kind)
    }

    pub fn signal_score(&self, kind: SignalKind) -> Option<f32> {
        self.signal(kind).map(|s| s.score)
    }
}

impl fmt::Display for RankedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({:.4})", self.rank, self.id, self.combined_score)
    }
}
