//! Reciprocal Rank Fusion of the semantic and lexical candidate lists.
//!
//! Score = Σ weight / (k + rank), with `weight = alpha` for the semantic list and
//! `1 - alpha` for the lexical list. Rank-based, so the two lists never need
//! score normalization.


use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_FUSION_ALPHA, DEFAULT_RRF_K};
use crate::lexical::LexicalHit;

/// One entry of an input list. Lists are ordered best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredId {
    pub id: String,
    pub score: f32,
}

impl ScoredId {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

impl From<&LexicalHit> for ScoredId {
    fn from(hit: &LexicalHit) -> Self {
        Self::new(hit.id.clone(), hit.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedCandidate {
    pub id: String,
    /// RRF score, or the semantic score when the lexical list was empty.
    pub fused_score: f32,
    /// 1-based rank in the semantic list.
    pub semantic_rank: Option<usize>,
    /// 1-based rank in the lexical list.
    pub lexical_rank: Option<usize>,
    pub semantic_score: Option<f32>,
    pub lexical_score: Option<f32>,
}

impl FusedCandidate {
    fn best_rank(&self) -> usize {
        match (self.semantic_rank, self.lexical_rank) {
            (Some(s), Some(l)) => s.min(l),
            (Some(r), None) | (None, Some(r)) => r,
            (None, None) => usize::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// Damping constant `k`.
    pub k: f32,
    /// Used when the caller passes no alpha.
    pub default_alpha: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_RRF_K,
            default_alpha: DEFAULT_FUSION_ALPHA,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RrfFusion {
    config: FusionConfig,
}

impl RrfFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Merges `semantic` and `lexical` into one list of at most `top_k` ids.
    ///
    /// Ties on fused score go to the better original rank in either list, then to
    /// first appearance (semantic list first). An empty `lexical` list returns the
    /// semantic list truncated, keeping its original scores.
    pub fn fuse(
        &self,
        semantic: &[ScoredId],
        lexical: &[ScoredId],
        alpha: Option<f32>,
        top_k: usize,
    ) -> Vec<FusedCandidate> {
        if top_k == 0 {
            return vec![];
        }

        if lexical.is_empty() {
            debug!(
                semantic = semantic.len(),
                top_k, "No lexical hits, returning semantic ranking"
            );
            return semantic
                .iter()
                .take(top_k)
                .enumerate()
                .map(|(i, item)| FusedCandidate {
                    id: item.id.clone(),
                    fused_score: item.score,
                    semantic_rank: Some(i + 1),
                    lexical_rank: None,
                    semantic_score: Some(item.score),
                    lexical_score: None,
                })
                .collect();
        }

        let alpha = self.resolve_alpha(alpha);
        let k = self.config.k;

        let mut fused: Vec<FusedCandidate> = Vec::with_capacity(semantic.len() + lexical.len());
        let mut position: HashMap<String, usize> = HashMap::new();

        for (list, weight, is_semantic) in [(semantic, alpha, true), (lexical, 1.0 - alpha, false)] {
            for (i, item) in list.iter().enumerate() {
                let rank = i + 1;
                let idx = *position.entry(item.id.clone()).or_insert_with(|| {
                    fused.push(FusedCandidate {
                        id: item.id.clone(),
                        fused_score: 0.0,
                        semantic_rank: None,
                        lexical_rank: None,
                        semantic_score: None,
                        lexical_score: None,
                    });
                    fused.len() - 1
                });

                let entry = &mut fused[idx];
                let (slot_rank, slot_score) = if is_semantic {
                    (&mut entry.semantic_rank, &mut entry.semantic_score)
                } else {
                    (&mut entry.lexical_rank, &mut entry.lexical_score)
                };
                // A repeated id within one list only counts at its best position.
                if slot_rank.is_some() {
                    continue;
                }
                *slot_rank = Some(rank);
                *slot_score = Some(item.score);
                entry.fused_score += weight / (k + rank as f32);
            }
        }

        // Stable sort: equal keys keep first-seen order.
        fused.sort_by(|a, b| {
            b.fused_score
                .total_cmp(&a.fused_score)
                .then_with(|| a.best_rank().cmp(&b.best_rank()))
        });
        fused.truncate(top_k);

        debug!(
            semantic = semantic.len(),
            lexical = lexical.len(),
            alpha,
            k,
            returned = fused.len(),
            "Fused candidate lists"
        );

        fused
    }

    fn resolve_alpha(&self, alpha: Option<f32>) -> f32 {
        let alpha = alpha.unwrap_or(self.config.default_alpha);
        if !alpha.is_finite() {
            warn!(alpha, "Non-finite alpha, using default");
            return self.config.default_alpha.clamp(0.0, 1.0);
        }
        if !(0.0..=1.0).contains(&alpha) {
            warn!(alpha, "Alpha outside [0, 1], clamping");
        }
        alpha.clamp(0.0, 1.0)
    }
}

/// [`RrfFusion::fuse`] with default settings.
pub fn fuse(
    semantic: &[ScoredId],
    lexical: &[ScoredId],
    alpha: f32,
    top_k: usize,
) -> Vec<FusedCandidate> {
    RrfFusion::default().fuse(semantic, lexical, Some(alpha), top_k)
}
