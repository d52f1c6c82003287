use std::collections::BTreeMap;

use tracing::{trace, warn};

use super::EntityRecognizer;
use super::patterns::{EntityPattern, all_patterns};
use super::types::{EntityMention, EntityType, ExtractionResult};

/// Rule-based recognizer. Always available, no model files.
pub struct PatternRecognizer {
    patterns: Vec<EntityPattern>,
}

impl Default for PatternRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternRecognizer {
    pub fn new() -> Self {
        Self {
            patterns: all_patterns(),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.patterns.len()
    }

    fn collect(
        &self,
        text: &str,
        pattern: &EntityPattern,
        min_token_length: usize,
        out: &mut Vec<EntityMention>,
    ) {
        let Some(re) = pattern.regex.as_ref() else {
            warn!(rule = pattern.name, "Entity rule failed to compile, skipping");
            return;
        };

        for m in re.find_iter(text) {
            let matched = m.as_str().trim();
            if matched.chars().count() < min_token_length {
                continue;
            }
            if !pattern.exclude.is_empty() && pattern.exclude.contains(&matched.to_lowercase().as_str())
            {
                continue;
            }
            out.push(EntityMention {
                entity_type: pattern.entity_type,
                text: matched.to_string(),
                start: m.start(),
                end: m.end(),
                confidence: pattern.confidence,
            });
        }
    }
}

/// Keeps one mention per exact span: the highest confidence, first rule on ties.
fn dedup_same_span(mentions: Vec<EntityMention>) -> Vec<EntityMention> {
    let mut by_span: BTreeMap<(usize, usize), EntityMention> = BTreeMap::new();
    for mention in mentions {
        let span = (mention.start, mention.end);
        match by_span.get(&span) {
            Some(existing) if existing.confidence >= mention.confidence => {}
            _ => {
                by_span.insert(span, mention);
            }
        }
    }
    by_span.into_values().collect()
}

impl EntityRecognizer for PatternRecognizer {
    fn extract(
        &self,
        text: &str,
        type_filter: Option<&[EntityType]>,
        min_token_length: usize,
    ) -> ExtractionResult {
        let mut raw = Vec::new();
        for pattern in &self.patterns {
            if let Some(filter) = type_filter
                && !filter.contains(&pattern.entity_type)
            {
                continue;
            }
            self.collect(text, pattern, min_token_length, &mut raw);
        }

        let raw_count = raw.len();
        let result = ExtractionResult::from_mentions(dedup_same_span(raw));
        trace!(
            raw = raw_count,
            kept = result.entities.len(),
            unique = result.total_unique,
            "Pattern extraction"
        );
        result
    }

    fn name(&self) -> &str {
        "pattern"
    }
}
