//! Model-backed recognizer over a BIO token classifier.
//!
//! The classifier labels whitespace/punctuation-delimited words. Consecutive
//! `Begin`/`Inside` words of one type are merged into a single mention whose
//! confidence is the mean of its word confidences.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::warn;

use super::EntityRecognizer;
use super::error::EntityError;
use super::pattern::PatternRecognizer;
use super::types::{EntityMention, EntityType, ExtractionResult};

static RE_WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['\-./][\p{L}\p{N}]+)*%?").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioTag {
    Outside,
    Begin(EntityType),
    Inside(EntityType),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenLabel {
    pub tag: BioTag,
    pub confidence: f32,
}

impl TokenLabel {
    pub fn outside() -> Self {
        Self {
            tag: BioTag::Outside,
            confidence: 1.0,
        }
    }

    pub fn begin(entity_type: EntityType, confidence: f32) -> Self {
        Self {
            tag: BioTag::Begin(entity_type),
            confidence,
        }
    }

    pub fn inside(entity_type: EntityType, confidence: f32) -> Self {
        Self {
            tag: BioTag::Inside(entity_type),
            confidence,
        }
    }
}

/// Sequence labeller behind the model recognizer (e.g. a biomedical NER model).
///
/// Must return exactly one label per input word.
pub trait TokenClassifier: Send + Sync {
    fn classify(&self, words: &[&str]) -> Result<Vec<TokenLabel>, EntityError>;

    fn name(&self) -> &str;
}

struct OpenSpan {
    entity_type: EntityType,
    start: usize,
    end: usize,
    confidence_sum: f32,
    words: usize,
}

impl OpenSpan {
    fn into_mention(self, text: &str) -> EntityMention {
        EntityMention {
            entity_type: self.entity_type,
            text: text[self.start..self.end].to_string(),
            start: self.start,
            end: self.end,
            confidence: self.confidence_sum / self.words as f32,
        }
    }
}

/// Recognizer driven by a [`TokenClassifier`].
///
/// Classifier failures are logged and answered by the pattern rules so a
/// broken model never empties the entity signal.
pub struct ModelRecognizer {
    classifier: Arc<dyn TokenClassifier>,
    fallback: PatternRecognizer,
}

impl ModelRecognizer {
    pub fn new(classifier: Arc<dyn TokenClassifier>) -> Self {
        Self {
            classifier,
            fallback: PatternRecognizer::new(),
        }
    }

    fn label(&self, text: &str) -> Result<Vec<EntityMention>, EntityError> {
        let Some(re) = RE_WORD.as_ref() else {
            return Err(EntityError::Classifier {
                classifier: self.classifier.name().to_string(),
                reason: "word segmenter unavailable".to_string(),
            });
        };

        let spans: Vec<(usize, usize)> = re.find_iter(text).map(|m| (m.start(), m.end())).collect();
        if spans.is_empty() {
            return Ok(vec![]);
        }
        let words: Vec<&str> = spans.iter().map(|&(s, e)| &text[s..e]).collect();

        let labels = self.classifier.classify(&words)?;
        if labels.len() != words.len() {
            return Err(EntityError::LabelCountMismatch {
                expected: words.len(),
                actual: labels.len(),
            });
        }

        let mut mentions = Vec::new();
        let mut open: Option<OpenSpan> = None;

        for (&(start, end), label) in spans.iter().zip(labels) {
            match label.tag {
                BioTag::Outside => {
                    if let Some(span) = open.take() {
                        mentions.push(span.into_mention(text));
                    }
                }
                BioTag::Inside(t) if open.as_ref().is_some_and(|s| s.entity_type == t) => {
                    if let Some(span) = open.as_mut() {
                        span.end = end;
                        span.confidence_sum += label.confidence;
                        span.words += 1;
                    }
                }
                // A stray Inside starts a new span, same as Begin.
                BioTag::Begin(t) | BioTag::Inside(t) => {
                    if let Some(span) = open.take() {
                        mentions.push(span.into_mention(text));
                    }
                    open = Some(OpenSpan {
                        entity_type: t,
                        start,
                        end,
                        confidence_sum: label.confidence,
                        words: 1,
                    });
                }
            }
        }
        if let Some(span) = open.take() {
            mentions.push(span.into_mention(text));
        }

        Ok(mentions)
    }
}

impl EntityRecognizer for ModelRecognizer {
    fn extract(
        &self,
        text: &str,
        type_filter: Option<&[EntityType]>,
        min_token_length: usize,
    ) -> ExtractionResult {
        match self.label(text) {
            Ok(mentions) => ExtractionResult::from_mentions(
                mentions
                    .into_iter()
                    .filter(|m| type_filter.is_none_or(|f| f.contains(&m.entity_type)))
                    .filter(|m| m.text.trim().chars().count() >= min_token_length)
                    .collect(),
            ),
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Token classifier failed, using pattern rules"
                );
                self.fallback.extract(text, type_filter, min_token_length)
            }
        }
    }

    fn name(&self) -> &str {
        "model"
    }
}
