//! Medical entity recognition.
//!
//! [`EntityRecognizer`] is the single contract; the implementation is picked once
//! at construction through [`RecognizerKind`]:
//! - [`PatternRecognizer`]: regex rules, always available.
//! - [`ModelRecognizer`]: wraps an external [`TokenClassifier`].

mod error;
pub mod model;
pub mod pattern;
pub mod patterns;
pub mod types;


use std::sync::Arc;

pub use error::EntityError;
pub use model::{BioTag, ModelRecognizer, TokenClassifier, TokenLabel};
pub use pattern::PatternRecognizer;
pub use types::{
    EntityMap, EntityMention, EntityType, ExtractionResult, MedicalRelevance, UnknownEntityType,
};

use crate::constants::{DEFAULT_MIN_MEDICAL_ENTITIES, DEFAULT_MIN_TOKEN_LENGTH};

/// Extracts typed medical mentions from free text.
///
/// Implementations are deterministic: the same text yields the same result.
pub trait EntityRecognizer: Send + Sync {
    /// Runs the recognizer over `text`.
    ///
    /// `type_filter` restricts output to the listed types. Mentions whose
    /// trimmed text is shorter than `min_token_length` characters are dropped.
    fn extract(
        &self,
        text: &str,
        type_filter: Option<&[EntityType]>,
        min_token_length: usize,
    ) -> ExtractionResult;

    fn name(&self) -> &str;

    /// All types, default minimum length.
    fn extract_all(&self, text: &str) -> ExtractionResult {
        self.extract(text, None, DEFAULT_MIN_TOKEN_LENGTH)
    }

    fn entity_map(&self, text: &str) -> EntityMap {
        self.extract_all(text).entity_map()
    }

    fn check_medical_relevance(&self, text: &str, min_entities: usize) -> MedicalRelevance {
        MedicalRelevance::from_extraction(&self.extract_all(text), min_entities)
    }

    fn is_medical(&self, text: &str) -> bool {
        self.check_medical_relevance(text, DEFAULT_MIN_MEDICAL_ENTITIES)
            .is_medical
    }
}

/// Recognizer selection, resolved once by [`build_recognizer`].
#[derive(Clone, Default)]
pub enum RecognizerKind {
    #[default]
    Pattern,
    Model(Arc<dyn TokenClassifier>),
}

impl std::fmt::Debug for RecognizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognizerKind::Pattern => f.write_str("Pattern"),
            RecognizerKind::Model(c) => f.debug_tuple("Model").field(&c.name()).finish(),
        }
    }
}

pub fn build_recognizer(kind: RecognizerKind) -> Arc<dyn EntityRecognizer> {
    match kind {
        RecognizerKind::Pattern => Arc::new(PatternRecognizer::new()),
        RecognizerKind::Model(classifier) => Arc::new(ModelRecognizer::new(classifier)),
    }
}
