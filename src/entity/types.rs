use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Medical entity categories. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Disease,
    Drug,
    Symptom,
    Procedure,
    Treatment,
    AnatomicalSite,
    Measurement,
}

impl EntityType {
    pub const ALL: [EntityType; 7] = [
        EntityType::Disease,
        EntityType::Drug,
        EntityType::Symptom,
        EntityType::Procedure,
        EntityType::Treatment,
        EntityType::AnatomicalSite,
        EntityType::Measurement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Disease => "DISEASE",
            EntityType::Drug => "DRUG",
            EntityType::Symptom => "SYMPTOM",
            EntityType::Procedure => "PROCEDURE",
            EntityType::Treatment => "TREATMENT",
            EntityType::AnatomicalSite => "ANATOMICAL_SITE",
            EntityType::Measurement => "MEASUREMENT",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entity type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity type '{0}'")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownEntityType(s.to_string()))
    }
}

/// A recognized span. Offsets are byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    pub entity_type: EntityType,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Output of [`EntityRecognizer::extract`](super::EntityRecognizer::extract).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Mentions sorted by start offset.
    pub entities: Vec<EntityMention>,
    pub types_present: Vec<EntityType>,
    pub counts_per_type: BTreeMap<EntityType, usize>,
    /// Unique `(type, lowercase text)` pairs.
    pub total_unique: usize,
}

impl ExtractionResult {
    /// Sorts `mentions` by position and derives the summary fields.
    pub fn from_mentions(mut mentions: Vec<EntityMention>) -> Self {
        mentions.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(a.end.cmp(&b.end))
                .then(a.entity_type.cmp(&b.entity_type))
        });

        let mut counts_per_type: BTreeMap<EntityType, usize> = BTreeMap::new();
        let mut unique: BTreeSet<(EntityType, String)> = BTreeSet::new();
        for m in &mentions {
            *counts_per_type.entry(m.entity_type).or_default() += 1;
            unique.insert((m.entity_type, m.text.to_lowercase()));
        }

        Self {
            types_present: counts_per_type.keys().copied().collect(),
            counts_per_type,
            total_unique: unique.len(),
            entities: mentions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_map(&self) -> EntityMap {
        let mut map = EntityMap::new();
        for m in &self.entities {
            map.insert(m.entity_type, &m.text);
        }
        map
    }
}

/// Result of a medical-relevance check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedicalRelevance {
    pub is_medical: bool,
    /// Unique entities found.
    pub entity_count: usize,
    /// Distinct entity types found.
    pub entity_diversity: usize,
    pub confidence: f32,
}

impl MedicalRelevance {
    pub fn from_extraction(result: &ExtractionResult, min_entities: usize) -> Self {
        let entity_count = result.total_unique;
        let entity_diversity = result.types_present.len();

        let count_ratio = if min_entities == 0 {
            1.0
        } else {
            (entity_count as f32 / min_entities as f32).min(1.0)
        };
        let diversity_ratio = (entity_diversity as f32 / 3.0).min(1.0);

        Self {
            is_medical: entity_count >= min_entities,
            entity_count,
            entity_diversity,
            confidence: count_ratio * diversity_ratio,
        }
    }
}

/// Lowercased entity terms grouped by type.
///
/// Terms keep first-insertion order and are deduplicated per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityMap(BTreeMap<EntityType, Vec<String>>);

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_type: EntityType, term: impl AsRef<str>) {
        let term = term.as_ref().trim().to_lowercase();
        if term.is_empty() {
            return;
        }
        let terms = self.0.entry(entity_type).or_default();
        if !terms.contains(&term) {
            terms.push(term);
        }
    }

    pub fn with(mut self, entity_type: EntityType, terms: &[&str]) -> Self {
        for term in terms {
            self.insert(entity_type, term);
        }
        self
    }

    /// Terms of one type; empty when absent.
    pub fn terms(&self, entity_type: EntityType) -> &[String] {
        self.0.get(&entity_type).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, entity_type: EntityType, term: &str) -> bool {
        let term = term.to_lowercase();
        self.terms(entity_type).iter().any(|t| *t == term)
    }

    /// Types with at least one term.
    pub fn types(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.0
            .iter()
            .filter(|(_, terms)| !terms.is_empty())
            .map(|(t, _)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityType, &[String])> {
        self.0.iter().map(|(t, terms)| (*t, terms.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Total number of terms across types.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl FromIterator<(EntityType, String)> for EntityMap {
    fn from_iter<I: IntoIterator<Item = (EntityType, String)>>(iter: I) -> Self {
        let mut map = EntityMap::new();
        for (t, term) in iter {
            map.insert(t, term);
        }
        map
    }
}
