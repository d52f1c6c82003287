//! Static clinical knowledge: recommended treatments per disease and known
//! treatment/disease contraindications.
//!
//! Loaded once as configuration data. All terms are stored lowercase.

mod error;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::ClinicalKnowledgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contraindication {
    pub treatment: String,
    pub disease: String,
    pub severity: Severity,
}

/// On-disk shape of the tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalKnowledgeFile {
    #[serde(default)]
    pub treatments: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub contraindications: Vec<Contraindication>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClinicalKnowledge {
    treatments: BTreeMap<String, Vec<String>>,
    contraindications: Vec<Contraindication>,
}

impl ClinicalKnowledge {
    /// Empty tables: no alignment bonus, no penalties.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Small built-in table covering common chronic conditions.
    pub fn builtin() -> Self {
        let treatments = [
            ("diabetes", &["metformin", "insulin", "sulfonylureas", "glp-1 agonists", "sglt2 inhibitors", "diet", "exercise"][..]),
            ("hypertension", &["ace inhibitors", "lisinopril", "amlodipine", "losartan", "diuretics", "beta blockers"][..]),
            ("asthma", &["albuterol", "inhaled corticosteroids", "salbutamol", "montelukast"][..]),
            ("heart failure", &["furosemide", "ace inhibitors", "beta blockers", "spironolactone"][..]),
            ("hyperlipidemia", &["statins", "atorvastatin", "rosuvastatin", "ezetimibe"][..]),
            ("depression", &["ssris", "sertraline", "fluoxetine", "psychotherapy"][..]),
            ("pneumonia", &["antibiotics", "amoxicillin", "azithromycin"][..]),
            ("atrial fibrillation", &["anticoagulation", "warfarin", "apixaban", "beta blockers"][..]),
            ("hypothyroidism", &["levothyroxine"][..]),
            ("gout", &["allopurinol", "colchicine", "nsaids"][..]),
        ];
        let contraindications = [
            ("metformin", "chronic kidney disease", Severity::High),
            ("metformin", "renal failure", Severity::High),
            ("nsaids", "chronic kidney disease", Severity::High),
            ("ibuprofen", "peptic ulcer", Severity::High),
            ("aspirin", "peptic ulcer", Severity::High),
            ("beta blockers", "asthma", Severity::High),
            ("propranolol", "asthma", Severity::High),
            ("warfarin", "peptic ulcer", Severity::Moderate),
            ("nsaids", "hypertension", Severity::Moderate),
            ("ibuprofen", "heart failure", Severity::Moderate),
            ("corticosteroids", "diabetes", Severity::Moderate),
            ("prednisone", "diabetes", Severity::Moderate),
        ];

        Self::from_file(ClinicalKnowledgeFile {
            treatments: treatments
                .iter()
                .map(|(d, ts)| (d.to_string(), ts.iter().map(|t| t.to_string()).collect()))
                .collect(),
            contraindications: contraindications
                .iter()
                .map(|(t, d, s)| Contraindication {
                    treatment: t.to_string(),
                    disease: d.to_string(),
                    severity: *s,
                })
                .collect(),
        })
    }

    /// Normalizes terms to trimmed lowercase and drops empty entries.
    pub fn from_file(file: ClinicalKnowledgeFile) -> Self {
        let norm = |s: &str| s.trim().to_lowercase();

        let mut treatments: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (disease, list) in file.treatments {
            let disease = norm(&disease);
            if disease.is_empty() {
                continue;
            }
            let entry = treatments.entry(disease).or_default();
            for t in list {
                let t = norm(&t);
                if !t.is_empty() && !entry.contains(&t) {
                    entry.push(t);
                }
            }
        }

        let mut contraindications: Vec<Contraindication> = Vec::new();
        for c in file.contraindications {
            let c = Contraindication {
                treatment: norm(&c.treatment),
                disease: norm(&c.disease),
                severity: c.severity,
            };
            if c.treatment.is_empty() || c.disease.is_empty() {
                continue;
            }
            if !contraindications
                .iter()
                .any(|e| e.treatment == c.treatment && e.disease == c.disease)
            {
                contraindications.push(c);
            }
        }

        Self {
            treatments,
            contraindications,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ClinicalKnowledgeError> {
        let file: ClinicalKnowledgeFile =
            serde_json::from_str(json).map_err(|source| ClinicalKnowledgeError::Parse { source })?;
        Ok(Self::from_file(file))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClinicalKnowledgeError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ClinicalKnowledgeError::Invalid {
                reason: format!("{} is not a file", path.display()),
            });
        }
        let raw = fs::read_to_string(path).map_err(|source| ClinicalKnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let knowledge = Self::from_json(&raw)?;

        info!(
            path = %path.display(),
            diseases = knowledge.treatments.len(),
            contraindications = knowledge.contraindications.len(),
            "Loaded clinical knowledge"
        );
        Ok(knowledge)
    }

    pub fn to_file(&self) -> ClinicalKnowledgeFile {
        ClinicalKnowledgeFile {
            treatments: self.treatments.clone(),
            contraindications: self.contraindications.clone(),
        }
    }

    /// Recommended treatments for `disease` (case-insensitive).
    pub fn treatments_for(&self, disease: &str) -> Option<&[String]> {
        self.treatments
            .get(&disease.trim().to_lowercase())
            .map(Vec::as_slice)
    }

    /// Severity of the `(treatment, disease)` pair, if contraindicated.
    pub fn contraindication(&self, treatment: &str, disease: &str) -> Option<Severity> {
        let treatment = treatment.trim().to_lowercase();
        let disease = disease.trim().to_lowercase();
        self.contraindications
            .iter()
            .find(|c| c.treatment == treatment && c.disease == disease)
            .map(|c| c.severity)
    }

    pub fn contraindications(&self) -> &[Contraindication] {
        &self.contraindications
    }

    pub fn disease_count(&self) -> usize {
        self.treatments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treatments.is_empty() && self.contraindications.is_empty()
    }
}
