use std::io::Write;

use super::*;

#[test]
fn test_builtin_has_diabetes_treatments() {
    let kb = ClinicalKnowledge::builtin();
    let treatments = kb.treatments_for("Diabetes").unwrap();
    assert!(treatments.iter().any(|t| t == "metformin"));
    assert!(treatments.iter().any(|t| t == "insulin"));
    assert!(kb.treatments_for("unknown condition").is_none());
}

#[test]
fn test_contraindication_lookup_is_case_insensitive() {
    let kb = ClinicalKnowledge::builtin();
    assert_eq!(
        kb.contraindication("Metformin", "Chronic Kidney Disease"),
        Some(Severity::High)
    );
    assert_eq!(
        kb.contraindication("prednisone", "diabetes"),
        Some(Severity::Moderate)
    );
    assert_eq!(kb.contraindication("metformin", "diabetes"), None);
}

#[test]
fn test_from_json_normalizes_terms() {
    let kb = ClinicalKnowledge::from_json(
        r#"{
            "treatments": {"  Asthma ": ["Albuterol", "albuterol", ""]},
            "contraindications": [
                {"treatment": "Propranolol", "disease": "ASTHMA", "severity": "HIGH"},
                {"treatment": "propranolol", "disease": "asthma", "severity": "MODERATE"}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(kb.treatments_for("asthma").unwrap(), ["albuterol".to_string()]);
    assert_eq!(kb.contraindications().len(), 1);
    assert_eq!(
        kb.contraindication("propranolol", "asthma"),
        Some(Severity::High)
    );
}

#[test]
fn test_missing_sections_default_to_empty() {
    let kb = ClinicalKnowledge::from_json("{}").unwrap();
    assert!(kb.is_empty());
}

#[test]
fn test_bad_severity_is_parse_error() {
    let err = ClinicalKnowledge::from_json(
        r#"{"contraindications": [{"treatment": "x", "disease": "y", "severity": "LOW"}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, ClinicalKnowledgeError::Parse { .. }));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"treatments": {{"gout": ["colchicine"]}}, "contraindications": []}}"#
    )
    .unwrap();

    let kb = ClinicalKnowledge::load(file.path()).unwrap();
    assert_eq!(kb.disease_count(), 1);
    assert_eq!(kb.treatments_for("gout").unwrap(), ["colchicine".to_string()]);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClinicalKnowledge::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ClinicalKnowledgeError::Invalid { .. }));
}

#[test]
fn test_round_trip_through_file_shape() {
    let kb = ClinicalKnowledge::builtin();
    let json = serde_json::to_string(&kb.to_file()).unwrap();
    assert_eq!(ClinicalKnowledge::from_json(&json).unwrap(), kb);
}
