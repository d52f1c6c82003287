use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use crate::clinical::ClinicalKnowledge;
use crate::entity::{EntityMap, EntityType, PatternRecognizer};

fn reranker() -> MultiSignalReranker {
    MultiSignalReranker::with_defaults().unwrap()
}

fn reranker_with(config: RerankerConfig) -> MultiSignalReranker {
    MultiSignalReranker::new(
        config,
        Arc::new(PatternRecognizer::new()),
        Arc::new(ClinicalKnowledge::builtin()),
    )
    .unwrap()
}

fn diabetes_query_entities() -> EntityMap {
    EntityMap::new()
        .with(EntityType::Disease, &["diabetes"])
        .with(EntityType::Treatment, &["metformin"])
}

fn ids(results: &[RankedResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn test_diabetes_treatment_scenario() {
    let candidates = vec![
        Candidate::new("d1", "Metformin and insulin are first-line for diabetes"),
        Candidate::new("d2", "Unrelated cardiology note"),
    ];
    let entities = diabetes_query_entities();

    let results = reranker().rerank("diabetes treatment", &candidates, Some(&entities), None, 10);

    assert_eq!(ids(&results), vec!["d1", "d2"]);
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[1].rank, 2);
    assert!(results[0].combined_score > results[1].combined_score);

    let d1 = &results[0];
    assert!((d1.signal_score(SignalKind::Lexical).unwrap() - 0.4).abs() < 1e-6);
    assert!((d1.signal_score(SignalKind::Entity).unwrap() - 0.5).abs() < 1e-6);
    assert!((d1.signal_score(SignalKind::MedicalContext).unwrap() - 0.65).abs() < 1e-6);
}

#[test]
fn test_signals_are_tagged_and_bounded() {
    let candidates = vec![Candidate::new("a", "Insulin therapy for diabetes").with_score(3.0)];
    let results = reranker().rerank("insulin", &candidates, None, None, 5);

    let kinds: Vec<SignalKind> = results[0].signals.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, SignalKind::ALL.to_vec());
    for s in &results[0].signals {
        assert!((0.0..=1.0).contains(&s.score));
        assert!((0.0..=1.0).contains(&s.confidence));
    }
    // Original score is clamped for the semantic signal but reported as given.
    assert_eq!(results[0].signal_score(SignalKind::Semantic), Some(1.0));
    assert_eq!(results[0].original_score, 3.0);
    assert!((0.0..=1.0).contains(&results[0].combined_score));
}

#[test]
fn test_precomputed_semantic_scores_override_original() {
    let candidates = vec![
        Candidate::new("a", "same text").with_score(0.9),
        Candidate::new("b", "same text").with_score(0.1),
    ];
    let mut semantic = HashMap::new();
    semantic.insert("b".to_string(), 0.95);
    semantic.insert("a".to_string(), 0.2);

    let results = reranker().rerank("query", &candidates, None, Some(&semantic), 10);
    assert_eq!(ids(&results), vec!["b", "a"]);
    assert!((results[0].signal_score(SignalKind::Semantic).unwrap() - 0.95).abs() < 1e-6);
}

#[test]
fn test_raising_semantic_score_never_lowers_rank() {
    let candidates: Vec<Candidate> = (0..6)
        .map(|i| Candidate::new(format!("c{}", i), "Aspirin for headache relief"))
        .collect();
    let base: HashMap<String, f32> = (0..6)
        .map(|i| (format!("c{}", i), 0.1 * i as f32))
        .collect();

    let r = reranker();
    let before = r.rerank("aspirin headache", &candidates, None, Some(&base), 10);
    let rank_before = before.iter().find(|x| x.id == "c2").unwrap().rank;

    for bump in [0.35, 0.45, 0.9] {
        let mut boosted = base.clone();
        boosted.insert("c2".to_string(), bump);
        let after = r.rerank("aspirin headache", &candidates, None, Some(&boosted), 10);
        let rank_after = after.iter().find(|x| x.id == "c2").unwrap().rank;
        assert!(rank_after <= rank_before);
    }
}

#[test]
fn test_contraindication_lowers_medical_context() {
    let risky = EntityMap::new()
        .with(EntityType::Drug, &["metformin"])
        .with(EntityType::Disease, &["chronic kidney disease"]);
    let safe = EntityMap::new().with(EntityType::Drug, &["metformin"]);

    let candidates = vec![
        Candidate::new("risky", "same passage").with_entities(risky),
        Candidate::new("safe", "same passage").with_entities(safe),
    ];
    let results = reranker().rerank("metformin", &candidates, None, None, 10);

    let risky = results.iter().find(|r| r.id == "risky").unwrap();
    let safe = results.iter().find(|r| r.id == "safe").unwrap();
    let risky_ctx = risky.signal(SignalKind::MedicalContext).unwrap();
    let safe_ctx = safe.signal(SignalKind::MedicalContext).unwrap();

    assert!(risky_ctx.score < safe_ctx.score);
    assert!((risky_ctx.score - 0.3).abs() < 1e-6);
    assert!((risky_ctx.confidence - 0.85).abs() < 1e-6);
    assert!((safe_ctx.confidence - 0.70).abs() < 1e-6);
}

#[test]
fn test_query_disease_counts_for_contraindication() {
    let query_entities = EntityMap::new().with(EntityType::Disease, &["peptic ulcer"]);
    let candidates = vec![
        Candidate::new("a", "Ibuprofen relieves pain"),
        Candidate::new("b", "Rest relieves pain"),
    ];
    let results = reranker().rerank("ulcer pain", &candidates, Some(&query_entities), None, 10);

    let a = results.iter().find(|r| r.id == "a").unwrap();
    let b = results.iter().find(|r| r.id == "b").unwrap();
    assert!(
        a.signal_score(SignalKind::MedicalContext).unwrap()
            < b.signal_score(SignalKind::MedicalContext).unwrap()
    );
}

#[test]
fn test_moderate_severity_penalty() {
    let entities = EntityMap::new()
        .with(EntityType::Drug, &["prednisone"])
        .with(EntityType::Disease, &["diabetes"]);
    let candidates = vec![Candidate::new("p", "text").with_entities(entities)];
    let results = reranker().rerank("q", &candidates, None, None, 1);
    let ctx = results[0].signal_score(SignalKind::MedicalContext).unwrap();
    assert!((ctx - 0.4).abs() < 1e-6);
}

#[test]
fn test_neutral_entity_signal_without_query_entities() {
    let candidates = vec![Candidate::new("a", "diabetes")];
    let results = reranker().rerank("diabetes", &candidates, None, None, 1);
    let entity = results[0].signal(SignalKind::Entity).unwrap();
    assert_eq!(entity.score, 0.5);
    assert_eq!(entity.confidence, 0.5);
}

#[test]
fn test_generic_keyword_bonus() {
    let candidates = vec![
        Candidate::new("kw", "symptom diagnosis and treatment"),
        Candidate::new("plain", "diagnosis"),
    ];
    let results = reranker().rerank("symptom treatment", &candidates, None, None, 10);
    let kw = results.iter().find(|r| r.id == "kw").unwrap();
    // Both terms present (0.8) plus two shared keywords (0.1).
    assert!((kw.signal_score(SignalKind::Lexical).unwrap() - 0.9).abs() < 1e-6);
    let plain = results.iter().find(|r| r.id == "plain").unwrap();
    assert_eq!(plain.signal_score(SignalKind::Lexical), Some(0.0));
}

#[test]
fn test_output_is_deterministic() {
    let candidates = vec![
        Candidate::new("a", "Insulin therapy for type 1 diabetes").with_score(0.7),
        Candidate::new("b", "Metformin for type 2 diabetes").with_score(0.7),
        Candidate::new("c", "Ibuprofen and heart failure").with_score(0.4),
    ];
    let entities = diabetes_query_entities();
    let r = reranker();

    let first = r.rerank("diabetes treatment", &candidates, Some(&entities), None, 10);
    let second = r.rerank("diabetes treatment", &candidates, Some(&entities), None, 10);
    assert_eq!(first, second);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let candidates: Vec<Candidate> = (0..40)
        .map(|i| {
            Candidate::new(
                format!("c{}", i),
                if i % 3 == 0 {
                    "metformin for diabetes"
                } else {
                    "unrelated passage about hospital parking"
                },
            )
            .with_score((i % 7) as f32 / 7.0)
        })
        .collect();
    let entities = diabetes_query_entities();

    let sequential = reranker_with(RerankerConfig::default().with_parallel_threshold(usize::MAX));
    let parallel = reranker_with(RerankerConfig::default().with_parallel_threshold(1));

    assert_eq!(
        sequential.rerank("diabetes", &candidates, Some(&entities), None, 15),
        parallel.rerank("diabetes", &candidates, Some(&entities), None, 15)
    );
}

#[test]
fn test_top_k_boundaries() {
    let candidates = vec![Candidate::new("a", "x"), Candidate::new("b", "y")];
    let r = reranker();

    assert!(r.rerank("x", &candidates, None, None, 0).is_empty());

    let all = r.rerank("x", &candidates, None, None, 50);
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().map(|x| x.rank).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn test_candidate_without_id_is_skipped() {
    let candidates = vec![
        Candidate {
            id: None,
            text: Some("orphan".into()),
            ..Default::default()
        },
        Candidate {
            id: Some("  ".into()),
            ..Default::default()
        },
        Candidate::new("ok", "fine"),
    ];
    let results = reranker().rerank("fine", &candidates, None, None, 10);
    assert_eq!(ids(&results), vec!["ok"]);
}

#[test]
fn test_candidate_without_text_is_empty() {
    let candidates = vec![Candidate {
        id: Some("blank".into()),
        original_score: 0.5,
        ..Default::default()
    }];
    let results = reranker().rerank("diabetes", &candidates, None, None, 10);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "");
    assert_eq!(results[0].signal_score(SignalKind::Lexical), Some(0.0));
}

#[test]
fn test_explanation_format() {
    let candidates = vec![Candidate::new("d1", "Metformin for diabetes")];
    let results = reranker().rerank("diabetes treatment", &candidates, None, None, 1);
    let explanation = &results[0].explanation;

    assert!(explanation.starts_with("Query: 'diabetes treatment' | semantic: 0.000 (w=0.35)"));
    assert!(explanation.contains("| lexical: 0.400 (w=0.25)"));
    assert!(explanation.contains("| entity: 0.500 (w=0.20)"));
    assert!(explanation.contains("| medical_context: "));
    assert!(explanation.contains("semantic/lexical divergence: 0.400"));
}

#[test]
fn test_no_divergence_note_when_signals_agree() {
    let candidates = vec![Candidate::new("a", "metformin").with_score(0.8)];
    let results = reranker().rerank("metformin", &candidates, None, None, 1);
    assert!(!results[0].explanation.contains("divergence"));
}

#[test]
fn test_metadata_passes_through() {
    let candidates = vec![Candidate::new("a", "text").with_metadata("title", "Guidelines")];
    let results = reranker().rerank("text", &candidates, None, None, 1);
    assert_eq!(results[0].metadata.get("title").map(String::as_str), Some("Guidelines"));
}

#[test]
fn test_weights_are_normalized() {
    let r = reranker_with(
        RerankerConfig::default().with_weights(RerankerWeights::new(2.0, 1.0, 1.0, 0.0)),
    );
    let w = r.config().weights;
    assert!((w.sum() - 1.0).abs() < 1e-6);
    assert!((w.semantic - 0.5).abs() < 1e-6);
    assert_eq!(w.medical_context, 0.0);
}

#[test]
fn test_invalid_weights_rejected() {
    let build = |weights: RerankerWeights| {
        MultiSignalReranker::new(
            RerankerConfig::default().with_weights(weights),
            Arc::new(PatternRecognizer::new()),
            Arc::new(ClinicalKnowledge::empty()),
        )
    };

    assert!(matches!(
        build(RerankerWeights::new(-0.1, 0.5, 0.3, 0.3)),
        Err(RerankError::Configuration { .. })
    ));
    assert!(matches!(
        build(RerankerWeights::new(0.0, 0.0, 0.0, 0.0)),
        Err(RerankError::Configuration { .. })
    ));
    assert!(matches!(
        build(RerankerWeights::new(f32::NAN, 0.5, 0.3, 0.3)),
        Err(RerankError::Configuration { .. })
    ));
}

#[test]
fn test_invalid_tuning_constant_rejected() {
    let config = RerankerConfig {
        semantic_confidence: 1.5,
        ..Default::default()
    };
    assert!(matches!(
        config.validated(),
        Err(RerankError::Configuration { .. })
    ));

    let config = RerankerConfig {
        high_severity_penalty: -0.2,
        ..Default::default()
    };
    assert!(config.validated().is_err());
}

#[test]
fn test_overridden_penalty_applies() {
    let config = RerankerConfig {
        high_severity_penalty: 0.5,
        ..Default::default()
    };
    let entities = EntityMap::new()
        .with(EntityType::Drug, &["metformin"])
        .with(EntityType::Disease, &["renal failure"]);
    let candidates = vec![Candidate::new("x", "t").with_entities(entities)];
    let results = reranker_with(config).rerank("q", &candidates, None, None, 1);
    assert_eq!(results[0].signal_score(SignalKind::MedicalContext), Some(0.0));
}

#[test]
fn test_combine_is_confidence_weighted_mean() {
    let signals = [
        RankingSignal::new(SignalKind::Semantic, 1.0, 0.5, 1.0),
        RankingSignal::new(SignalKind::Lexical, 0.0, 0.5, 0.5),
    ];
    // (1·0.5·1 + 0) / (0.5 + 0.25)
    assert!((super::signals::combine(&signals) - 2.0 / 3.0).abs() < 1e-6);
    assert_eq!(super::signals::combine(&[]), 0.0);
}
