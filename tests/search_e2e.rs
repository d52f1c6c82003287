//! End-to-end search through the engine with an instrumented embedding backend.

mod common;

use std::sync::Arc;

use medrank::{EngineError, SignalKind};

use common::{medical_corpus, mock_backend, seeded_engine};

#[test]
fn test_hybrid_search_returns_ranked_medical_results() {
    let engine = seeded_engine(mock_backend());

    let results = engine
        .search("metformin treatment for type 2 diabetes", 3, None)
        .expect("search should succeed");

    assert_eq!(results[0].id, "diabetes#0");
    assert!(results.len() <= 3);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.rank, i + 1);
        assert!((0.0..=1.0).contains(&result.combined_score));
        assert!(result.explanation.starts_with("Query: 'metformin treatment"));
        let kinds: Vec<SignalKind> = result.signals.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SignalKind::ALL.to_vec());
    }
}

#[test]
fn test_contraindicated_chunk_is_penalised_in_medical_context() {
    let engine = seeded_engine(mock_backend());

    let results = engine
        .search("metformin for chronic kidney disease", 5, None)
        .expect("search should succeed");

    let ckd = results
        .iter()
        .find(|r| r.id == "ckd#0")
        .expect("ckd chunk should be retrieved");
    let medical = ckd
        .signal(SignalKind::MedicalContext)
        .expect("medical context signal");
    assert!(medical.score < 0.5);
}

#[test]
fn test_texts_are_embedded_once_across_searches() {
    let backend = mock_backend();
    let engine = seeded_engine(Arc::clone(&backend));

    engine.search("asthma", 2, None).expect("first search");
    engine.search("hypertension", 2, None).expect("second search");
    engine.search("asthma", 2, None).expect("repeat search");

    for doc in medical_corpus() {
        for chunk in engine.document(&doc.id).expect("document").chunks {
            assert_eq!(backend.times_embedded(&chunk.text), 1, "{}", chunk.id);
        }
    }
    assert_eq!(backend.times_embedded("asthma"), 1);

    let stats = engine.stats();
    assert_eq!(stats.chunks, 6);
    assert_eq!(stats.cache_entries, 8);
    assert!(stats.cache_hits > 0);
}

#[test]
fn test_backend_outage_surfaces_error_then_recovers() {
    let backend = mock_backend();
    let engine = seeded_engine(Arc::clone(&backend));

    backend.set_failing(true);
    let err = engine.search("wheezing", 2, None).unwrap_err();
    assert!(matches!(err, EngineError::Embedding(_)));
    assert!(err.is_embedding_failure());
    assert_eq!(engine.stats().cache_entries, 0);

    let fallback = engine.search_lexical_only("wheezing", 2);
    assert_eq!(fallback[0].id, "asthma#0");

    backend.set_failing(false);
    let results = engine.search("wheezing", 2, None).expect("recovered");
    assert_eq!(results[0].id, "asthma#0");
}

#[test]
fn test_document_replacement_changes_results() {
    let engine = seeded_engine(mock_backend());

    let before = engine.search_lexical_only("migraine", 3);
    assert!(before.is_empty());

    engine
        .ingest(medrank::Document::new(
            "fracture",
            "Migraine headaches respond to triptans.",
        ))
        .expect("replace");

    let after = engine.search("migraine triptans", 3, None).expect("search");
    assert_eq!(after[0].id, "fracture#0");
    assert_eq!(after[0].text, "Migraine headaches respond to triptans.");
}

#[test]
fn test_concurrent_searches_share_one_engine() {
    let engine = Arc::new(seeded_engine(mock_backend()));

    let handles: Vec<_> = ["asthma", "diabetes", "hypertension", "fracture"]
        .into_iter()
        .map(|query| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.search(query, 2, None).map(|r| r.len()))
        })
        .collect();

    for handle in handles {
        let found = handle.join().expect("thread").expect("search");
        assert!(found >= 1);
    }
}
