use std::sync::Arc;

use super::*;
use crate::embedding::{EmbeddingCache, EmbeddingCacheConfig, MockEmbeddingBackend};
use crate::rerank::SignalKind;

fn engine_with_backend(backend: Arc<MockEmbeddingBackend>) -> RetrievalEngine {
    let cache = EmbeddingCache::with_config(backend, EmbeddingCacheConfig::default()).unwrap();
    RetrievalEngine::builder(EmbeddingCacheHandle::new(cache))
        .build()
        .unwrap()
}

fn seeded_engine() -> (RetrievalEngine, Arc<MockEmbeddingBackend>) {
    let backend = Arc::new(MockEmbeddingBackend::new(64));
    let engine = engine_with_backend(Arc::clone(&backend));

    engine
        .ingest(
            Document::new("d1", "")
                .with_title("Diabetes care")
                .with_chunk("Metformin is the first-line treatment for type 2 diabetes.")
                .with_chunk("Insulin is added when glucose control is inadequate."),
        )
        .unwrap();
    engine
        .ingest(Document::new(
            "d2",
            "Femur fractures usually require surgical repair and physical therapy.",
        ))
        .unwrap();
    engine
        .ingest(Document::new(
            "d3",
            "Asthma is managed with inhaled corticosteroids and bronchodilators.",
        ))
        .unwrap();

    (engine, backend)
}

#[test]
fn test_ingest_creates_single_chunk_from_content() {
    let (engine, _) = seeded_engine();

    let doc = engine.document("d2").unwrap();
    assert_eq!(doc.chunks.len(), 1);
    assert_eq!(doc.chunks[0].id, "d2#0");
    assert_eq!(doc.chunks[0].text, doc.content);
}

#[test]
fn test_ingest_rejects_invalid_documents() {
    let (engine, _) = seeded_engine();

    let empty_id = engine.ingest(Document::new("  ", "text"));
    assert!(matches!(empty_id, Err(EngineError::InvalidDocument { .. })));

    let mut foreign = Document::new("d9", "");
    foreign.chunks.push(Chunk::new("x#0", "other", 0, "text"));
    assert!(matches!(
        engine.ingest(foreign),
        Err(EngineError::InvalidDocument { .. })
    ));

    let mut duplicated = Document::new("d9", "");
    duplicated.chunks.push(Chunk::new("dup", "d9", 0, "a"));
    duplicated.chunks.push(Chunk::new("dup", "d9", 1, "b"));
    assert!(matches!(
        engine.ingest(duplicated),
        Err(EngineError::InvalidDocument { .. })
    ));

    let mut stolen = Document::new("d9", "");
    stolen.chunks.push(Chunk::new("d1#0", "d9", 0, "steals a chunk id"));
    let err = engine.ingest(stolen).unwrap_err();
    assert!(err.to_string().contains("already used by 'd1'"));

    assert_eq!(engine.stats().documents, 3);
}

#[test]
fn test_search_ranks_relevant_chunk_first() {
    let (engine, _) = seeded_engine();

    let results = engine
        .search("metformin treatment for diabetes", 3, None)
        .unwrap();

    assert!(!results.is_empty());
    assert!(results.len() <= 3);
    assert_eq!(results[0].id, "d1#0");
    assert_eq!(results[0].metadata.get("document_id").unwrap(), "d1");
    assert_eq!(results[0].metadata.get("title").unwrap(), "Diabetes care");
    for (i, r) in results.iter().enumerate() {
        assert_eq!(r.rank, i + 1);
        assert_eq!(r.signals.len(), SignalKind::ALL.len());
    }
    for pair in results.windows(2) {
        assert!(pair[0].combined_score >= pair[1].combined_score);
    }
}

#[test]
fn test_search_zero_top_k_and_empty_corpus() {
    let (engine, backend) = seeded_engine();
    assert!(engine.search("diabetes", 0, None).unwrap().is_empty());
    assert_eq!(backend.call_count(), 0);

    let empty = engine_with_backend(Arc::new(MockEmbeddingBackend::new(8)));
    assert!(empty.search("diabetes", 5, None).unwrap().is_empty());
}

#[test]
fn test_repeated_search_is_served_from_cache() {
    let (engine, backend) = seeded_engine();

    let first = engine.search("diabetes", 2, None).unwrap();
    let calls = backend.call_count();
    assert!(calls > 0);

    let second = engine.search("diabetes", 2, None).unwrap();
    assert_eq!(backend.call_count(), calls);
    assert_eq!(
        first.iter().map(|r| &r.id).collect::<Vec<_>>(),
        second.iter().map(|r| &r.id).collect::<Vec<_>>()
    );

    for text in [
        "diabetes",
        "Metformin is the first-line treatment for type 2 diabetes.",
    ] {
        assert_eq!(backend.times_embedded(text), 1);
    }
}

#[test]
fn test_embedding_failure_is_returned_and_lexical_only_still_works() {
    let (engine, backend) = seeded_engine();
    backend.set_failing(true);

    let err = engine.search("asthma", 3, None).unwrap_err();
    assert!(err.is_embedding_failure());

    let calls = backend.call_count();
    let results = engine.search_lexical_only("asthma corticosteroids", 3);
    assert_eq!(backend.call_count(), calls);
    assert_eq!(results[0].id, "d3#0");
    assert!((results[0].original_score - 1.0).abs() < 1e-6);
    for r in &results {
        assert!((0.0..=1.0).contains(&r.original_score));
    }
}

#[test]
fn test_lexical_only_without_matches() {
    let (engine, _) = seeded_engine();
    assert!(engine.search_lexical_only("zzzz", 5).is_empty());
    assert!(engine.search_lexical_only("asthma", 0).is_empty());
}

#[test]
fn test_remove_and_reingest_mark_index_stale() {
    let (engine, _) = seeded_engine();
    engine.rebuild_index();
    assert!(!engine.stats().index_stale);

    assert!(engine.remove("d3"));
    assert!(!engine.remove("d3"));
    assert!(engine.stats().index_stale);

    let results = engine.search_lexical_only("asthma", 5);
    assert!(results.iter().all(|r| !r.id.starts_with("d3")));
    assert!(!engine.stats().index_stale);

    engine
        .ingest(Document::new("d2", "Asthma exacerbation treated with albuterol."))
        .unwrap();
    let results = engine.search_lexical_only("asthma", 5);
    assert_eq!(results[0].id, "d2#0");
    assert_eq!(engine.stats().documents, 2);
}

#[test]
fn test_ingest_after_rebuild_is_searchable() {
    let (engine, _) = seeded_engine();
    engine.rebuild_index();

    engine
        .ingest(Document::new("d4", "Migraine prophylaxis with propranolol."))
        .unwrap();
    assert!(engine.stats().index_stale);

    let results = engine.search_lexical_only("migraine", 5);
    assert_eq!(results[0].id, "d4#0");
    assert!(!engine.stats().index_stale);
}

#[test]
fn test_concurrent_ingest_and_rebuild_lose_no_documents() {
    let (engine, _) = seeded_engine();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..40 {
                engine
                    .ingest(Document::new(format!("n{i}"), format!("hypokalemia case {i}")))
                    .unwrap();
            }
        });
        scope.spawn(|| {
            for _ in 0..40 {
                engine.rebuild_index();
            }
        });
    });

    let results = engine.search_lexical_only("hypokalemia", 100);
    assert_eq!(results.len(), 40);
    assert_eq!(engine.stats().documents, 43);
}

#[test]
fn test_alpha_changes_fusion_without_error() {
    let (engine, _) = seeded_engine();

    for alpha in [Some(0.0), Some(1.0), Some(7.0), None] {
        let results = engine.search("insulin glucose", 2, alpha).unwrap();
        assert!(results.len() <= 2);
    }
}

#[test]
fn test_stats_reflect_corpus_and_cache() {
    let (engine, _) = seeded_engine();

    let before = engine.stats();
    assert_eq!(before.documents, 3);
    assert_eq!(before.chunks, 4);
    assert!(before.index_stale);
    assert_eq!(before.cache_entries, 0);

    engine.search("diabetes", 2, None).unwrap();
    let after = engine.stats();
    assert!(after.index_built);
    assert!(!after.index_stale);
    assert_eq!(after.cache_entries, 5);
    assert!(after.cache_bytes > 0);
}

#[test]
fn test_from_config_uses_stub_backend() {
    let config = Config {
        embedding_dim: 32,
        ..Default::default()
    };
    let engine = RetrievalEngine::from_config(&config).unwrap();
    assert_eq!(engine.cache().cache().backend_name(), "stub");

    engine
        .ingest(Document::new("a", "Hypertension treated with lisinopril."))
        .unwrap();
    let results = engine.search("hypertension", 1, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "a#0");
}

#[test]
fn test_from_config_rejects_invalid_config() {
    let config = Config {
        candidate_multiplier: 0,
        ..Default::default()
    };
    assert!(matches!(
        RetrievalEngine::from_config(&config),
        Err(EngineError::Config(_))
    ));
}
