//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use medrank::embedding::{EmbeddingCache, EmbeddingCacheConfig, EmbeddingCacheHandle};
use medrank::{Document, MockEmbeddingBackend, RetrievalEngine};

pub const TEST_DIM: usize = 64;

pub fn mock_backend() -> Arc<MockEmbeddingBackend> {
    Arc::new(MockEmbeddingBackend::new(TEST_DIM))
}

pub fn cache_handle(backend: Arc<MockEmbeddingBackend>) -> EmbeddingCacheHandle {
    let config = EmbeddingCacheConfig::default()
        .with_max_batch_size(4)
        .with_expected_dim(TEST_DIM);
    EmbeddingCacheHandle::new(EmbeddingCache::with_config(backend, config).expect("cache"))
}

pub fn medical_corpus() -> Vec<Document> {
    vec![
        Document::new("diabetes", "")
            .with_title("Type 2 diabetes")
            .with_chunk("Metformin is the first-line treatment for type 2 diabetes.")
            .with_chunk("Insulin therapy is started when HbA1c remains above 7%."),
        Document::new(
            "ckd",
            "Metformin is contraindicated in chronic kidney disease with low eGFR.",
        )
        .with_title("Prescribing in CKD"),
        Document::new(
            "asthma",
            "Asthma causes wheezing and shortness of breath; inhaled corticosteroids help.",
        ),
        Document::new(
            "fracture",
            "A femur fracture is repaired surgically, followed by physical therapy.",
        ),
        Document::new(
            "hypertension",
            "Lisinopril lowers blood pressure in patients with hypertension.",
        ),
    ]
}

pub fn seeded_engine(backend: Arc<MockEmbeddingBackend>) -> RetrievalEngine {
    let engine = RetrievalEngine::builder(cache_handle(backend))
        .build()
        .expect("engine");
    for doc in medical_corpus() {
        engine.ingest(doc).expect("ingest");
    }
    engine
}
