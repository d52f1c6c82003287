//! Retrieval engine: corpus, lexical index, embedding cache, fusion and reranking
//! behind one synchronous `search` call.
//!
//! # Pipeline
//!
//! 1. Embed the query and every chunk through the shared [`EmbeddingCacheHandle`].
//! 2. Rank chunks by cosine similarity (semantic list).
//! 3. Rank chunks with the BM25 index (lexical list), rebuilding it first if stale.
//! 4. Fuse both lists with RRF into a candidate pool.
//! 5. Rerank the pool with [`MultiSignalReranker`] and return the top `k`.
//!
//! # Locking
//!
//! The corpus and the lexical index each sit behind a `parking_lot::RwLock`.
//! `search` takes read locks; `ingest`/`remove` take the corpus write lock and
//! mark the index stale; rebuilds take the index write lock. Embedding happens
//! with no engine lock held.

mod types;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

pub use types::{Chunk, Document, DocumentMetadata, EngineStats};

use crate::clinical::ClinicalKnowledge;
use crate::config::Config;
use crate::constants::DEFAULT_CANDIDATE_MULTIPLIER;
use crate::embedding::{EmbeddingCache, EmbeddingCacheHandle};
use crate::entity::{EntityRecognizer, RecognizerKind, build_recognizer};
use crate::error::EngineError;
use crate::fusion::{FusionConfig, RrfFusion, ScoredId};
use crate::lexical::LexicalScorer;
use crate::rerank::{Candidate, Metadata, MultiSignalReranker, RankedResult, RerankerConfig};

#[derive(Debug, Default)]
struct Corpus {
    /// Ingestion order; drives chunk order and therefore tie-breaking.
    order: Vec<String>,
    documents: HashMap<String, Document>,
}

impl Corpus {
    fn chunk_count(&self) -> usize {
        self.documents.values().map(|d| d.chunks.len()).sum()
    }

    fn snapshot(&self) -> Vec<ChunkRecord> {
        self.order
            .iter()
            .filter_map(|id| self.documents.get(id))
            .flat_map(|doc| {
                doc.chunks.iter().map(move |chunk| ChunkRecord {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    metadata: doc.result_metadata(chunk),
                })
            })
            .collect()
    }

    fn owner_of_chunk(&self, chunk_id: &str) -> Option<&str> {
        self.documents
            .values()
            .find(|d| d.chunks.iter().any(|c| c.id == chunk_id))
            .map(|d| d.id.as_str())
    }
}

#[derive(Debug, Clone)]
struct ChunkRecord {
    id: String,
    text: String,
    metadata: Metadata,
}

#[derive(Debug, Default)]
struct LexicalIndex {
    scorer: LexicalScorer,
    stale: bool,
}

pub struct RetrievalEngine {
    cache: EmbeddingCacheHandle,
    recognizer: Arc<dyn EntityRecognizer>,
    reranker: MultiSignalReranker,
    fusion: RrfFusion,
    candidate_multiplier: usize,
    corpus: RwLock<Corpus>,
    index: RwLock<LexicalIndex>,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("cache", &self.cache)
            .field("recognizer", &self.recognizer.name())
            .field("reranker", &self.reranker)
            .field("fusion", &self.fusion)
            .field("candidate_multiplier", &self.candidate_multiplier)
            .finish()
    }
}

/// Assembles a [`RetrievalEngine`]. Only the cache is required.
pub struct RetrievalEngineBuilder {
    cache: EmbeddingCacheHandle,
    recognizer: RecognizerKind,
    knowledge: Option<ClinicalKnowledge>,
    reranker_config: RerankerConfig,
    fusion_config: FusionConfig,
    candidate_multiplier: usize,
}

impl RetrievalEngineBuilder {
    pub fn recognizer(mut self, kind: RecognizerKind) -> Self {
        self.recognizer = kind;
        self
    }

    pub fn knowledge(mut self, knowledge: ClinicalKnowledge) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn reranker_config(mut self, config: RerankerConfig) -> Self {
        self.reranker_config = config;
        self
    }

    pub fn fusion_config(mut self, config: FusionConfig) -> Self {
        self.fusion_config = config;
        self
    }

    /// Pool size handed to the reranker is `top_k * multiplier`.
    pub fn candidate_multiplier(mut self, multiplier: usize) -> Self {
        self.candidate_multiplier = multiplier;
        self
    }

    pub fn build(self) -> Result<RetrievalEngine, EngineError> {
        let recognizer = build_recognizer(self.recognizer);
        let knowledge = Arc::new(self.knowledge.unwrap_or_else(ClinicalKnowledge::builtin));
        let reranker =
            MultiSignalReranker::new(self.reranker_config, Arc::clone(&recognizer), knowledge)?;

        Ok(RetrievalEngine {
            cache: self.cache,
            recognizer,
            reranker,
            fusion: RrfFusion::new(self.fusion_config),
            candidate_multiplier: self.candidate_multiplier.max(1),
            corpus: RwLock::new(Corpus::default()),
            index: RwLock::new(LexicalIndex::default()),
        })
    }
}

impl RetrievalEngine {
    pub fn builder(cache: EmbeddingCacheHandle) -> RetrievalEngineBuilder {
        RetrievalEngineBuilder {
            cache,
            recognizer: RecognizerKind::Pattern,
            knowledge: None,
            reranker_config: RerankerConfig::default(),
            fusion_config: FusionConfig::default(),
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
        }
    }

    /// Builds the backend, cache, clinical tables and engine described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;

        let backend = config.embedding_backend()?;
        let cache = EmbeddingCache::with_config(backend, config.cache_config())?;
        let knowledge = match config.clinical_knowledge_path {
            Some(ref path) => ClinicalKnowledge::load(path)?,
            None => ClinicalKnowledge::builtin(),
        };

        Self::builder(EmbeddingCacheHandle::new(cache))
            .knowledge(knowledge)
            .reranker_config(config.reranker_config())
            .fusion_config(config.fusion_config())
            .candidate_multiplier(config.candidate_multiplier)
            .build()
    }

    pub fn cache(&self) -> &EmbeddingCacheHandle {
        &self.cache
    }

    pub fn recognizer(&self) -> &Arc<dyn EntityRecognizer> {
        &self.recognizer
    }

    pub fn reranker(&self) -> &MultiSignalReranker {
        &self.reranker
    }

    /// Adds or replaces a document and marks the lexical index stale.
    ///
    /// A document without chunks gets a single chunk holding its full content.
    pub fn ingest(&self, mut document: Document) -> Result<(), EngineError> {
        let invalid = |document_id: &str, reason: String| EngineError::InvalidDocument {
            document_id: document_id.to_string(),
            reason,
        };

        if document.id.trim().is_empty() {
            return Err(invalid(&document.id, "document id cannot be empty".to_string()));
        }
        if document.chunks.is_empty() && !document.content.trim().is_empty() {
            let content = document.content.clone();
            document = document.with_chunk(content);
        }

        let mut seen = HashSet::new();
        for chunk in &document.chunks {
            if chunk.id.trim().is_empty() {
                return Err(invalid(&document.id, "chunk id cannot be empty".to_string()));
            }
            if chunk.document_id != document.id {
                return Err(invalid(
                    &document.id,
                    format!("chunk '{}' belongs to '{}'", chunk.id, chunk.document_id),
                ));
            }
            if !seen.insert(chunk.id.as_str()) {
                return Err(invalid(&document.id, format!("duplicate chunk id '{}'", chunk.id)));
            }
        }

        {
            let mut corpus = self.corpus.write();
            for chunk in &document.chunks {
                if let Some(owner) = corpus.owner_of_chunk(&chunk.id)
                    && owner != document.id
                {
                    return Err(invalid(
                        &document.id,
                        format!("chunk id '{}' already used by '{}'", chunk.id, owner),
                    ));
                }
            }

            let replaced = corpus.documents.contains_key(&document.id);
            if !replaced {
                corpus.order.push(document.id.clone());
            }
            debug!(
                document_id = %document.id,
                chunks = document.chunks.len(),
                replaced,
                "Ingested document"
            );
            corpus.documents.insert(document.id.clone(), document);
        }

        self.index.write().stale = true;
        Ok(())
    }

    /// Drops a document. Returns `false` if it was not present.
    pub fn remove(&self, document_id: &str) -> bool {
        let removed = {
            let mut corpus = self.corpus.write();
            let removed = corpus.documents.remove(document_id).is_some();
            if removed {
                corpus.order.retain(|id| id != document_id);
            }
            removed
        };
        if removed {
            self.index.write().stale = true;
            debug!(document_id, "Removed document");
        }
        removed
    }

    /// Rebuilds the lexical index over the current corpus snapshot.
    ///
    /// The index lock is held while the snapshot is taken, so a concurrent
    /// ingest either lands in the snapshot or marks the index stale afterwards.
    /// Lock order is index then corpus; no other path nests them.
    pub fn rebuild_index(&self) {
        let mut index = self.index.write();
        let chunks = self.corpus.read().snapshot();
        index
            .scorer
            .build(chunks.iter().map(|c| (c.id.as_str(), c.text.as_str())));
        index.stale = false;
        info!(chunks = chunks.len(), "Rebuilt lexical index");
    }

    fn ensure_index(&self) {
        let needs_rebuild = {
            let index = self.index.read();
            index.stale || !index.scorer.is_built()
        };
        if needs_rebuild {
            self.rebuild_index();
        }
    }

    fn pool_size(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.candidate_multiplier)
    }

    /// Hybrid search: semantic + lexical, fused, then reranked.
    ///
    /// `alpha` weights the semantic list in fusion (default from config).
    /// Embedding failures are returned, never masked; callers may retry with
    /// [`search_lexical_only`](Self::search_lexical_only).
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        alpha: Option<f32>,
    ) -> Result<Vec<RankedResult>, EngineError> {
        if top_k == 0 {
            return Ok(vec![]);
        }
        self.ensure_index();

        let chunks = self.corpus.read().snapshot();
        if chunks.is_empty() {
            debug!("Search on empty corpus");
            return Ok(vec![]);
        }

        let query_vector = self.cache.embed_query(query)?;
        let chunk_vectors = self
            .cache
            .embed_batch(&chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>())?;
        let similarities = self.cache.similarity(&query_vector, &chunk_vectors);

        let pool = self.pool_size(top_k);

        let mut semantic: Vec<ScoredId> = chunks
            .iter()
            .zip(similarities.iter())
            .map(|(c, s)| ScoredId::new(c.id.clone(), *s))
            .collect();
        semantic.sort_by(|a, b| b.score.total_cmp(&a.score));
        semantic.truncate(pool);

        let lexical: Vec<ScoredId> = self
            .index
            .read()
            .scorer
            .search(query, pool)
            .iter()
            .map(ScoredId::from)
            .collect();

        let fused = self.fusion.fuse(&semantic, &lexical, alpha, pool);

        let by_id: HashMap<&str, (&ChunkRecord, f32)> = chunks
            .iter()
            .zip(similarities.iter())
            .map(|(c, s)| (c.id.as_str(), (c, *s)))
            .collect();

        let mut semantic_scores: HashMap<String, f32> = HashMap::with_capacity(fused.len());
        let candidates: Vec<Candidate> = fused
            .iter()
            .filter_map(|f| {
                let Some(&(record, similarity)) = by_id.get(f.id.as_str()) else {
                    warn!(id = %f.id, "Fused id not in corpus snapshot");
                    return None;
                };
                semantic_scores.insert(f.id.clone(), similarity);
                Some(Candidate {
                    id: Some(record.id.clone()),
                    text: Some(record.text.clone()),
                    original_score: f.fused_score,
                    entities: None,
                    metadata: record.metadata.clone(),
                })
            })
            .collect();

        let query_entities = self.recognizer.entity_map(query);
        let query_entities = (!query_entities.is_empty()).then_some(&query_entities);

        debug!(
            semantic = semantic.len(),
            lexical = lexical.len(),
            fused = candidates.len(),
            top_k,
            "Search candidates prepared"
        );

        Ok(self.reranker.rerank(
            query,
            &candidates,
            query_entities,
            Some(&semantic_scores),
            top_k,
        ))
    }

    /// Lexical-only search. Never calls the embedding backend.
    ///
    /// BM25 scores are divided by the best score so the semantic signal (which
    /// falls back to the candidate's original score) stays in `[0, 1]`.
    pub fn search_lexical_only(&self, query: &str, top_k: usize) -> Vec<RankedResult> {
        if top_k == 0 {
            return vec![];
        }
        self.ensure_index();

        let hits = self.index.read().scorer.search(query, self.pool_size(top_k));
        let Some(best) = hits.first().map(|h| h.score) else {
            return vec![];
        };

        let chunks = self.corpus.read().snapshot();
        let by_id: HashMap<&str, &ChunkRecord> =
            chunks.iter().map(|c| (c.id.as_str(), c)).collect();

        let candidates: Vec<Candidate> = hits
            .iter()
            .filter_map(|h| {
                let record = by_id.get(h.id.as_str())?;
                Some(Candidate {
                    id: Some(record.id.clone()),
                    text: Some(record.text.clone()),
                    original_score: if best > 0.0 { h.score / best } else { 0.0 },
                    entities: None,
                    metadata: record.metadata.clone(),
                })
            })
            .collect();

        let query_entities = self.recognizer.entity_map(query);
        let query_entities = (!query_entities.is_empty()).then_some(&query_entities);

        self.reranker
            .rerank(query, &candidates, query_entities, None, top_k)
    }

    pub fn document(&self, document_id: &str) -> Option<Document> {
        self.corpus.read().documents.get(document_id).cloned()
    }

    pub fn stats(&self) -> EngineStats {
        let (documents, chunks) = {
            let corpus = self.corpus.read();
            (corpus.documents.len(), corpus.chunk_count())
        };
        let (built, stale) = {
            let index = self.index.read();
            (index.scorer.is_built(), index.stale)
        };
        EngineStats::new(documents, chunks, built, stale, self.cache.stats())
    }
}
