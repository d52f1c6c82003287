//! Content-addressed embedding cache.
//!
//! Keys are BLAKE3 hashes of the exact text (see [`crate::hashing`]); values are the
//! vectors the backend produced for that text. The cache is an explicit object owned
//! by whoever builds the engine, shared through [`EmbeddingCacheHandle`].
//!
//! # Concurrency
//!
//! The underlying moka cache is internally synchronized. A miss computes and then
//! inserts. Two callers missing on the same text at the same time may both call the
//! backend; both insert the same content-addressed vector, so the result is correct
//! either way. Only throughput suffers, never correctness.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_EMBED_BATCH_SIZE};
use crate::hashing::{ContentHash, content_hash_hex, hash_content};

use super::backend::EmbeddingBackend;
use super::error::EmbeddingError;
use super::similarity;

/// A cached vector. Cloning is a refcount bump.
pub type Embedding = Arc<[f32]>;

const KEY_BYTES: usize = std::mem::size_of::<ContentHash>();

#[derive(Debug, Clone)]
pub struct EmbeddingCacheConfig {
    /// Max entries kept (LRU-style eviction past this).
    pub capacity: u64,
    /// Max texts per backend call.
    pub max_batch_size: usize,
    /// Reject backend vectors of any other length when set.
    pub expected_dim: Option<usize>,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            max_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            expected_dim: None,
        }
    }
}

impl EmbeddingCacheConfig {
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_expected_dim(mut self, dim: usize) -> Self {
        self.expected_dim = Some(dim);
        self
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_batch_size == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_batch_size must be at least 1".to_string(),
            });
        }
        if self.capacity == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "cache capacity must be at least 1".to_string(),
            });
        }
        if self.expected_dim == Some(0) {
            return Err(EmbeddingError::InvalidConfig {
                reason: "expected_dim cannot be zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: u64,
    pub estimated_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub backend_calls: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Embedding cache in front of an [`EmbeddingBackend`].
pub struct EmbeddingCache {
    entries: Cache<ContentHash, Embedding>,
    backend: Arc<dyn EmbeddingBackend>,
    config: EmbeddingCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    backend_calls: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Result<Self, EmbeddingError> {
        Self::with_config(backend, EmbeddingCacheConfig::default())
    }

    pub fn with_config(
        backend: Arc<dyn EmbeddingBackend>,
        mut config: EmbeddingCacheConfig,
    ) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if let (Some(expected), Some(reported)) = (config.expected_dim, backend.dimension())
            && expected != reported
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: reported,
            });
        }
        if config.expected_dim.is_none() {
            config.expected_dim = backend.dimension();
        }

        Ok(Self {
            entries: Cache::builder().max_capacity(config.capacity).build(),
            backend,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            backend_calls: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &EmbeddingCacheConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Embeds `texts`, serving repeats from cache. Output order matches input order.
    ///
    /// Uncached texts are deduplicated and sent in batches of at most
    /// `max_batch_size`. If any batch fails, nothing from this call is inserted and
    /// the error is returned; previously cached entries are untouched.
    pub fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let hashes: Vec<ContentHash> = texts.iter().map(|t| hash_content(t.as_ref())).collect();

        let mut resolved: HashMap<ContentHash, Embedding> = HashMap::with_capacity(texts.len());
        let mut pending: Vec<(ContentHash, String)> = Vec::new();
        let mut pending_keys: HashSet<ContentHash> = HashSet::new();

        for (hash, text) in hashes.iter().zip(texts.iter()) {
            if resolved.contains_key(hash) || pending_keys.contains(hash) {
                continue;
            }
            match self.entries.get(hash) {
                Some(vector) => {
                    resolved.insert(*hash, vector);
                }
                None => {
                    pending_keys.insert(*hash);
                    pending.push((*hash, text.as_ref().to_string()));
                }
            }
        }

        let hits = (texts.len() - pending.len()) as u64;
        self.hits.fetch_add(hits, Ordering::Relaxed);
        self.misses.fetch_add(pending.len() as u64, Ordering::Relaxed);

        debug!(
            total = texts.len(),
            cached = hits,
            uncached = pending.len(),
            backend = self.backend.name(),
            "Resolving embeddings"
        );

        if !pending.is_empty() {
            let computed = self.compute(&pending)?;
            for ((hash, _), vector) in pending.iter().zip(computed) {
                self.entries.insert(*hash, vector.clone());
                resolved.insert(*hash, vector);
            }
        }

        hashes
            .iter()
            .map(|hash| {
                resolved.get(hash).cloned().ok_or_else(|| {
                    // Evicted between insert and lookup is impossible: `resolved` is local.
                    EmbeddingError::backend(self.backend.name(), "vector missing after resolve")
                })
            })
            .collect()
    }

    /// Single-text path through the same cache.
    pub fn embed_query(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::backend(self.backend.name(), "empty result for query"))
    }

    /// Cosine similarity of `query` against each row of `matrix`.
    pub fn similarity<V: AsRef<[f32]>>(&self, query: &[f32], matrix: &[V]) -> Vec<f32> {
        similarity::similarity(query, matrix)
    }

    /// Calls the backend for every pending text; all-or-nothing.
    fn compute(&self, pending: &[(ContentHash, String)]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut out: Vec<Embedding> = Vec::with_capacity(pending.len());

        for batch in pending.chunks(self.config.max_batch_size) {
            let inputs: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
            self.backend_calls.fetch_add(1, Ordering::Relaxed);

            let vectors = self.backend.embed(&inputs).map_err(|e| {
                warn!(
                    backend = self.backend.name(),
                    batch = inputs.len(),
                    first_key = %content_hash_hex(&batch[0].0),
                    error = %e,
                    "Embedding backend call failed, discarding batch results"
                );
                e
            })?;

            if vectors.len() != inputs.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: inputs.len(),
                    actual: vectors.len(),
                });
            }

            for vector in vectors {
                if let Some(expected) = self.config.expected_dim
                    && vector.len() != expected
                {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                out.push(Arc::from(vector));
            }
        }

        Ok(out)
    }

    /// Returns `true` if the exact text has a cached vector.
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(&hash_content(text))
    }

    /// Number of cached vectors.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rough heap footprint: keys plus vector payloads.
    pub fn estimated_memory_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|(_, v)| (KEY_BYTES + v.len() * std::mem::size_of::<f32>()) as u64)
            .sum()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            estimated_bytes: self.estimated_memory_bytes(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            backend_calls: self.backend_calls.load(Ordering::Relaxed),
        }
    }

    /// Drops every cached vector. Counters are kept.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("backend", &self.backend.name())
            .field("entries", &self.entries.entry_count())
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Clone)]
/// Shared handle to an [`EmbeddingCache`].
pub struct EmbeddingCacheHandle {
    inner: Arc<EmbeddingCache>,
}

impl EmbeddingCacheHandle {
    pub fn new(cache: EmbeddingCache) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }

    #[inline]
    pub fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.inner.embed_batch(texts)
    }

    #[inline]
    pub fn embed_query(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.inner.embed_query(text)
    }

    #[inline]
    pub fn similarity<V: AsRef<[f32]>>(&self, query: &[f32], matrix: &[V]) -> Vec<f32> {
        self.inner.similarity(query, matrix)
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn estimated_memory_bytes(&self) -> u64 {
        self.inner.estimated_memory_bytes()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    #[inline]
    pub fn clear(&self) {
        self.inner.clear();
    }

    #[inline]
    pub fn contains(&self, text: &str) -> bool {
        self.inner.contains(text)
    }

    /// Returns the number of strong references to the underlying cache.
    #[inline]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.inner
    }
}

impl std::fmt::Debug for EmbeddingCacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCacheHandle")
            .field("strong_count", &self.strong_count())
            .finish()
    }
}
