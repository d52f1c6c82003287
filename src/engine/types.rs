use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embedding::CacheStats;
use crate::rerank::Metadata;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
}

/// Atomic retrieval unit. Belongs to exactly one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    /// Position within the document.
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(
        id: impl Into<String>,
        document_id: impl Into<String>,
        index: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            index,
            text: text.into(),
        }
    }
}

/// A source document and its chunks. Replaced wholesale on re-ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: DocumentMetadata::default(),
            chunks: vec![],
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = Some(source.into());
        self
    }

    pub fn with_chunk(mut self, text: impl Into<String>) -> Self {
        let index = self.chunks.len();
        let id = format!("{}#{}", self.id, index);
        self.chunks.push(Chunk::new(id, self.id.clone(), index, text));
        self
    }

    /// Metadata attached to every result drawn from this document.
    pub(crate) fn result_metadata(&self, chunk: &Chunk) -> Metadata {
        let mut out = Metadata::new();
        out.insert("document_id".to_string(), self.id.clone());
        out.insert("chunk_index".to_string(), chunk.index.to_string());
        if let Some(ref title) = self.metadata.title {
            out.insert("title".to_string(), title.clone());
        }
        if let Some(ref source) = self.metadata.source {
            out.insert("source".to_string(), source.clone());
        }
        if let Some(published) = self.metadata.published {
            out.insert("published".to_string(), published.to_rfc3339());
        }
        out
    }
}

/// Snapshot of engine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub documents: usize,
    pub chunks: usize,
    pub index_built: bool,
    pub index_stale: bool,
    pub cache_entries: u64,
    pub cache_bytes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub backend_calls: u64,
}

impl EngineStats {
    pub(crate) fn new(
        documents: usize,
        chunks: usize,
        index_built: bool,
        index_stale: bool,
        cache: CacheStats,
    ) -> Self {
        Self {
            documents,
            chunks,
            index_built,
            index_stale,
            cache_entries: cache.entries,
            cache_bytes: cache.estimated_bytes,
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            backend_calls: cache.backend_calls,
        }
    }
}
