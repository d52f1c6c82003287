use bm25::{Document, SearchEngine, SearchEngineBuilder, Tokenizer};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// BM25 term-frequency saturation.
pub const DEFAULT_BM25_K1: f32 = 1.5;
/// BM25 length normalization.
pub const DEFAULT_BM25_B: f32 = 0.75;

/// Lowercases `text` and splits it into runs of alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_BM25_K1,
            b: DEFAULT_BM25_B,
        }
    }
}

/// One lexical match. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalHit {
    pub id: String,
    pub score: f32,
    pub rank: usize,
}

/// [`tokenize`] exposed to the `bm25` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedicalTokenizer;

impl Tokenizer for MedicalTokenizer {
    fn tokenize(&self, input_text: &str) -> Vec<String> {
        tokenize(input_text)
    }
}

/// Keys in the `bm25` engine are corpus positions; `ids` maps them back.
struct Bm25Index {
    ids: Vec<String>,
    /// `None` for an empty corpus.
    engine: Option<SearchEngine<usize, u32, MedicalTokenizer>>,
}

impl std::fmt::Debug for Bm25Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bm25Index")
            .field("documents", &self.ids.len())
            .finish()
    }
}

/// BM25 scorer over `(id, text)` pairs.
#[derive(Debug, Default)]
pub struct LexicalScorer {
    params: Bm25Params,
    index: Option<Bm25Index>,
}

impl LexicalScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: Bm25Params) -> Self {
        Self {
            params,
            index: None,
        }
    }

    /// Replaces the index with one built from `documents`.
    ///
    /// Corpus order is kept and used to break score ties.
    pub fn build<I, K, T>(&mut self, documents: I)
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: AsRef<str>,
    {
        let mut ids = Vec::new();
        let mut corpus: Vec<Document<usize>> = Vec::new();
        for (position, (id, text)) in documents.into_iter().enumerate() {
            ids.push(id.into());
            corpus.push(Document {
                id: position,
                contents: text.as_ref().to_string(),
            });
        }

        let engine = (!corpus.is_empty()).then(|| {
            SearchEngineBuilder::<usize, u32, MedicalTokenizer>::with_tokenizer_and_documents(
                MedicalTokenizer,
                corpus,
            )
            .k1(self.params.k1)
            .b(self.params.b)
            .build()
        });

        debug!(
            documents = ids.len(),
            k1 = self.params.k1,
            b = self.params.b,
            "Built lexical index"
        );

        self.index = Some(Bm25Index { ids, engine });
    }

    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    /// Number of indexed documents (0 when unbuilt).
    pub fn len(&self) -> usize {
        self.index.as_ref().map_or(0, |i| i.ids.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.index = None;
    }

    /// Scores every indexed document against `query`.
    ///
    /// Zero scores are dropped; the rest are sorted descending (ties keep corpus
    /// order), ranked from 1, and truncated to `top_k`.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<LexicalHit> {
        let Some(index) = self.index.as_ref() else {
            return vec![];
        };
        let Some(engine) = index.engine.as_ref() else {
            return vec![];
        };
        if top_k == 0 || tokenize(query).is_empty() {
            return vec![];
        }

        // The crate orders equal scores arbitrarily, so fetch every match and sort here.
        let mut scored: Vec<(usize, f32)> = engine
            .search(query, index.ids.len())
            .into_iter()
            .map(|result| (result.document.id, result.score))
            .filter(|(position, score)| *score > 0.0 && *position < index.ids.len())
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (position, score))| LexicalHit {
                id: index.ids[position].clone(),
                score,
                rank: i + 1,
            })
            .collect()
    }
}
