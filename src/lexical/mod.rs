//! Lexical (keyword) ranking over a corpus snapshot.
//!
//! The index is rebuilt wholesale by [`LexicalScorer::build`]; there is no
//! incremental update. Querying an unbuilt scorer yields an empty list.

pub mod scorer;


pub use scorer::{Bm25Params, LexicalHit, LexicalScorer, MedicalTokenizer, tokenize};
