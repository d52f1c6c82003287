//! Medrank command-line entrypoint.
//!
//! ```text
//! medrank [--corpus <file.json>] [--top-k <n>] [--alpha <a>] [--lexical-only] <query...>
//! ```
//!
//! The corpus file is a JSON array of documents. Without one, a small built-in
//! sample corpus is searched. Results are printed as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use medrank::config::Config;
use medrank::engine::{Document, RetrievalEngine};
use medrank::rerank::RankedResult;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of documents to search.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Number of results to print.
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Semantic weight in fusion, overriding MEDRANK_FUSION_ALPHA.
    #[arg(long)]
    alpha: Option<f32>,

    /// Skip embeddings and rank with BM25 only.
    #[arg(long)]
    lexical_only: bool,

    /// Query words.
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

impl Args {
    fn query(&self) -> String {
        self.query.join(" ")
    }
}

fn sample_corpus() -> Vec<Document> {
    vec![
        Document::new(
            "diabetes-guideline",
            "Metformin is the first-line treatment for type 2 diabetes. Insulin is added \
             when HbA1c stays above target despite lifestyle changes.",
        )
        .with_title("Type 2 diabetes management"),
        Document::new(
            "ckd-prescribing",
            "In chronic kidney disease, metformin dose must be reduced or stopped as eGFR \
             falls. NSAIDs should be avoided.",
        )
        .with_title("Prescribing in CKD"),
        Document::new(
            "asthma-overview",
            "Asthma presents with wheezing and shortness of breath. Inhaled corticosteroids \
             are the mainstay of maintenance therapy.",
        )
        .with_title("Asthma overview"),
        Document::new(
            "hypertension-care",
            "Lisinopril and amlodipine are common first-line treatments for hypertension. \
             Blood pressure above 140/90 mmHg warrants follow-up.",
        )
        .with_title("Hypertension care"),
    ]
}

fn load_corpus(path: Option<&PathBuf>) -> anyhow::Result<Vec<Document>> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read corpus {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse corpus {}", path.display()))
        }
        None => {
            tracing::info!("No --corpus given, using built-in sample corpus");
            Ok(sample_corpus())
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let query = args.query();

    let config = Config::from_env()?;
    config.validate()?;
    if config.embedding_url.is_none() {
        tracing::warn!("No MEDRANK_EMBEDDING_URL configured, using stub embeddings");
    }

    let engine = RetrievalEngine::from_config(&config)?;
    for document in load_corpus(args.corpus.as_ref())? {
        engine.ingest(document)?;
    }

    let top_k = args.top_k;
    tracing::info!(query = %query, top_k, "Searching");

    let results: Vec<RankedResult> = if args.lexical_only {
        engine.search_lexical_only(&query, top_k)
    } else {
        match engine.search(&query, top_k, args.alpha) {
            Ok(results) => results,
            Err(e) if e.is_embedding_failure() => {
                tracing::warn!(error = %e, "Embedding failed, falling back to lexical-only search");
                engine.search_lexical_only(&query, top_k)
            }
            Err(e) => return Err(e.into()),
        }
    };

    println!("{}", serde_json::to_string_pretty(&results)?);

    let stats = engine.stats();
    tracing::info!(
        documents = stats.documents,
        chunks = stats.chunks,
        cache_entries = stats.cache_entries,
        backend_calls = stats.backend_calls,
        "Done"
    );
    Ok(())
}
