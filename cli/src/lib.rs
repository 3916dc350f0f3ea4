use anyhow::{Context, Result};
use opsrank_core::loader::load_runbooks;
use opsrank_core::retriever::OwnedSearchResult;
use opsrank_core::{Bm25Params, Retriever};
use std::path::Path;

pub mod seed;

/// Load the runbooks under `dir`, index them, and return the top `k` hits.
pub fn search_runbooks(dir: &Path, query: &str, k: usize, params: Bm25Params) -> Result<Vec<OwnedSearchResult>> {
    let docs = load_runbooks(dir)?;
    let retriever = Retriever::build(docs, params).context("building BM25 index")?;
    tracing::info!(doc_count = retriever.doc_count(), "retriever initialized");
    Ok(retriever.search(query, k).into_iter().map(OwnedSearchResult::from).collect())
}

/// One `Score: 1.23 | Title: ...` line per hit, in rank order.
pub fn hit_lines(results: &[OwnedSearchResult]) -> Vec<String> {
    results
        .iter()
        .map(|hit| {
            let title = hit.metadata.get("title").map(String::as_str).unwrap_or("N/A");
            format!("Score: {:.2} | Title: {}", hit.score, title)
        })
        .collect()
}

/// First `max_chars` characters of `text`, with an ellipsis if cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        out.push_str("...");
    }
    out
}
