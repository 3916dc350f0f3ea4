use crate::error::SearchError;
use crate::stats::CorpusStats;
use serde::{Deserialize, Serialize};

/// BM25 tuning knobs, fixed for the lifetime of an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation: how quickly extra occurrences stop adding score.
    pub k1: f64,
    /// Length normalization: how strongly long documents are penalized (0 = not at all).
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(SearchError::InvalidParameter { name: "k1", value: self.k1 });
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(SearchError::InvalidParameter { name: "b", value: self.b });
        }
        Ok(())
    }
}

/// Okapi BM25 scorer over immutable corpus statistics.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    stats: CorpusStats,
    params: Bm25Params,
    /// Per document: `k1 * (1 - b + b * doclen / avgdl)`.
    length_norms: Vec<f64>,
}

impl Bm25Index {
    pub fn new(stats: CorpusStats, params: Bm25Params) -> Result<Self, SearchError> {
        params.validate()?;
        check_stats(&stats)?;
        let Bm25Params { k1, b } = params;
        let avgdl = stats.avg_doc_length;
        let length_norms = stats
            .doc_lengths
            .iter()
            .map(|&dl| {
                // every document is empty when avgdl is 0, so tf is 0 everywhere too
                let ratio = if avgdl > 0.0 { dl as f64 / avgdl } else { 0.0 };
                k1 * (1.0 - b + b * ratio)
            })
            .collect();
        Ok(Self { stats, params, length_norms })
    }

    pub fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn doc_count(&self) -> usize {
        self.stats.doc_count
    }

    /// `ln((N - df + 0.5) / (df + 0.5) + 1)`; unseen terms use df = 0.
    pub fn idf(&self, term: &str) -> f64 {
        idf(self.stats.doc_count, self.stats.doc_frequency(term))
    }

    /// Score every document against the query, aligned by document id.
    ///
    /// Query terms are taken in order with repeats, so a term given twice
    /// contributes twice.
    pub fn score_all<T: AsRef<str>>(&self, query_tokens: &[T]) -> Vec<f64> {
        let mut scores = vec![0.0f64; self.stats.doc_count];
        let k1 = self.params.k1;
        for token in query_tokens {
            let term = token.as_ref();
            let idf = self.idf(term);
            for (doc, score) in scores.iter_mut().enumerate() {
                let tf = self.stats.term_frequency(doc, term) as f64;
                if tf == 0.0 {
                    continue;
                }
                *score += idf * (tf * (k1 + 1.0)) / (tf + self.length_norms[doc]);
            }
        }
        scores
    }
}

/// Stats built by hand must hold the same invariants as [`CorpusStats::build`] output.
fn check_stats(stats: &CorpusStats) -> Result<(), SearchError> {
    let n = stats.doc_count;
    if n == 0 {
        return Err(SearchError::EmptyCorpus);
    }
    if stats.doc_lengths.len() != n {
        return Err(SearchError::InconsistentStats(format!(
            "{} document lengths for {n} documents",
            stats.doc_lengths.len()
        )));
    }
    if stats.term_frequencies.len() != n {
        return Err(SearchError::InconsistentStats(format!(
            "{} term frequency maps for {n} documents",
            stats.term_frequencies.len()
        )));
    }
    if !stats.avg_doc_length.is_finite() || stats.avg_doc_length < 0.0 {
        return Err(SearchError::InconsistentStats(format!(
            "average document length {}",
            stats.avg_doc_length
        )));
    }
    if let Some((term, df)) = stats.document_frequency.iter().find(|(_, df)| **df == 0 || **df as usize > n) {
        return Err(SearchError::InconsistentStats(format!(
            "document frequency {df} for {term:?} in {n} documents"
        )));
    }
    Ok(())
}

/// BM25 inverse document frequency for a term present in `df` of `n` documents.
pub fn idf(n: usize, df: u32) -> f64 {
    let n = n as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}
