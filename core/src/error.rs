use thiserror::Error;

/// Errors surfaced by index construction and search.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    /// An index cannot be built over zero documents.
    #[error("cannot build an index over an empty corpus")]
    EmptyCorpus,

    /// Search was called before any index was published.
    #[error("index not built: no corpus has been indexed yet")]
    IndexNotBuilt,

    /// Corpus statistics whose parts disagree with each other.
    #[error("inconsistent corpus statistics: {0}")]
    InconsistentStats(String),

    /// More documents than a [`DocId`](crate::DocId) can address.
    #[error("corpus of {doc_count} documents exceeds the document id range")]
    CorpusTooLarge {
        doc_count: usize,
    },

    /// A BM25 parameter is outside its valid range.
    #[error("invalid BM25 parameter {name} = {value}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
    },
}
