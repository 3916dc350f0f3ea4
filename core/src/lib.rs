//! BM25 retrieval over a fixed corpus of operational runbooks.
//!
//! Documents go in as `(metadata, body)` pairs, get tokenized on whitespace,
//! and are indexed once into an immutable [`Retriever`]. Rebuilding the corpus
//! means building a new retriever and publishing it through a
//! [`RetrieverHandle`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod error;
pub mod index;
pub mod loader;
pub mod retriever;
pub mod stats;
pub mod tokenizer;

pub use error::SearchError;
pub use index::{Bm25Index, Bm25Params};
pub use retriever::{Retriever, RetrieverHandle, SearchResult};
pub use stats::CorpusStats;

/// Position of a document in load order.
pub type DocId = u32;

/// Free-form key/value header of a document (title, last_reviewed, ...).
pub type Metadata = BTreeMap<String, String>;

/// A document as handed over by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub metadata: Metadata,
    pub text: String,
}

impl SourceDocument {
    pub fn new(metadata: Metadata, text: impl Into<String>) -> Self {
        Self { metadata, text: text.into() }
    }

    /// Document without metadata, mostly useful in tests.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { metadata: Metadata::new(), text: text.into() }
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").map(String::as_str)
    }
}
