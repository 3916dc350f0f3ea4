use crate::error::SearchError;
use crate::index::{Bm25Index, Bm25Params};
use crate::stats::CorpusStats;
use crate::tokenizer::tokenize;
use crate::{DocId, Metadata, SourceDocument};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// One ranked hit, borrowing metadata and text from the retriever.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<'a> {
    pub doc_id: DocId,
    pub metadata: &'a Metadata,
    pub text: &'a str,
    pub score: f64,
}

impl SearchResult<'_> {
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").map(String::as_str)
    }
}

/// A fully built BM25 index together with the documents it was built from.
///
/// Immutable once built. To pick up corpus changes build a new one and
/// publish it through a [`RetrieverHandle`].
#[derive(Debug)]
pub struct Retriever {
    docs: Vec<SourceDocument>,
    index: Bm25Index,
}

impl Retriever {
    pub fn build(docs: Vec<SourceDocument>, params: Bm25Params) -> Result<Self, SearchError> {
        if docs.is_empty() {
            return Err(SearchError::EmptyCorpus);
        }
        check_doc_id_range(docs.len())?;
        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(&d.text)).collect();
        let stats = CorpusStats::build(&tokenized)?;
        let index = Bm25Index::new(stats, params)?;
        tracing::info!(
            event = "index_built",
            doc_count = index.doc_count(),
            avg_doc_length = index.stats().avg_doc_length,
            vocabulary = index.stats().vocabulary_size(),
            "index built"
        );
        Ok(Self { docs, index })
    }

    /// Top `k` documents by descending score.
    ///
    /// Equal scores keep load order. Returns `min(k, doc_count)` results, so
    /// every document is returned (possibly with score 0) when `k` is large.
    pub fn search(&self, query: &str, k: usize) -> Vec<SearchResult<'_>> {
        let query_tokens = tokenize(query);
        let scores = self.index.score_all(&query_tokens);

        // build() guarantees every position fits in a DocId
        let mut ranked: Vec<DocId> = (0..).take(scores.len()).collect();
        // sort_by is stable, which gives the load-order tie-break
        ranked.sort_by(|&a, &b| scores[b as usize].total_cmp(&scores[a as usize]));
        ranked.truncate(k);

        let results: Vec<SearchResult<'_>> = ranked
            .into_iter()
            .map(|doc_id| {
                let doc = &self.docs[doc_id as usize];
                SearchResult { doc_id, metadata: &doc.metadata, text: &doc.text, score: scores[doc_id as usize] }
            })
            .collect();
        tracing::debug!(
            event = "search_completed",
            query_len = query_tokens.len(),
            result_count = results.len(),
            "search completed"
        );
        results
    }

    pub fn doc(&self, doc_id: DocId) -> Option<&SourceDocument> {
        self.docs.get(doc_id as usize)
    }

    pub fn docs(&self) -> &[SourceDocument] {
        &self.docs
    }

    pub fn doc_count(&self) -> usize {
        self.index.doc_count()
    }

    pub fn index(&self) -> &Bm25Index {
        &self.index
    }
}

fn check_doc_id_range(doc_count: usize) -> Result<(), SearchError> {
    // ids run 0..doc_count, so the last one is doc_count - 1
    match DocId::try_from(doc_count.saturating_sub(1)) {
        Ok(_) => Ok(()),
        Err(_) => Err(SearchError::CorpusTooLarge { doc_count }),
    }
}

/// Publication point for the current retriever.
///
/// Readers take a cheap `Arc` snapshot and search without holding the lock,
/// so a rebuild never exposes a half-built index.
#[derive(Debug, Default)]
pub struct RetrieverHandle {
    current: RwLock<Option<Arc<Retriever>>>,
}

impl RetrieverHandle {
    /// Handle with nothing published yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retriever(retriever: Retriever) -> Self {
        Self { current: RwLock::new(Some(Arc::new(retriever))) }
    }

    /// Swap in a new retriever, returning the one it replaced.
    pub fn publish(&self, retriever: Retriever) -> Option<Arc<Retriever>> {
        self.current.write().replace(Arc::new(retriever))
    }

    pub fn current(&self) -> Result<Arc<Retriever>, SearchError> {
        self.current.read().clone().ok_or(SearchError::IndexNotBuilt)
    }

    pub fn is_built(&self) -> bool {
        self.current.read().is_some()
    }

    /// Search the current retriever, returning owned results.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<OwnedSearchResult>, SearchError> {
        let retriever = self.current()?;
        let results = retriever.search(query, k).into_iter().map(OwnedSearchResult::from).collect();
        Ok(results)
    }
}

/// A [`SearchResult`] detached from the retriever it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedSearchResult {
    pub doc_id: DocId,
    pub metadata: Metadata,
    pub text: String,
    pub score: f64,
}

impl From<SearchResult<'_>> for OwnedSearchResult {
    fn from(r: SearchResult<'_>) -> Self {
        Self { doc_id: r.doc_id, metadata: r.metadata.clone(), text: r.text.to_owned(), score: r.score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> Vec<SourceDocument> {
        texts.iter().map(|t| SourceDocument::from_text(*t)).collect()
    }

    fn retriever(texts: &[&str]) -> Retriever {
        Retriever::build(corpus(texts), Bm25Params::default()).unwrap()
    }

    #[test]
    fn build_rejects_empty_corpus() {
        let err = Retriever::build(Vec::new(), Bm25Params::default()).unwrap_err();
        assert_eq!(err, SearchError::EmptyCorpus);
    }

    #[test]
    fn doc_ids_must_fit_in_u32() {
        assert!(check_doc_id_range(1).is_ok());
        assert!(check_doc_id_range(DocId::MAX as usize).is_ok());
        #[cfg(target_pointer_width = "64")]
        {
            let too_many = DocId::MAX as usize + 2;
            assert_eq!(check_doc_id_range(too_many).unwrap_err(), SearchError::CorpusTooLarge { doc_count: too_many });
        }
    }

    #[test]
    fn result_count_is_min_of_k_and_docs() {
        let r = retriever(&["a b", "b c", "c d"]);
        for k in 0..6 {
            assert_eq!(r.search("b", k).len(), k.min(3), "k={k}");
        }
        assert!(r.search("b", 0).is_empty());
    }

    #[test]
    fn ties_keep_load_order() {
        let r = retriever(&["x y", "p q", "x y", "x y"]);
        let ids: Vec<DocId> = r.search("x", 4).iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![0, 2, 3, 1]);
    }

    #[test]
    fn empty_query_returns_zero_scores_in_load_order() {
        let r = retriever(&["a", "b"]);
        let hits = r.search("", 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, 0);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn unpublished_handle_reports_index_not_built() {
        let handle = RetrieverHandle::new();
        assert!(!handle.is_built());
        assert_eq!(handle.search("anything", 3).unwrap_err(), SearchError::IndexNotBuilt);
    }

    #[test]
    fn publish_replaces_retriever() {
        let handle = RetrieverHandle::with_retriever(retriever(&["old corpus"]));
        let snapshot = handle.current().unwrap();
        let previous = handle.publish(retriever(&["new corpus", "second doc"]));
        assert!(previous.is_some());
        // existing snapshots still see the old corpus
        assert_eq!(snapshot.doc_count(), 1);
        assert_eq!(handle.current().unwrap().doc_count(), 2);
        let hits = handle.search("new", 1).unwrap();
        assert_eq!(hits[0].text, "new corpus");
    }
}
