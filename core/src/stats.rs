use crate::error::SearchError;
use std::collections::HashMap;

/// Corpus-wide counts that BM25 needs, computed once from tokenized documents.
///
/// A term never occurs in any map with a zero count: absence means zero.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    pub doc_count: usize,
    pub doc_lengths: Vec<u32>,
    pub avg_doc_length: f64,
    pub term_frequencies: Vec<HashMap<String, u32>>,
    pub document_frequency: HashMap<String, u32>,
}

impl CorpusStats {
    /// Build statistics over documents in load order.
    ///
    /// Fails with [`SearchError::EmptyCorpus`] when `docs` is empty. Empty
    /// documents are fine and count as length 0.
    pub fn build<T: AsRef<str>>(docs: &[Vec<T>]) -> Result<Self, SearchError> {
        if docs.is_empty() {
            return Err(SearchError::EmptyCorpus);
        }

        let mut doc_lengths: Vec<u32> = Vec::with_capacity(docs.len());
        let mut term_frequencies: Vec<HashMap<String, u32>> = Vec::with_capacity(docs.len());
        let mut document_frequency: HashMap<String, u32> = HashMap::new();
        let mut total_len: u64 = 0;

        for tokens in docs {
            let mut tf_counts: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                let term = token.as_ref();
                match tf_counts.get_mut(term) {
                    Some(count) => *count += 1,
                    None => {
                        tf_counts.insert(term.to_owned(), 1);
                    }
                }
            }
            // Each key of tf_counts is a term seen in this document exactly once.
            for term in tf_counts.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            let len = tokens.len() as u32;
            total_len += len as u64;
            doc_lengths.push(len);
            term_frequencies.push(tf_counts);
        }

        let doc_count = docs.len();
        Ok(Self {
            doc_count,
            doc_lengths,
            avg_doc_length: total_len as f64 / doc_count as f64,
            term_frequencies,
            document_frequency,
        })
    }

    /// Occurrences of `term` in document `doc`, zero if absent.
    pub fn term_frequency(&self, doc: usize, term: &str) -> u32 {
        self.term_frequencies
            .get(doc)
            .and_then(|tf| tf.get(term))
            .copied()
            .unwrap_or(0)
    }

    /// Number of documents containing `term`, zero if unseen.
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    /// Number of distinct terms in the corpus.
    pub fn vocabulary_size(&self) -> usize {
        self.document_frequency.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn stats_for(texts: &[&str]) -> CorpusStats {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();
        CorpusStats::build(&docs).unwrap()
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let docs: Vec<Vec<String>> = Vec::new();
        assert_eq!(CorpusStats::build(&docs).unwrap_err(), SearchError::EmptyCorpus);
    }

    #[test]
    fn lengths_and_frequencies() {
        let s = stats_for(&["hello hello hello world", "hello rust"]);
        assert_eq!(s.doc_count, 2);
        assert_eq!(s.doc_lengths, vec![4, 2]);
        assert!((s.avg_doc_length - 3.0).abs() < 1e-12);
        assert_eq!(s.term_frequency(0, "hello"), 3);
        assert_eq!(s.term_frequency(1, "hello"), 1);
        assert_eq!(s.term_frequency(1, "world"), 0);
        // document frequency counts presence, not occurrences
        assert_eq!(s.doc_frequency("hello"), 2);
        assert_eq!(s.doc_frequency("world"), 1);
        assert_eq!(s.doc_frequency("missing"), 0);
        assert_eq!(s.vocabulary_size(), 3);
    }

    #[test]
    fn invariants_hold() {
        let s = stats_for(&["a b c a", "", "c d", "d d d"]);
        assert_eq!(s.doc_count, s.doc_lengths.len());
        assert_eq!(s.doc_count, s.term_frequencies.len());
        for (term, df) in &s.document_frequency {
            assert!(*df >= 1 && (*df as usize) <= s.doc_count, "{term}: {df}");
        }
        for tf in &s.term_frequencies {
            assert!(tf.values().all(|c| *c >= 1));
        }
    }

    #[test]
    fn empty_document_has_zero_length() {
        let s = stats_for(&["", "cpu usage high"]);
        assert_eq!(s.doc_lengths[0], 0);
        assert!(s.term_frequencies[0].is_empty());
        assert!((s.avg_doc_length - 1.5).abs() < 1e-12);
    }
}
