use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::vectorizer::term::TermFrequency;

/// Corpus-wide term statistics.
/// Keeps the document count, the number of documents each term occurs in
/// and each term's total number of occurrences.
///
/// It is the base data for the vocabulary filter and the IDF calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFrequency {
    doc_num: u64,
    /// term -> (documents containing it, total occurrences)
    term_counts: IndexMap<Box<str>, (u64, u64)>,
}

impl DocumentFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's terms
    pub fn add_doc(&mut self, freq: &TermFrequency) {
        self.doc_num += 1;
        for (term, count) in freq.iter() {
            if let Some((docs, total)) = self.term_counts.get_mut(term) {
                *docs += 1;
                *total += count;
            } else {
                self.term_counts.insert(term.into(), (1, count));
            }
        }
    }

    /// Merge another partial count into self
    pub fn merge(&mut self, other: &DocumentFrequency) {
        self.doc_num += other.doc_num;
        for (term, &(docs, total)) in other.term_counts.iter() {
            let entry = self.term_counts.entry(term.clone()).or_insert((0, 0));
            entry.0 += docs;
            entry.1 += total;
        }
    }

    /// number of documents counted
    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// number of documents that contain `term`
    #[inline]
    pub fn doc_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).map_or(0, |c| c.0)
    }

    /// distinct terms seen
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// `(term, doc_count, total_count)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64, u64)> + '_ {
        self.term_counts
            .iter()
            .map(|(t, &(docs, total))| (&**t, docs, total))
    }
}
