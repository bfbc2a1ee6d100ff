use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Index-stable term set.
/// The position of a term is its column in the document-term matrix,
/// so the reverse lookup is the set itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: IndexSet<String>,
}

impl Vocabulary {
    /// Terms keep the iteration order of `terms`; repeats are ignored.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// term at column `index`
    #[inline]
    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get_index(index).map(String::as_str)
    }

    /// column of `term`
    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    /// terms in column order
    pub fn feature_names(&self) -> Vec<&str> {
        self.terms.iter().map(String::as_str).collect()
    }

    /// term -> column map, derived from the feature order
    pub fn reverse_lookup(&self) -> HashMap<&str, usize> {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_lookup_agrees_with_feature_names() {
        let vocab = Vocabulary::from_terms(["alpine", "creek", "lake", "creek"]);
        assert_eq!(vocab.len(), 3);
        let names = vocab.feature_names();
        let lookup = vocab.reverse_lookup();
        for (i, name) in names.iter().enumerate() {
            assert_eq!(lookup[name], i);
            assert_eq!(vocab.index_of(name), Some(i));
            assert_eq!(vocab.term(i), Some(*name));
        }
        assert_eq!(vocab.index_of("summit"), None);
    }
}
