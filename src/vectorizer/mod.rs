pub mod compare;
pub mod corpus;
pub mod matrix;
pub mod serde;
pub mod term;
pub mod tfidf;
pub mod token;
pub mod vocabulary;

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use ::serde::{Deserialize, Serialize};
use num::Float;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::vectorizer::{
    corpus::{Corpus, DocumentFrequency},
    matrix::DocumentTermMatrix,
    term::TermFrequency,
    tfidf::{DefaultTFIDFEngine, Norm, TFIDFEngine, WeightOptions},
    token::{StopWords, Tokenizer},
    vocabulary::Vocabulary,
};

/// Document-frequency bound.
/// An integer is an absolute document count, a float a fraction of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocFreq {
    Count(usize),
    Proportion(f64),
}

impl DocFreq {
    /// bound expressed in documents for a corpus of `doc_num`
    #[inline]
    pub fn resolve(&self, doc_num: u64) -> f64 {
        match *self {
            DocFreq::Count(n) => n as f64,
            DocFreq::Proportion(p) => p * doc_num as f64,
        }
    }

    fn validate(&self, param: &'static str) -> Result<()> {
        match *self {
            DocFreq::Proportion(p) if !(0.0..=1.0).contains(&p) => {
                Err(AnalysisError::invalid(param, p, "a proportion must lie in [0, 1]"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DocFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocFreq::Count(n) => write!(f, "{n}"),
            DocFreq::Proportion(p) => write!(f, "{p}"),
        }
    }
}

/// Vectorizer settings.
/// Every field has a default, see [`VectorizerConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// keep at most this many terms, ranked by corpus frequency
    pub max_features: Option<usize>,
    /// drop terms found in more documents than this
    pub max_df: DocFreq,
    /// drop terms found in fewer documents than this
    pub min_df: DocFreq,
    pub lowercase: bool,
    pub norm: Norm,
    pub sublinear_tf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: Some(5000),
            max_df: DocFreq::Proportion(1.0),
            min_df: DocFreq::Count(1),
            lowercase: true,
            norm: Norm::L2,
            sublinear_tf: false,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == Some(0) {
            return Err(AnalysisError::invalid("max_features", 0, "must be positive"));
        }
        self.max_df.validate("max_df")?;
        self.min_df.validate("min_df")?;
        Ok(())
    }
}

/// Output of the vectorizer: the weight matrix plus everything needed to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermSpace<N = f64>
where
    N: Float,
{
    /// rows = documents, columns = vocabulary terms
    pub matrix: DocumentTermMatrix<N>,
    pub vocabulary: Vocabulary,
    /// IDF per vocabulary column
    pub idf: Vec<f64>,
}

impl<N> TermSpace<N>
where
    N: Float,
{
    pub fn n_docs(&self) -> usize {
        self.matrix.n_rows()
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.vocabulary.feature_names()
    }

    pub fn reverse_lookup(&self) -> HashMap<&str, usize> {
        self.vocabulary.reverse_lookup()
    }
}

/// TF-IDF Vectorizer
/// Builds the vocabulary and the document-term weight matrix of a corpus.
///
/// `TFIDFVectorizer<N, E>` has the following generic parameters:
/// - `N`: matrix value type (`f32` or `f64`)
/// - `E`: TF-IDF calculation engine (e.g. `DefaultTFIDFEngine`)
///
/// The stopword set is an explicit input; nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct TFIDFVectorizer<N = f64, E = DefaultTFIDFEngine>
where
    N: Float + Default + Into<f64> + Send + Sync,
    E: TFIDFEngine<N>,
{
    pub config: VectorizerConfig,
    tokenizer: Tokenizer,
    stop_words: StopWords,
    _marker: PhantomData<fn() -> (N, E)>,
}

impl<N, E> TFIDFVectorizer<N, E>
where
    N: Float + Default + Into<f64> + Send + Sync,
    E: TFIDFEngine<N>,
{
    pub fn new(config: VectorizerConfig, stop_words: StopWords) -> Self {
        let tokenizer = Tokenizer::new(config.lowercase);
        Self {
            config,
            tokenizer,
            stop_words,
            _marker: PhantomData,
        }
    }

    fn weight_options(&self) -> WeightOptions {
        WeightOptions {
            norm: self.config.norm,
            sublinear_tf: self.config.sublinear_tf,
        }
    }

    /// Learn the vocabulary and IDF of `corpus` and return its weight matrix.
    ///
    /// # Errors
    /// - `EmptyCorpus` when the corpus has no documents
    /// - `InvalidParameter` for an invalid config
    /// - `EmptyVocabulary` when the document-frequency window keeps no term
    pub fn fit_transform(&self, corpus: &Corpus) -> Result<TermSpace<N>> {
        if corpus.is_empty() {
            return Err(AnalysisError::EmptyCorpus);
        }
        self.config.validate()?;

        let freqs: Vec<TermFrequency> = corpus
            .documents()
            .par_iter()
            .map(|doc| self.tokenizer.term_frequency(&doc.lemmatized_text, &self.stop_words))
            .collect();

        let stats = freqs
            .par_iter()
            .fold(DocumentFrequency::new, |mut acc, freq| {
                acc.add_doc(freq);
                acc
            })
            .reduce(DocumentFrequency::new, |mut a, b| {
                a.merge(&b);
                a
            });

        let vocabulary = self.build_vocabulary(&stats)?;
        let idf = E::idf_vec(&stats, &vocabulary);
        let options = self.weight_options();
        let rows = freqs
            .par_iter()
            .map(|freq| E::tf_idf_vec(freq, &vocabulary, &idf, &options))
            .collect();
        let matrix = DocumentTermMatrix::from_rows(rows, vocabulary.len())?;

        info!(
            documents = matrix.n_rows(),
            vocabulary = vocabulary.len(),
            nnz = matrix.nnz(),
            "Vectorized corpus"
        );

        Ok(TermSpace {
            matrix,
            vocabulary,
            idf,
        })
    }

    /// Vectorize new texts against an already fitted vocabulary and IDF.
    /// Terms outside the vocabulary are ignored.
    pub fn transform<S>(&self, space: &TermSpace<N>, texts: &[S]) -> Result<DocumentTermMatrix<N>>
    where
        S: AsRef<str> + Sync,
    {
        let options = self.weight_options();
        let rows = texts
            .par_iter()
            .map(|text| {
                let freq = self.tokenizer.term_frequency(text.as_ref(), &self.stop_words);
                E::tf_idf_vec(&freq, &space.vocabulary, &space.idf, &options)
            })
            .collect();
        DocumentTermMatrix::from_rows(rows, space.vocabulary.len())
    }

    /// Apply the document-frequency window, then the `max_features` cut.
    /// The surviving terms are ordered alphabetically.
    fn build_vocabulary(&self, stats: &DocumentFrequency) -> Result<Vocabulary> {
        let doc_num = stats.doc_num();
        let max_docs = self.config.max_df.resolve(doc_num);
        let min_docs = self.config.min_df.resolve(doc_num);
        if max_docs < min_docs {
            return Err(AnalysisError::invalid(
                "max_df",
                self.config.max_df,
                "max_df corresponds to fewer documents than min_df",
            ));
        }

        let mut kept: Vec<(&str, u64)> = stats
            .iter()
            .filter(|&(_, docs, _)| {
                let docs = docs as f64;
                docs >= min_docs && docs <= max_docs
            })
            .map(|(term, _, total)| (term, total))
            .collect();
        debug!(
            seen = stats.vocab_size(),
            kept = kept.len(),
            min_docs,
            max_docs,
            "Applied document-frequency window"
        );

        if kept.is_empty() {
            return Err(AnalysisError::EmptyVocabulary {
                min_df: self.config.min_df.to_string(),
                max_df: self.config.max_df.to_string(),
            });
        }

        if let Some(limit) = self.config.max_features {
            if kept.len() > limit {
                kept.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                kept.truncate(limit);
            }
        }
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        Ok(Vocabulary::from_terms(kept.into_iter().map(|(term, _)| term)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::tfidf::PlainTFIDFEngine;

    fn trails() -> Corpus {
        Corpus::from_texts([
            "lake trail lake forest",
            "summit ridge trail",
            "lake shore forest",
            "summit summit ridge scramble",
        ])
    }

    fn vectorizer(config: VectorizerConfig) -> TFIDFVectorizer {
        TFIDFVectorizer::new(config, StopWords::new())
    }

    #[test]
    fn empty_corpus_is_a_configuration_error() {
        let err = vectorizer(VectorizerConfig::default())
            .fit_transform(&Corpus::new())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyCorpus));
        assert!(err.is_configuration());
    }

    #[test]
    fn vocabulary_is_sorted_and_lookup_consistent() {
        let space = vectorizer(VectorizerConfig::default()).fit_transform(&trails()).unwrap();
        let names = space.feature_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        for (term, idx) in space.reverse_lookup() {
            assert_eq!(names[idx], term);
        }
        assert_eq!(space.matrix.n_cols(), names.len());
        assert_eq!(space.n_docs(), 4);
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let config = VectorizerConfig {
            max_features: Some(3),
            ..VectorizerConfig::default()
        };
        let space = vectorizer(config).fit_transform(&trails()).unwrap();
        // lake: 3, summit: 3, then forest/ridge/trail at 2 -> alphabetical tie-break keeps forest
        assert_eq!(space.feature_names(), vec!["forest", "lake", "summit"]);
    }

    #[test]
    fn vocabulary_never_exceeds_max_features() {
        for limit in 1..=8 {
            let config = VectorizerConfig {
                max_features: Some(limit),
                ..VectorizerConfig::default()
            };
            let space = vectorizer(config).fit_transform(&trails()).unwrap();
            assert!(space.vocabulary.len() <= limit);
        }
    }

    #[test]
    fn document_frequency_window_filters_terms() {
        let config = VectorizerConfig {
            min_df: DocFreq::Count(2),
            max_df: DocFreq::Proportion(0.5),
            ..VectorizerConfig::default()
        };
        let space = vectorizer(config).fit_transform(&trails()).unwrap();
        // every kept term occurs in exactly two of the four documents
        assert_eq!(space.feature_names(), vec!["forest", "lake", "ridge", "summit", "trail"]);
    }

    #[test]
    fn window_excluding_everything_is_reported() {
        let config = VectorizerConfig {
            min_df: DocFreq::Count(4),
            ..VectorizerConfig::default()
        };
        let err = vectorizer(config).fit_transform(&trails()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyVocabulary { .. }));
    }

    #[test]
    fn inverted_window_is_invalid() {
        let config = VectorizerConfig {
            min_df: DocFreq::Count(3),
            max_df: DocFreq::Count(2),
            ..VectorizerConfig::default()
        };
        let err = vectorizer(config).fit_transform(&trails()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { param: "max_df", .. }));
    }

    #[test]
    fn proportion_out_of_range_is_invalid() {
        let config = VectorizerConfig {
            max_df: DocFreq::Proportion(1.5),
            ..VectorizerConfig::default()
        };
        assert!(vectorizer(config).fit_transform(&trails()).is_err());
    }

    #[test]
    fn weights_are_non_negative_and_rows_unit_length() {
        let space = vectorizer(VectorizerConfig::default()).fit_transform(&trails()).unwrap();
        for row in space.matrix.rows() {
            assert!(row.values().iter().all(|&v| v >= 0.0));
            assert!((row.norm_sq() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn stop_words_never_enter_the_vocabulary() {
        let stop: StopWords = ["trail", "lake"].into_iter().collect();
        let v: TFIDFVectorizer = TFIDFVectorizer::new(VectorizerConfig::default(), stop);
        let space = v.fit_transform(&trails()).unwrap();
        assert_eq!(space.vocabulary.index_of("trail"), None);
        assert_eq!(space.vocabulary.index_of("lake"), None);
    }

    #[test]
    fn transform_reuses_fitted_vocabulary() {
        let v = vectorizer(VectorizerConfig::default());
        let space = v.fit_transform(&trails()).unwrap();
        let x = v.transform(&space, &["forest lake glacier"]).unwrap();
        assert_eq!(x.n_cols(), space.vocabulary.len());
        assert_eq!(x.row(0).nnz(), 2);
    }

    #[test]
    fn plain_engine_zeroes_terms_in_every_document() {
        let corpus = Corpus::from_texts(["creek lake", "creek peak"]);
        let space = TFIDFVectorizer::<f64, PlainTFIDFEngine>::new(VectorizerConfig::default(), StopWords::new())
            .fit_transform(&corpus)
            .unwrap();
        let creek = space.vocabulary.index_of("creek").unwrap();
        assert_eq!(space.matrix.get(0, creek), Some(0.0));
    }

    #[test]
    fn doc_freq_deserializes_counts_and_proportions() {
        let count: DocFreq = serde_json::from_str("2").unwrap();
        let prop: DocFreq = serde_json::from_str("0.3").unwrap();
        assert_eq!(count, DocFreq::Count(2));
        assert_eq!(prop, DocFreq::Proportion(0.3));
    }
}
