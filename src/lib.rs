/// This crate turns trail descriptions into TF-IDF vectors and groups them
/// into k-means clusters and NMF topics.
pub mod cluster;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod top_words;
pub mod topic;
pub mod utils;
pub mod vectorizer;

/// Error type shared by every stage
/// Configuration problems (empty corpus, invalid parameters, an empty
/// vocabulary) are reported before any iterative work starts.
/// Non-convergence is not an error; models carry a `converged` flag.
pub use error::{AnalysisError, Result};

/// TF-IDF Vectorizer
/// Builds the vocabulary and the sparse document-term weight matrix of a corpus.
///
/// `TFIDFVectorizer<N, E>` has the following generic parameters:
/// - `N`: matrix value type (`f32` or `f64`)
/// - `E`: TF-IDF calculation engine (e.g. `DefaultTFIDFEngine`)
///
/// The stopword set and the configuration are explicit inputs.
pub use vectorizer::{TFIDFVectorizer, TermSpace, VectorizerConfig};

/// Corpus
/// Ordered collection of trail documents.
/// A document's position is its row in every matrix and label vector built from it.
pub use vectorizer::corpus::{Corpus, Document};

/// Stopwords and tokenization
/// Tokens are runs of alphanumeric characters or `_` with at least two characters.
pub use vectorizer::token::{StopWords, Tokenizer};

/// TF IDF Calculation Engine Trait
/// Defines how IDF is computed; row weighting and normalization are shared.
///
/// Provided engines:
/// - `DefaultTFIDFEngine`: smoothed IDF `ln((1 + n) / (1 + df)) + 1`
/// - `PlainTFIDFEngine`: textbook IDF `ln(n / df)`
pub use vectorizer::tfidf::{DefaultTFIDFEngine, Norm, PlainTFIDFEngine, TFIDFEngine};

/// K-means clustering
/// Hard partition of the documents, k-means++ seeded, best of `n_init` restarts.
pub use cluster::{ClusterModel, KMeansConfig};

/// NMF topic model
/// Soft multi-label topics from a regularized non-negative factorization.
pub use topic::{NmfConfig, TopicModel};

/// Pipeline entry points
pub use pipeline::{cluster_documents, extract_topics, Analysis, PipelineConfig};

/// Corpus sources
pub use ingest::{CorpusSource, CsvCorpusSource};
