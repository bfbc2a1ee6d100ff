use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cluster::{ClusterModel, KMeansConfig};
use crate::error::{AnalysisError, Result};
use crate::topic::{NmfConfig, TopicModel};
use crate::vectorizer::{
    corpus::Corpus,
    serde::{from_cbor_reader, to_cbor_writer},
    token::StopWords,
    TFIDFVectorizer, TermSpace, VectorizerConfig,
};

/// Settings for a whole run.
///
/// ```json
/// {
///   "vectorizer": { "max_df": 0.95, "min_df": 2 },
///   "clustering": { "n_clusters": 8, "seed": 42 },
///   "topics": { "n_topics": 10 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub clustering: Option<KMeansConfig>,
    #[serde(default)]
    pub topics: Option<NmfConfig>,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn clustering(&self) -> Result<&KMeansConfig> {
        self.clustering
            .as_ref()
            .ok_or_else(|| AnalysisError::invalid("clustering", "none", "section is required"))
    }

    fn topics(&self) -> Result<&NmfConfig> {
        self.topics
            .as_ref()
            .ok_or_else(|| AnalysisError::invalid("topics", "none", "section is required"))
    }

    /// Check every present model section.
    fn validate_models(&self, n_docs: usize) -> Result<()> {
        if let Some(clustering) = &self.clustering {
            clustering.validate(n_docs)?;
        }
        if let Some(topics) = &self.topics {
            topics.validate(n_docs)?;
        }
        Ok(())
    }
}

fn vectorize(corpus: &Corpus, stop_words: &StopWords, config: &PipelineConfig) -> Result<TermSpace> {
    if corpus.is_empty() {
        return Err(AnalysisError::EmptyCorpus);
    }
    config.vectorizer.validate()?;
    let vectorizer: TFIDFVectorizer = TFIDFVectorizer::new(config.vectorizer.clone(), stop_words.clone());
    vectorizer.fit_transform(corpus)
}

/// Vectorize `corpus` and partition it with k-means.
/// Needs the `clustering` section of `config`.
pub fn cluster_documents(
    corpus: &Corpus,
    stop_words: &StopWords,
    config: &PipelineConfig,
) -> Result<(TermSpace, ClusterModel)> {
    let kmeans = config.clustering()?;
    kmeans.validate(corpus.len())?;
    let space = vectorize(corpus, stop_words, config)?;
    let model = ClusterModel::fit(&space, kmeans)?;
    Ok((space, model))
}

/// Vectorize `corpus` and factorize it into topics.
/// Needs the `topics` section of `config`.
pub fn extract_topics(
    corpus: &Corpus,
    stop_words: &StopWords,
    config: &PipelineConfig,
) -> Result<(TermSpace, TopicModel)> {
    let nmf = config.topics()?;
    nmf.validate(corpus.len())?;
    let space = vectorize(corpus, stop_words, config)?;
    let model = TopicModel::fit(&space, nmf)?;
    Ok((space, model))
}

/// Everything one run produces, keyed back to the corpus by `ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// document ids in matrix row order
    pub ids: Vec<String>,
    pub space: TermSpace,
    pub clusters: Option<ClusterModel>,
    pub topics: Option<TopicModel>,
}

impl Analysis {
    /// Vectorize once, then run whichever models `config` names.
    /// Clustering and topic extraction run concurrently.
    pub fn run(corpus: &Corpus, stop_words: &StopWords, config: &PipelineConfig) -> Result<Self> {
        config.validate_models(corpus.len())?;
        let space = vectorize(corpus, stop_words, config)?;

        let (clusters, topics) = rayon::join(
            || config.clustering.as_ref().map(|c| ClusterModel::fit(&space, c)).transpose(),
            || config.topics.as_ref().map(|t| TopicModel::fit(&space, t)).transpose(),
        );
        let (clusters, topics) = (clusters?, topics?);

        info!(
            documents = corpus.len(),
            clusters = clusters.as_ref().map_or(0, ClusterModel::n_clusters),
            topics = topics.as_ref().map_or(0, TopicModel::n_topics),
            "Analysis finished"
        );

        Ok(Self {
            ids: corpus.ids().map(str::to_string).collect(),
            space,
            clusters,
            topics,
        })
    }

    pub fn to_cbor_writer<W: Write>(&self, writer: W) -> Result<()> {
        to_cbor_writer(self, writer)
    }

    pub fn from_cbor_reader<R: Read>(reader: R) -> Result<Self> {
        from_cbor_reader(reader)
    }
}
