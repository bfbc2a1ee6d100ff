pub mod nmf;

use num::Float;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::top_words::{ranked_words, top_words};
use crate::utils::datastruct::bit_map::BitMatrix;
use crate::utils::math::DenseMatrix;
use crate::vectorizer::{vocabulary::Vocabulary, TermSpace};

pub use nmf::{Nmf, NmfConfig, NmfFit, NmfProjection};

/// Soft, multi-label topic assignment of a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    /// H: topics × V topic-word weights
    pub components: DenseMatrix,
    /// W: documents × topics weights
    pub doc_topic: DenseMatrix,
    /// W′: each W row divided by its sum; all-zero rows stay all-zero
    pub doc_topic_share: DenseMatrix,
    /// bit (d, t) set when `W′[d, t] >= threshold`
    pub membership: BitMatrix,
    pub threshold: f64,
    pub reconstruction_err: f64,
    pub n_iter: usize,
    pub converged: bool,
    /// highest-weight words per topic
    pub top_words: Vec<Vec<String>>,
}

impl TopicModel {
    /// Factorize the weight matrix of `space` and label every document.
    /// `converged` is false when either the factorization or the projection hit `max_iter`.
    pub fn fit<N>(space: &TermSpace<N>, config: &NmfConfig) -> Result<Self>
    where
        N: Float + Into<f64> + Send + Sync,
    {
        let nmf = Nmf::new(config.clone());
        let fit = nmf.fit(&space.matrix)?;
        let projection = nmf.transform(&space.matrix, &fit.components)?;
        let doc_topic = projection.doc_topic;
        let doc_topic_share = topic_shares(&doc_topic);
        let membership = membership(&doc_topic_share, config.threshold);
        let top_words = top_words(fit.components.rows(), &space.feature_names(), config.n_top_words);

        Ok(Self {
            components: fit.components,
            doc_topic,
            doc_topic_share,
            membership,
            threshold: config.threshold,
            reconstruction_err: fit.reconstruction_err,
            n_iter: fit.n_iter,
            converged: fit.converged && projection.converged,
            top_words,
        })
    }

    #[inline]
    pub fn n_topics(&self) -> usize {
        self.components.n_rows()
    }

    /// topics document `doc` belongs to, ascending
    pub fn topics_of(&self, doc: usize) -> Vec<usize> {
        self.membership.row_ones(doc)
    }

    /// documents belonging to `topic`, ascending
    pub fn documents_of(&self, topic: usize) -> Vec<usize> {
        self.membership.col_ones(topic)
    }

    /// Topic row normalized to sum to 1, paired with its words, heaviest first.
    pub fn word_distribution(&self, topic: usize, vocabulary: &Vocabulary) -> Vec<(String, f64)> {
        let row = self.components.row(topic);
        let total: f64 = row.iter().sum();
        let shares: Vec<f64> = if total > 0.0 {
            row.iter().map(|v| v / total).collect()
        } else {
            row.to_vec()
        };
        ranked_words(&shares, &vocabulary.feature_names(), shares.len())
    }
}

/// W′: every row of `w` divided by its sum.
pub fn topic_shares(w: &DenseMatrix) -> DenseMatrix {
    let mut shares = w.clone();
    for r in 0..shares.n_rows() {
        let row = shares.row_mut(r);
        let total: f64 = row.iter().sum();
        if total > 0.0 {
            row.iter_mut().for_each(|v| *v /= total);
        }
    }
    shares
}

/// Membership bits `shares[d, t] >= threshold`.
/// A document whose weights are all zero has no attributable topic at any threshold.
pub fn membership(shares: &DenseMatrix, threshold: f64) -> BitMatrix {
    let mut bits = BitMatrix::new(shares.n_rows(), shares.n_cols());
    for (d, row) in shares.rows().enumerate() {
        if row.iter().sum::<f64>() <= 0.0 {
            continue;
        }
        for (t, &share) in row.iter().enumerate() {
            if share >= threshold {
                bits.set(d, t, true);
            }
        }
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::{corpus::Corpus, token::StopWords, TFIDFVectorizer, VectorizerConfig};

    #[test]
    fn shares_sum_to_one_or_stay_zero() {
        let w = DenseMatrix::from_rows(vec![vec![0.2, 0.6, 0.2], vec![0.0, 0.0, 0.0], vec![3.0, 1.0, 0.0]]).unwrap();
        let shares = topic_shares(&w);
        assert!((shares.row(0).iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(shares.row(1), &[0.0, 0.0, 0.0]);
        assert_eq!(shares.row(2), &[0.75, 0.25, 0.0]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let shares = DenseMatrix::from_rows(vec![vec![0.1, 0.9], vec![0.09, 0.91]]).unwrap();
        let bits = membership(&shares, 0.1);
        assert!(bits.get(0, 0));
        assert!(!bits.get(1, 0));
        assert_eq!(bits.col_ones(1), vec![0, 1]);
    }

    #[test]
    fn zero_weight_document_belongs_to_no_topic() {
        let w = DenseMatrix::from_rows(vec![vec![0.0, 0.0], vec![1.0, 3.0]]).unwrap();
        let bits = membership(&topic_shares(&w), 0.0);
        assert!(bits.row_ones(0).is_empty());
        assert_eq!(bits.row_ones(1), vec![0, 1]);
        assert_eq!(bits.col_ones(0), vec![1]);
    }

    #[test]
    fn threshold_zero_includes_every_pair() {
        let shares = DenseMatrix::from_rows(vec![vec![0.0, 1.0], vec![0.5, 0.5]]).unwrap();
        assert_eq!(membership(&shares, 0.0).count_ones(), 4);
    }

    #[test]
    fn capped_run_is_flagged_on_the_model() {
        let corpus = Corpus::from_texts(["creek canyon waterfall", "summit ridge view", "creek summit"]);
        let v: TFIDFVectorizer = TFIDFVectorizer::new(VectorizerConfig::default(), StopWords::new());
        let space = v.fit_transform(&corpus).unwrap();
        let config = NmfConfig {
            max_iter: 4,
            ..NmfConfig::new(2).with_seed(2)
        };
        let model = TopicModel::fit(&space, &config).unwrap();
        assert!(!model.converged);
        assert_eq!(model.n_iter, 4);
        assert_eq!(model.doc_topic.n_rows(), 3);
    }

    #[test]
    fn topic_model_over_trail_corpus() {
        let corpus = Corpus::from_texts([
            "waterfall creek waterfall canyon",
            "creek canyon waterfall",
            "summit ridge summit view",
            "ridge view summit",
            "creek summit view",
        ]);
        let v: TFIDFVectorizer = TFIDFVectorizer::new(VectorizerConfig::default(), StopWords::new());
        let space = v.fit_transform(&corpus).unwrap();
        let config = NmfConfig {
            n_top_words: 3,
            ..NmfConfig::new(2).with_seed(17)
        };
        let model = TopicModel::fit(&space, &config).unwrap();

        assert_eq!(model.n_topics(), 2);
        assert_eq!((model.doc_topic.n_rows(), model.doc_topic.n_cols()), (5, 2));
        assert!(model.components.as_slice().iter().all(|&v| v >= 0.0));
        assert!(model.doc_topic.as_slice().iter().all(|&v| v >= 0.0));
        for d in 0..5 {
            let sum: f64 = model.doc_topic_share.row(d).iter().sum();
            assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-6);
            for t in 0..2 {
                let member = model.doc_topic_share.get(d, t) >= model.threshold;
                assert_eq!(model.membership.get(d, t), member);
                assert_eq!(model.topics_of(d).contains(&t), member);
                assert_eq!(model.documents_of(t).contains(&d), member);
            }
        }
        assert!(model.top_words.iter().all(|w| w.len() == 3));

        let dist = model.word_distribution(0, &space.vocabulary);
        assert_eq!(dist.len(), space.vocabulary.len());
        let total: f64 = dist.iter().map(|(_, p)| p).sum();
        assert!(total == 0.0 || (total - 1.0).abs() < 1e-9);
        assert!(dist.windows(2).all(|p| p[0].1 >= p[1].1));
    }
}
