use num::Float;
use serde::{Deserialize, Serialize};

use crate::utils::math::ZeroSpVec;
use crate::vectorizer::{corpus::DocumentFrequency, term::TermFrequency, vocabulary::Vocabulary};

/// Per-row normalization applied after TF-IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    /// Σ|w| = 1
    L1,
    /// Σw² = 1, makes dot products cosine similarities
    #[default]
    L2,
    /// raw weights
    None,
}

/// Options shared by every engine when building a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightOptions {
    pub norm: Norm,
    /// use `1 + ln(tf)` instead of the raw count
    pub sublinear_tf: bool,
}

/// TF-IDF calculation engine.
/// Implementors decide the IDF formula; row building, TF scaling and
/// normalization are shared.
pub trait TFIDFEngine<N>
where
    N: Float,
{
    /// IDF value per vocabulary column
    fn idf_vec(stats: &DocumentFrequency, vocabulary: &Vocabulary) -> Vec<f64>;

    /// Weighted and normalized row for one document.
    /// Terms outside the vocabulary are ignored.
    fn tf_idf_vec(
        freq: &TermFrequency,
        vocabulary: &Vocabulary,
        idf: &[f64],
        options: &WeightOptions,
    ) -> ZeroSpVec<N>
    where
        N: Default,
    {
        let mut weights: Vec<(usize, f64)> = freq
            .iter()
            .filter_map(|(term, count)| {
                let col = vocabulary.index_of(term)?;
                let tf = if options.sublinear_tf {
                    1.0 + (count as f64).ln()
                } else {
                    count as f64
                };
                Some((col, tf * idf[col]))
            })
            .collect();

        let scale = match options.norm {
            Norm::L1 => weights.iter().map(|(_, w)| w.abs()).sum::<f64>(),
            Norm::L2 => weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
            Norm::None => 1.0,
        };
        if scale > 0.0 && scale != 1.0 {
            weights.iter_mut().for_each(|(_, w)| *w /= scale);
        }

        ZeroSpVec::from_pairs(
            vocabulary.len(),
            weights
                .into_iter()
                .map(|(col, w)| (col, num::cast::<f64, N>(w).unwrap_or_else(N::zero))),
        )
    }
}

/// Default engine.
/// Smoothed IDF: `ln((1 + n) / (1 + df)) + 1`, as if one extra document
/// contained every term once. A term present in every document keeps weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl<N> TFIDFEngine<N> for DefaultTFIDFEngine
where
    N: Float,
{
    fn idf_vec(stats: &DocumentFrequency, vocabulary: &Vocabulary) -> Vec<f64> {
        let doc_num = stats.doc_num() as f64;
        vocabulary
            .iter()
            .map(|term| {
                let df = stats.doc_count(term) as f64;
                ((1.0 + doc_num) / (1.0 + df)).ln() + 1.0
            })
            .collect()
    }
}

/// Textbook engine.
/// IDF: `ln(n / df)`; a term present in every document gets weight 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTFIDFEngine;

impl<N> TFIDFEngine<N> for PlainTFIDFEngine
where
    N: Float,
{
    fn idf_vec(stats: &DocumentFrequency, vocabulary: &Vocabulary) -> Vec<f64> {
        let doc_num = stats.doc_num() as f64;
        vocabulary
            .iter()
            .map(|term| {
                // vocabulary terms always occur at least once
                let df = stats.doc_count(term).max(1) as f64;
                (doc_num / df).ln()
            })
            .collect()
    }
}
