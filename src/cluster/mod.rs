pub mod kmeans;

use num::Float;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::top_words::top_words;
use crate::utils::math::DenseMatrix;
use crate::vectorizer::{matrix::DocumentTermMatrix, TermSpace};

pub use kmeans::{assign_labels, inertia, recompute_centroids, KMeans, KMeansConfig, KMeansFit};

/// Hard partition of a corpus into `k` clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    /// k × V, each row the mean of its members
    pub centroids: DenseMatrix,
    /// one label in `[0, k)` per document, in corpus order
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub n_iter: usize,
    pub converged: bool,
    /// highest-weight centroid terms per cluster
    pub top_words: Vec<Vec<String>>,
}

impl ClusterModel {
    /// Cluster the documents of a fitted term space.
    pub fn fit<N>(space: &TermSpace<N>, config: &KMeansConfig) -> Result<Self>
    where
        N: Float + Into<f64> + Send + Sync,
    {
        let fit = KMeans::new(config.clone()).fit(&space.matrix)?;
        let top_words = top_words(fit.centroids.rows(), &space.feature_names(), config.n_top_words);
        Ok(Self {
            centroids: fit.centroids,
            labels: fit.labels,
            inertia: fit.inertia,
            n_iter: fit.n_iter,
            converged: fit.converged,
            top_words,
        })
    }

    #[inline]
    pub fn n_clusters(&self) -> usize {
        self.centroids.n_rows()
    }

    /// documents per cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// row indices of the documents in `cluster`
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(row, &label)| (label == cluster).then_some(row))
            .collect()
    }

    /// Nearest cluster for rows vectorized against the same vocabulary.
    pub fn predict<N>(&self, x: &DocumentTermMatrix<N>) -> Vec<usize>
    where
        N: Float + Into<f64> + Send + Sync,
    {
        assign_labels(x, &self.centroids)
    }
}
