use num::Num;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};
use crate::utils::math::{vector::math::dense_norm_sq, DenseMatrix, ZeroSpVec};
use crate::vectorizer::matrix::DocumentTermMatrix;

fn default_max_iter() -> usize {
    300
}

fn default_n_init() -> usize {
    10
}

fn default_n_top_words() -> usize {
    10
}

/// k-means settings.
/// `n_clusters` has no default; everything else does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KMeansConfig {
    pub n_clusters: usize,
    /// Lloyd iteration cap per restart
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// independent k-means++ restarts; the lowest inertia wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,
    /// `None` seeds from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_n_top_words")]
    pub n_top_words: usize,
}

impl KMeansConfig {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: default_max_iter(),
            n_init: default_n_init(),
            seed: None,
            n_top_words: default_n_top_words(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the settings against a corpus of `n_docs` documents.
    pub fn validate(&self, n_docs: usize) -> Result<()> {
        if n_docs == 0 {
            return Err(AnalysisError::EmptyCorpus);
        }
        if self.n_clusters == 0 {
            return Err(AnalysisError::invalid("n_clusters", 0, "must be positive"));
        }
        if self.n_clusters > n_docs {
            return Err(AnalysisError::invalid(
                "n_clusters",
                self.n_clusters,
                "cannot exceed the number of documents",
            ));
        }
        if self.max_iter == 0 {
            return Err(AnalysisError::invalid("max_iter", 0, "must be positive"));
        }
        if self.n_init == 0 {
            return Err(AnalysisError::invalid("n_init", 0, "must be positive"));
        }
        Ok(())
    }
}

/// Result of one k-means fit, before any vocabulary is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansFit {
    /// k × V cluster means
    pub centroids: DenseMatrix,
    /// nearest centroid per document
    pub labels: Vec<usize>,
    /// Σ squared distance of each document to its centroid
    pub inertia: f64,
    pub n_iter: usize,
    pub converged: bool,
}

/// K-means (Lloyd) with k-means++ seeding over a sparse document-term matrix.
///
/// # Examples
/// ```
/// use trail_topics::cluster::kmeans::{KMeans, KMeansConfig};
/// use trail_topics::vectorizer::matrix::DocumentTermMatrix;
///
/// let x = DocumentTermMatrix::from_dense(vec![
///     vec![1.0, 0.0],
///     vec![0.9, 0.1],
///     vec![0.0, 1.0],
/// ]).unwrap();
/// let fit = KMeans::new(KMeansConfig::new(2).with_seed(7)).fit(&x).unwrap();
/// assert_eq!(fit.labels[0], fit.labels[1]);
/// assert_ne!(fit.labels[0], fit.labels[2]);
/// ```
#[derive(Debug, Clone)]
pub struct KMeans {
    pub config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    /// Run `n_init` restarts in parallel and keep the lowest inertia.
    /// Equal inertia keeps the earliest restart, so a fixed seed gives a fixed result.
    pub fn fit<N>(&self, x: &DocumentTermMatrix<N>) -> Result<KMeansFit>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        self.config.validate(x.n_rows())?;

        let mut master = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seeds: Vec<u64> = (0..self.config.n_init).map(|_| master.gen()).collect();
        let row_norms = x.row_norms_sq();

        let mut runs: Vec<KMeansFit> = seeds
            .par_iter()
            .map(|&seed| self.run_once(x, &row_norms, seed))
            .collect();

        // validate() guarantees n_init >= 1, so `runs` is never empty
        let mut best = 0;
        for (run, fit) in runs.iter().enumerate().skip(1) {
            if fit.inertia < runs[best].inertia {
                best = run;
            }
        }
        debug!(run = best, inertia = runs[best].inertia, "Selected best k-means restart");
        let best = runs.swap_remove(best);

        if !best.converged {
            warn!(
                max_iter = self.config.max_iter,
                inertia = best.inertia,
                "k-means did not converge; labels are nearest to the final centroids"
            );
        }
        info!(
            clusters = self.config.n_clusters,
            documents = x.n_rows(),
            inertia = best.inertia,
            n_iter = best.n_iter,
            "Clustered documents"
        );
        Ok(best)
    }

    fn run_once<N>(&self, x: &DocumentTermMatrix<N>, row_norms: &[f64], seed: u64) -> KMeansFit
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        let mut rng = StdRng::seed_from_u64(seed);
        let centroids = kmeans_plus_plus(x, row_norms, self.config.n_clusters, &mut rng);
        let fit = lloyd(x, row_norms, centroids, self.config.max_iter);
        debug!(seed, n_iter = fit.n_iter, converged = fit.converged, inertia = fit.inertia, "k-means restart finished");
        fit
    }
}

/// Lloyd iterations from `centroids` until the labels stop changing or
/// `max_iter` updates have run. Labels always match the returned centroids.
fn lloyd<N>(x: &DocumentTermMatrix<N>, row_norms: &[f64], mut centroids: DenseMatrix, max_iter: usize) -> KMeansFit
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let mut labels = assign_with_norms(x, row_norms, &centroids);
    let mut converged = false;
    let mut n_iter = 0;

    while n_iter < max_iter {
        n_iter += 1;
        recompute_centroids(x, &labels, &mut centroids);
        let next = assign_with_norms(x, row_norms, &centroids);
        if next == labels {
            converged = true;
            break;
        }
        labels = next;
    }

    let inertia = inertia_with_norms(x, row_norms, &labels, &centroids);
    KMeansFit {
        centroids,
        labels,
        inertia,
        n_iter,
        converged,
    }
}

/// k-means++ seeding: each next center is drawn with probability
/// proportional to its squared distance from the nearest chosen center.
fn kmeans_plus_plus<N>(
    x: &DocumentTermMatrix<N>,
    row_norms: &[f64],
    k: usize,
    rng: &mut StdRng,
) -> DenseMatrix
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let n = x.n_rows();
    let mut centroids = DenseMatrix::zeros(k, x.n_cols());
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).copy_from_slice(&x.row(first).to_dense());

    let mut closest: Vec<f64> = distances_to(x, row_norms, centroids.row(0));
    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            closest
                .iter()
                .position(|&d| {
                    acc += d;
                    acc > target
                })
                .or_else(|| closest.iter().rposition(|&d| d > 0.0))
                .unwrap_or(0)
        } else {
            // every document coincides with a chosen center
            rng.gen_range(0..n)
        };
        centroids.row_mut(c).copy_from_slice(&x.row(pick).to_dense());

        let fresh = distances_to(x, row_norms, centroids.row(c));
        closest
            .iter_mut()
            .zip(fresh)
            .for_each(|(old, new)| *old = old.min(new));
    }
    centroids
}

fn distances_to<N>(x: &DocumentTermMatrix<N>, row_norms: &[f64], center: &[f64]) -> Vec<f64>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let center_norm = dense_norm_sq(center);
    x.rows()
        .par_iter()
        .zip(row_norms.par_iter())
        .map(|(row, &norm)| row.squared_distance_dense(norm, center, center_norm))
        .collect()
}

/// (cluster, squared distance) of the nearest centroid; ties go to the lowest index
#[inline]
fn nearest<N>(row: &ZeroSpVec<N>, row_norm: f64, centroids: &DenseMatrix, centroid_norms: &[f64]) -> (usize, f64)
where
    N: Num + Copy + Into<f64>,
{
    let mut best = (0, f64::INFINITY);
    for (c, (center, &c_norm)) in centroids.rows().zip(centroid_norms).enumerate() {
        let d = row.squared_distance_dense(row_norm, center, c_norm);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn centroid_norms(centroids: &DenseMatrix) -> Vec<f64> {
    centroids.rows().map(dense_norm_sq).collect()
}

fn assign_with_norms<N>(x: &DocumentTermMatrix<N>, row_norms: &[f64], centroids: &DenseMatrix) -> Vec<usize>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let c_norms = centroid_norms(centroids);
    x.rows()
        .par_iter()
        .zip(row_norms.par_iter())
        .map(|(row, &norm)| nearest(row, norm, centroids, &c_norms).0)
        .collect()
}

fn inertia_with_norms<N>(
    x: &DocumentTermMatrix<N>,
    row_norms: &[f64],
    labels: &[usize],
    centroids: &DenseMatrix,
) -> f64
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let c_norms = centroid_norms(centroids);
    // summed in row order so equal seeds give bit-identical inertia
    let dists: Vec<f64> = x
        .rows()
        .par_iter()
        .zip(row_norms.par_iter())
        .zip(labels.par_iter())
        .map(|((row, &norm), &label)| row.squared_distance_dense(norm, centroids.row(label), c_norms[label]))
        .collect();
    dists.iter().sum()
}

/// Label of the nearest centroid for every row of `x`.
pub fn assign_labels<N>(x: &DocumentTermMatrix<N>, centroids: &DenseMatrix) -> Vec<usize>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    assign_with_norms(x, &x.row_norms_sq(), centroids)
}

/// Replace every centroid with the mean of its members.
/// A cluster without members keeps its previous centroid.
pub fn recompute_centroids<N>(x: &DocumentTermMatrix<N>, labels: &[usize], centroids: &mut DenseMatrix)
where
    N: Num + Copy + Into<f64>,
{
    let k = centroids.n_rows();
    let mut sums = DenseMatrix::zeros(k, x.n_cols());
    let mut counts = vec![0usize; k];
    for (row, &label) in x.rows().iter().zip(labels) {
        counts[label] += 1;
        let acc = sums.row_mut(label);
        for (col, v) in row.iter() {
            acc[col] += v.into();
        }
    }
    for (c, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let inv = 1.0 / count as f64;
        for (dst, &s) in centroids.row_mut(c).iter_mut().zip(sums.row(c)) {
            *dst = s * inv;
        }
    }
}

/// Σ squared distance of each row to the centroid named by its label.
pub fn inertia<N>(x: &DocumentTermMatrix<N>, labels: &[usize], centroids: &DenseMatrix) -> f64
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    inertia_with_norms(x, &x.row_norms_sq(), labels, centroids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> DocumentTermMatrix<f64> {
        DocumentTermMatrix::from_dense(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0],
            vec![0.95, 0.0, 0.05],
            vec![0.0, 0.1, 0.9],
            vec![0.0, 0.0, 1.0],
            vec![0.05, 0.0, 0.95],
        ])
        .unwrap()
    }

    fn brute_force_nearest(x: &DocumentTermMatrix<f64>, centroids: &DenseMatrix) -> Vec<usize> {
        (0..x.n_rows())
            .map(|i| {
                let dense = x.row(i).to_dense();
                let dist = |c: usize| -> f64 {
                    dense
                        .iter()
                        .zip(centroids.row(c))
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum()
                };
                (0..centroids.n_rows())
                    .min_by(|&a, &b| dist(a).total_cmp(&dist(b)))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn separates_obvious_groups() {
        let fit = KMeans::new(KMeansConfig::new(2).with_seed(42)).fit(&blobs()).unwrap();
        assert!(fit.converged);
        assert_eq!(fit.labels.len(), 6);
        assert!(fit.labels[..3].iter().all(|&l| l == fit.labels[0]));
        assert!(fit.labels[3..].iter().all(|&l| l == fit.labels[3]));
        assert_ne!(fit.labels[0], fit.labels[3]);
    }

    #[test]
    fn labels_are_in_range_and_nearest() {
        let x = blobs();
        for k in 1..=4 {
            let fit = KMeans::new(KMeansConfig::new(k).with_seed(k as u64)).fit(&x).unwrap();
            assert!(fit.labels.iter().all(|&l| l < k));
            assert_eq!(fit.labels, brute_force_nearest(&x, &fit.centroids));
        }
    }

    #[test]
    fn centroids_stay_non_negative() {
        let fit = KMeans::new(KMeansConfig::new(3).with_seed(3)).fit(&blobs()).unwrap();
        assert!(fit.centroids.as_slice().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn recompute_never_increases_inertia() {
        let x = blobs();
        let mut centroids =
            DenseMatrix::from_rows(vec![vec![0.5, 0.5, 0.0], vec![0.0, 0.5, 0.5], vec![0.3, 0.3, 0.3]]).unwrap();
        let labels = assign_labels(&x, &centroids);
        let before = inertia(&x, &labels, &centroids);
        recompute_centroids(&x, &labels, &mut centroids);
        let after = inertia(&x, &labels, &centroids);
        assert!(after <= before + 1e-12, "{after} > {before}");
    }

    #[test]
    fn empty_cluster_keeps_its_centroid() {
        let x = blobs();
        let far = vec![10.0, 10.0, 10.0];
        let mut centroids = DenseMatrix::from_rows(vec![vec![1.0, 0.0, 0.0], far.clone()]).unwrap();
        let labels = assign_labels(&x, &centroids);
        assert!(labels.iter().all(|&l| l == 0));
        recompute_centroids(&x, &labels, &mut centroids);
        assert_eq!(centroids.row(1), far.as_slice());
    }

    #[test]
    fn distance_ties_pick_lowest_cluster() {
        let x = DocumentTermMatrix::from_dense(vec![vec![0.5, 0.5]]).unwrap();
        let centroids = DenseMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(assign_labels(&x, &centroids), vec![0]);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let x = blobs();
        let config = KMeansConfig::new(3).with_seed(11);
        let a = KMeans::new(config.clone()).fit(&x).unwrap();
        let b = KMeans::new(config).fit(&x).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn k_equal_to_documents_has_zero_inertia() {
        let x = blobs();
        let fit = KMeans::new(KMeansConfig::new(6).with_seed(5)).fit(&x).unwrap();
        assert!(fit.inertia < 1e-12);
    }

    #[test]
    fn iteration_cap_is_reported() {
        // points 0..9 on a line, seeded at 0 and 1: one update moves the
        // second centroid to 5, which relabels 1 and 2
        let x = DocumentTermMatrix::from_dense((0..10).map(|i| vec![i as f64]).collect()).unwrap();
        let row_norms = x.row_norms_sq();
        let init = DenseMatrix::from_rows(vec![vec![0.0], vec![1.0]]).unwrap();

        let capped = lloyd(&x, &row_norms, init.clone(), 1);
        assert!(!capped.converged);
        assert_eq!(capped.n_iter, 1);
        assert_eq!(capped.centroids.row(1), &[5.0]);
        assert_eq!(capped.labels, brute_force_nearest(&x, &capped.centroids));
        assert_eq!(&capped.labels[..4], &[0, 0, 0, 1]);

        let full = lloyd(&x, &row_norms, init, 300);
        assert!(full.converged);
        assert!(full.n_iter > 1);
        assert!(full.inertia < capped.inertia);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let x = blobs();
        let too_many = KMeans::new(KMeansConfig::new(7)).fit(&x).unwrap_err();
        assert!(matches!(too_many, AnalysisError::InvalidParameter { param: "n_clusters", .. }));
        let zero = KMeans::new(KMeansConfig::new(0)).fit(&x).unwrap_err();
        assert!(matches!(zero, AnalysisError::InvalidParameter { param: "n_clusters", .. }));

        let mut config = KMeansConfig::new(2);
        config.n_init = 0;
        assert!(KMeans::new(config).fit(&x).is_err());

        let empty: DocumentTermMatrix<f64> = DocumentTermMatrix::from_rows(Vec::new(), 3).unwrap();
        let err = KMeans::new(KMeansConfig::new(1)).fit(&empty).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyCorpus));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: KMeansConfig = serde_json::from_str(r#"{"n_clusters": 4}"#).unwrap();
        assert_eq!(config, KMeansConfig::new(4));
        assert!(serde_json::from_str::<KMeansConfig>("{}").is_err());
    }
}
