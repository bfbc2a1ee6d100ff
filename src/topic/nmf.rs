use num::Num;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};
use crate::utils::math::DenseMatrix;
use crate::vectorizer::matrix::DocumentTermMatrix;

/// floor for multiplicative-update denominators
const EPS: f64 = f64::EPSILON;

/// error is re-measured every this many iterations
const CHECK_EVERY: usize = 10;

fn default_alpha() -> f64 {
    0.1
}

fn default_l1_ratio() -> f64 {
    0.25
}

fn default_max_iter() -> usize {
    200
}

fn default_tol() -> f64 {
    1e-4
}

fn default_threshold() -> f64 {
    0.1
}

fn default_n_top_words() -> usize {
    20
}

/// NMF settings.
/// `n_topics` has no default; everything else does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NmfConfig {
    pub n_topics: usize,
    /// overall regularization strength
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// share of `alpha` spent on the L1 penalty, the rest goes to L2
    #[serde(default = "default_l1_ratio")]
    pub l1_ratio: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// stop when the error improved by less than `tol` (relative to the
    /// initial error) over the last check window
    #[serde(default = "default_tol")]
    pub tol: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    /// minimum normalized share for a document to belong to a topic, inclusive
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_n_top_words")]
    pub n_top_words: usize,
}

impl NmfConfig {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            alpha: default_alpha(),
            l1_ratio: default_l1_ratio(),
            max_iter: default_max_iter(),
            tol: default_tol(),
            seed: None,
            threshold: default_threshold(),
            n_top_words: default_n_top_words(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self, n_docs: usize) -> Result<()> {
        if n_docs == 0 {
            return Err(AnalysisError::EmptyCorpus);
        }
        if self.n_topics == 0 {
            return Err(AnalysisError::invalid("n_topics", 0, "must be positive"));
        }
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) {
            return Err(AnalysisError::invalid("alpha", self.alpha, "must be a finite value >= 0"));
        }
        if !(0.0..=1.0).contains(&self.l1_ratio) {
            return Err(AnalysisError::invalid("l1_ratio", self.l1_ratio, "must lie in [0, 1]"));
        }
        if self.max_iter == 0 {
            return Err(AnalysisError::invalid("max_iter", 0, "must be positive"));
        }
        if !(self.tol >= 0.0 && self.tol.is_finite()) {
            return Err(AnalysisError::invalid("tol", self.tol, "must be a finite value >= 0"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AnalysisError::invalid("threshold", self.threshold, "must lie in [0, 1]"));
        }
        Ok(())
    }

    /// (L1, L2) penalty weights, applied to both factors
    #[inline]
    fn penalties(&self) -> (f64, f64) {
        (self.alpha * self.l1_ratio, self.alpha * (1.0 - self.l1_ratio))
    }
}

/// Topic-word factor learned by [`Nmf::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NmfFit {
    /// topics × V
    pub components: DenseMatrix,
    /// ||X - WH||_F at the end of fitting
    pub reconstruction_err: f64,
    pub n_iter: usize,
    pub converged: bool,
}

/// Document-topic weights from [`Nmf::transform`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NmfProjection {
    /// documents × topics
    pub doc_topic: DenseMatrix,
    pub n_iter: usize,
    pub converged: bool,
}

/// Outcome of one multiplicative-update run.
#[derive(Debug, Clone, Copy)]
struct Progress {
    n_iter: usize,
    converged: bool,
    err: f64,
}

/// Regularized non-negative matrix factorization `X ≈ W·H`,
/// solved with multiplicative updates.
///
/// Objective:
/// `½‖X − WH‖² + α·ρ(‖W‖₁ + ‖H‖₁) + ½·α(1 − ρ)(‖W‖² + ‖H‖²)`
#[derive(Debug, Clone)]
pub struct Nmf {
    pub config: NmfConfig,
}

impl Nmf {
    pub fn new(config: NmfConfig) -> Self {
        Self { config }
    }

    /// Learn the topic-word factor `H` of `x`.
    ///
    /// # Errors
    /// - `EmptyCorpus` for a matrix without rows
    /// - `InvalidParameter` for an invalid config
    /// - `NegativeInput` when `x` holds a negative entry
    pub fn fit<N>(&self, x: &DocumentTermMatrix<N>) -> Result<NmfFit>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        self.config.validate(x.n_rows())?;
        x.check_non_negative()?;

        let k = self.config.n_topics;
        let scale = init_scale(x, k);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut w = random_factor(x.n_rows(), k, scale, &mut rng);
        let mut h = random_factor(k, x.n_cols(), scale, &mut rng);

        let progress = self.iterate(x, &mut w, &mut h, true);
        if !progress.converged {
            warn!(
                max_iter = self.config.max_iter,
                reconstruction_err = progress.err,
                "NMF did not converge"
            );
        }
        info!(
            topics = k,
            documents = x.n_rows(),
            n_iter = progress.n_iter,
            reconstruction_err = progress.err,
            "Fitted topic model"
        );

        Ok(NmfFit {
            components: h,
            reconstruction_err: progress.err,
            n_iter: progress.n_iter,
            converged: progress.converged,
        })
    }

    /// Document-topic weights `W` for `x` with `components` held fixed.
    /// Hitting `max_iter` is reported through `converged` and a warning, not an error.
    pub fn transform<N>(&self, x: &DocumentTermMatrix<N>, components: &DenseMatrix) -> Result<NmfProjection>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        self.config.validate(x.n_rows())?;
        x.check_non_negative()?;
        if components.n_cols() != x.n_cols() || components.n_rows() != self.config.n_topics {
            return Err(AnalysisError::invalid(
                "components",
                format!("{}x{}", components.n_rows(), components.n_cols()),
                "must be n_topics x vocabulary size",
            ));
        }

        let k = self.config.n_topics;
        let mut w = DenseMatrix::zeros(x.n_rows(), k);
        let scale = init_scale(x, k);
        w.as_mut_slice().iter_mut().for_each(|v| *v = scale);

        let mut h = components.clone();
        let progress = self.iterate(x, &mut w, &mut h, false);
        if !progress.converged {
            warn!(
                max_iter = self.config.max_iter,
                reconstruction_err = progress.err,
                "NMF projection did not converge"
            );
        }
        debug!(n_iter = progress.n_iter, converged = progress.converged, "Projected documents onto topics");
        Ok(NmfProjection {
            doc_topic: w,
            n_iter: progress.n_iter,
            converged: progress.converged,
        })
    }

    fn iterate<N>(&self, x: &DocumentTermMatrix<N>, w: &mut DenseMatrix, h: &mut DenseMatrix, update_h: bool) -> Progress
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        let (l1, l2) = self.config.penalties();
        let x_norm_sq: f64 = x.row_norms_sq().iter().sum();
        let err_init = frobenius_error(x, x_norm_sq, w, h);
        if err_init == 0.0 {
            return Progress {
                n_iter: 0,
                converged: true,
                err: 0.0,
            };
        }

        let mut previous = err_init;
        for n_iter in 1..=self.config.max_iter {
            update_w(x, w, h, l1, l2);
            if update_h {
                update_h_factor(x, w, h, l1, l2);
            }

            if n_iter % CHECK_EVERY == 0 {
                let err = frobenius_error(x, x_norm_sq, w, h);
                debug!(n_iter, err, "NMF progress");
                if (previous - err) / err_init < self.config.tol {
                    return Progress {
                        n_iter,
                        converged: true,
                        err,
                    };
                }
                previous = err;
            }
        }

        Progress {
            n_iter: self.config.max_iter,
            converged: false,
            err: frobenius_error(x, x_norm_sq, w, h),
        }
    }
}

/// `sqrt(mean(X) / k)`, the magnitude at which `W·H` matches the mean of `X`
fn init_scale<N>(x: &DocumentTermMatrix<N>, k: usize) -> f64
where
    N: Num + Copy + Into<f64>,
{
    let cells = x.n_rows() * x.n_cols();
    if cells == 0 {
        return 0.0;
    }
    (x.sum() / cells as f64 / k as f64).sqrt()
}

/// Uniform entries in `(0, scale]`; strictly positive so no entry starts stuck at zero.
fn random_factor(rows: usize, cols: usize, scale: f64, rng: &mut StdRng) -> DenseMatrix {
    let mut m = DenseMatrix::zeros(rows, cols);
    m.as_mut_slice()
        .iter_mut()
        .for_each(|v| *v = scale * (1.0 - rng.gen::<f64>()));
    m
}

/// X · Hᵀ, computed row by row in parallel
fn sparse_times_transpose<N>(x: &DocumentTermMatrix<N>, h: &DenseMatrix) -> DenseMatrix
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let k = h.n_rows();
    let mut out = DenseMatrix::zeros(x.n_rows(), k);
    out.as_mut_slice()
        .par_chunks_mut(k)
        .zip(x.rows().par_iter())
        .for_each(|(dst, row)| {
            for (j, v) in row.iter() {
                let v: f64 = v.into();
                for (t, d) in dst.iter_mut().enumerate() {
                    *d += v * h.get(t, j);
                }
            }
        });
    out
}

/// Wᵀ · X
fn transpose_times_sparse<N>(w: &DenseMatrix, x: &DocumentTermMatrix<N>) -> DenseMatrix
where
    N: Num + Copy + Into<f64>,
{
    let k = w.n_cols();
    let mut out = DenseMatrix::zeros(k, x.n_cols());
    for (i, row) in x.rows().iter().enumerate() {
        let wi = w.row(i);
        for (j, v) in row.iter() {
            let v: f64 = v.into();
            for (t, &wt) in wi.iter().enumerate() {
                out.set(t, j, out.get(t, j) + wt * v);
            }
        }
    }
    out
}

/// W ← W ∘ (X·Hᵀ) / (W·H·Hᵀ + l1 + l2·W)
fn update_w<N>(x: &DocumentTermMatrix<N>, w: &mut DenseMatrix, h: &DenseMatrix, l1: f64, l2: f64)
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let numer = sparse_times_transpose(x, h);
    let denom = w.matmul(&h.gram_rows());
    multiplicative_step(w, &numer, &denom, l1, l2);
}

/// H ← H ∘ (Wᵀ·X) / (Wᵀ·W·H + l1 + l2·H)
fn update_h_factor<N>(x: &DocumentTermMatrix<N>, w: &DenseMatrix, h: &mut DenseMatrix, l1: f64, l2: f64)
where
    N: Num + Copy + Into<f64>,
{
    let numer = transpose_times_sparse(w, x);
    let denom = w.gram_columns().matmul(h);
    multiplicative_step(h, &numer, &denom, l1, l2);
}

#[inline]
fn multiplicative_step(factor: &mut DenseMatrix, numer: &DenseMatrix, denom: &DenseMatrix, l1: f64, l2: f64) {
    for ((f, &n), &d) in factor
        .as_mut_slice()
        .iter_mut()
        .zip(numer.as_slice())
        .zip(denom.as_slice())
    {
        let d = (d + l1 + l2 * *f).max(EPS);
        *f *= n / d;
    }
}

/// ||X − W·H||_F without materializing W·H:
/// `||X||² − 2·Σ X_ij (WH)_ij + Σ (WᵀW ∘ HHᵀ)`
pub fn frobenius_error<N>(x: &DocumentTermMatrix<N>, x_norm_sq: f64, w: &DenseMatrix, h: &DenseMatrix) -> f64
where
    N: Num + Copy + Into<f64>,
{
    let cross: f64 = x
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let wi = w.row(i);
            row.iter()
                .map(|(j, v)| {
                    let wh: f64 = wi.iter().enumerate().map(|(t, &wt)| wt * h.get(t, j)).sum();
                    v.into() * wh
                })
                .sum::<f64>()
        })
        .sum();
    let wtw = w.gram_columns();
    let hht = h.gram_rows();
    let model_sq: f64 = wtw.as_slice().iter().zip(hht.as_slice()).map(|(a, b)| a * b).sum();
    (x_norm_sq - 2.0 * cross + model_sq).max(0.0).sqrt()
}
