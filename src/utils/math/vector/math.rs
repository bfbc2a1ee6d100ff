use std::cmp::Ordering;

use num::Num;

use super::ZeroSpVec;

impl<N> ZeroSpVec<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Dot product of two sparse vectors.
    /// d(a, b) = Σ(a_i * b_i)
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "Vectors must be of the same length to compute dot product."
        );

        let mut result = 0.0;
        let (self_nnz, other_nnz) = (self.nnz(), other.nnz());
        let mut i = 0;
        let mut j = 0;
        while i < self_nnz && j < other_nnz {
            match self.inds[i].cmp(&other.inds[j]) {
                Ordering::Equal => {
                    result += self.vals[i].into() * other.vals[j].into();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        result
    }

    /// ||a||^2
    #[inline]
    pub fn norm_sq(&self) -> f64 {
        self.values()
            .iter()
            .map(|&v| {
                let v: f64 = v.into();
                v * v
            })
            .sum()
    }

    /// Dot product with a dense vector of the same logical length.
    #[inline]
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        debug_assert_eq!(self.len(), dense.len());
        self.iter().map(|(i, v)| v.into() * dense[i]).sum()
    }

    /// Squared euclidean distance to a dense point.
    /// ||a - c||^2 = ||a||^2 - 2 a·c + ||c||^2
    ///
    /// `self_norm_sq` and `dense_norm_sq` are passed in so callers can cache them.
    /// Rounding can push the expansion slightly below zero; it is clamped.
    #[inline]
    pub fn squared_distance_dense(&self, self_norm_sq: f64, dense: &[f64], dense_norm_sq: f64) -> f64 {
        (self_norm_sq - 2.0 * self.dot_dense(dense) + dense_norm_sq).max(0.0)
    }

    /// Cosine similarity.
    /// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
    /// Zero vectors have similarity 0 with everything.
    #[inline]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        let norm = (self.norm_sq() * other.norm_sq()).sqrt();
        if norm == 0.0 {
            0.0
        } else {
            self.dot(other) / norm
        }
    }
}

/// ||c||^2 for a dense slice
#[inline]
pub fn dense_norm_sq(dense: &[f64]) -> f64 {
    dense.iter().map(|v| v * v).sum()
}
