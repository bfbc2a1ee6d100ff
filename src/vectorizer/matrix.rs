use num::Num;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::utils::math::{DenseMatrix, ZeroSpVec};

/// Sparse document-term weight matrix.
/// One row per document, one column per vocabulary term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTermMatrix<N>
where
    N: Num + Copy,
{
    rows: Vec<ZeroSpVec<N>>,
    n_cols: usize,
}

impl<N> DocumentTermMatrix<N>
where
    N: Num + Copy,
{
    /// Wrap sparse rows.
    /// Every row must have logical length `n_cols`.
    pub fn from_rows(rows: Vec<ZeroSpVec<N>>, n_cols: usize) -> Result<Self> {
        if let Some(bad) = rows.iter().position(|r| r.len() != n_cols) {
            return Err(AnalysisError::invalid(
                "row length",
                format!("row {bad} has {} columns", rows[bad].len()),
                "every row must match the column count",
            ));
        }
        Ok(Self { rows, n_cols })
    }

    /// Build from dense rows; zeros are not stored.
    pub fn from_dense(rows: Vec<Vec<N>>) -> Result<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        Self::from_rows(rows.into_iter().map(ZeroSpVec::from).collect(), n_cols)
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(ZeroSpVec::nnz).sum()
    }

    #[inline]
    pub fn row(&self, row: usize) -> &ZeroSpVec<N> {
        &self.rows[row]
    }

    #[inline]
    pub fn rows(&self) -> &[ZeroSpVec<N>] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<N> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

impl<N> DocumentTermMatrix<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Fails with `NegativeInput` on the first negative entry.
    pub fn check_non_negative(&self) -> Result<()> {
        for (row, vec) in self.rows.iter().enumerate() {
            if let Some((col, value)) = vec
                .iter()
                .map(|(c, v)| (c, v.into()))
                .find(|(_, v): &(usize, f64)| *v < 0.0 || v.is_nan())
            {
                return Err(AnalysisError::NegativeInput { row, col, value });
            }
        }
        Ok(())
    }

    /// ||x_i||^2 for every row
    pub fn row_norms_sq(&self) -> Vec<f64> {
        self.rows.iter().map(ZeroSpVec::norm_sq).collect()
    }

    /// sum of all entries
    pub fn sum(&self) -> f64 {
        self.rows
            .iter()
            .flat_map(|r| r.values().iter().map(|&v| v.into()))
            .sum()
    }

    pub fn to_dense(&self) -> DenseMatrix {
        let mut dense = DenseMatrix::zeros(self.n_rows(), self.n_cols);
        for (i, row) in self.rows.iter().enumerate() {
            for (j, v) in row.iter() {
                dense.set(i, j, v.into());
            }
        }
        dense
    }
}
