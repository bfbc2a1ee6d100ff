use serde::{Deserialize, Serialize};

/// Row-major dense `f64` matrix.
/// Used for centroids and the NMF factors, which are dense by nature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from equally sized rows.
    /// Returns `None` when the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n = rows.len();
        Some(Self {
            rows: n,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Mutable row chunks, for `rayon::par_chunks_mut` style updates.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// self · other
    pub fn matmul(&self, other: &DenseMatrix) -> DenseMatrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut out = DenseMatrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let out_row = &mut out.data[i * other.cols..(i + 1) * other.cols];
            for (k, &a) in self.row(i).iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                for (o, &b) in out_row.iter_mut().zip(other.row(k)) {
                    *o += a * b;
                }
            }
        }
        out
    }

    /// selfᵀ · self, the Gram matrix of the columns
    pub fn gram_columns(&self) -> DenseMatrix {
        let mut out = DenseMatrix::zeros(self.cols, self.cols);
        for row in self.rows() {
            for (a, &ra) in row.iter().enumerate() {
                if ra == 0.0 {
                    continue;
                }
                for (b, &rb) in row.iter().enumerate() {
                    out.data[a * self.cols + b] += ra * rb;
                }
            }
        }
        out
    }

    /// self · selfᵀ, the Gram matrix of the rows
    pub fn gram_rows(&self) -> DenseMatrix {
        let mut out = DenseMatrix::zeros(self.rows, self.rows);
        for a in 0..self.rows {
            for b in a..self.rows {
                let v: f64 = self.row(a).iter().zip(self.row(b)).map(|(x, y)| x * y).sum();
                out.data[a * self.rows + b] = v;
                out.data[b * self.rows + a] = v;
            }
        }
        out
    }
}
