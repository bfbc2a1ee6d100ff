pub mod math;

use num::Num;
use serde::{Deserialize, Serialize};

use crate::utils::sort::radix_sort_u32_soa;

/// ZeroSpVec is a sparse vector where zero is the implicit element.
/// It holds `inds` and `vals`:
/// `inds` keeps the logical index of each stored element,
/// `vals` keeps its value.
///
/// Stored elements are guaranteed to be sorted by ascending index
/// and never equal to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroSpVec<N>
where
    N: Num + Copy,
{
    inds: Vec<u32>,
    vals: Vec<N>,
    len: usize,
}

impl<N> ZeroSpVec<N>
where
    N: Num + Copy,
{
    #[inline]
    pub fn new() -> Self {
        ZeroSpVec {
            inds: Vec::new(),
            vals: Vec::new(),
            len: 0,
        }
    }

    /// empty vector of logical length `len` with room for `nnz` stored elements
    #[inline]
    pub fn with_capacity(len: usize, nnz: usize) -> Self {
        ZeroSpVec {
            inds: Vec::with_capacity(nnz),
            vals: Vec::with_capacity(nnz),
            len,
        }
    }

    /// Build from unordered `(index, value)` pairs.
    /// Zero values are dropped, duplicate indices are summed.
    ///
    /// # Panics
    /// Debug builds panic when an index is `>= len`.
    pub fn from_pairs(len: usize, pairs: impl IntoIterator<Item = (usize, N)>) -> Self
    where
        N: Default,
    {
        let (mut inds, mut vals): (Vec<u32>, Vec<N>) = pairs
            .into_iter()
            .map(|(i, v)| {
                debug_assert!(i < len, "index {i} out of bounds for length {len}");
                (i as u32, v)
            })
            .unzip();
        radix_sort_u32_soa(&mut inds, &mut vals);

        let mut out = ZeroSpVec::with_capacity(len, inds.len());
        for (i, v) in inds.into_iter().zip(vals) {
            if out.inds.last() == Some(&i) {
                if let Some(acc) = out.vals.last_mut() {
                    *acc = *acc + v;
                }
                continue;
            }
            out.inds.push(i);
            out.vals.push(v);
        }
        out.drop_zeros();
        out
    }

    fn drop_zeros(&mut self) {
        if self.vals.iter().all(|v| *v != N::zero()) {
            return;
        }
        let (inds, vals): (Vec<u32>, Vec<N>) = self
            .inds
            .iter()
            .copied()
            .zip(self.vals.iter().copied())
            .filter(|(_, v)| *v != N::zero())
            .unzip();
        self.inds = inds;
        self.vals = vals;
    }

    #[inline]
    fn shrink_to_fit(&mut self) {
        self.inds.shrink_to_fit();
        self.vals.shrink_to_fit();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// logical length (number of dimensions)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// number of stored (non-zero) elements
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    /// Append one dimension, storing `elem` only when it is non-zero.
    #[inline]
    pub fn push(&mut self, elem: N) {
        if elem != N::zero() {
            self.inds.push(self.len as u32);
            self.vals.push(elem);
        }
        self.len += 1;
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<N> {
        if index >= self.len {
            return None;
        }
        match self.inds.binary_search(&(index as u32)) {
            Ok(pos) => Some(self.vals[pos]),
            Err(_) => Some(N::zero()),
        }
    }

    /// Iterate over stored elements as `(index, value)`.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, N)> + '_ {
        self.inds.iter().map(|&i| i as usize).zip(self.vals.iter().copied())
    }

    #[inline]
    pub fn values(&self) -> &[N] {
        &self.vals
    }

    /// Dense copy widened to `f64`.
    pub fn to_dense(&self) -> Vec<f64>
    where
        N: Into<f64>,
    {
        let mut dense = vec![0.0; self.len];
        for (i, v) in self.iter() {
            dense[i] = v.into();
        }
        dense
    }
}

impl<N> Default for ZeroSpVec<N>
where
    N: Num + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> From<Vec<N>> for ZeroSpVec<N>
where
    N: Num + Copy,
{
    fn from(dense: Vec<N>) -> Self {
        let mut vec = ZeroSpVec::with_capacity(0, dense.len());
        for v in dense {
            vec.push(v);
        }
        vec.shrink_to_fit();
        vec
    }
}
