use num::Float;
use rayon::prelude::*;

use crate::vectorizer::TermSpace;

impl<N> TermSpace<N>
where
    N: Float + Into<f64> + Send + Sync,
{
    /// Cosine similarity between documents `a` and `b`.
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        self.matrix.row(a).cosine_similarity(self.matrix.row(b))
    }

    /// Every document pair `(i, j, cos)` with `i < j` and
    /// `lower < cos < upper`, ordered by `(i, j)`.
    /// Handy for spotting near-duplicate trail descriptions.
    pub fn similar_pairs(&self, lower: f64, upper: f64) -> Vec<(usize, usize, f64)> {
        let rows = self.matrix.rows();
        (0..rows.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..rows.len()).filter_map(move |j| {
                    let cos = rows[i].cosine_similarity(&rows[j]);
                    (cos > lower && cos < upper).then_some((i, j, cos))
                })
            })
            .collect()
    }
}
