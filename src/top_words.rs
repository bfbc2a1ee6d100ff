//! Ranked representative words for weight vectors over a vocabulary.
//!
//! Used for cluster centroids and for topic-word rows alike.

/// Indices of the `n` largest weights, largest first.
/// Equal weights keep ascending index order.
/// `n` larger than the vector returns every index.
pub fn top_indices(weights: &[f64], n: usize) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..weights.len()).collect();
    idxs.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]).then_with(|| a.cmp(&b)));
    idxs.truncate(n);
    idxs
}

/// Top `n` words of one weight vector, with their weights.
/// Only the first `min(weights.len(), feature_names.len())` positions are
/// ranked; weights without a name, and names without a weight, are ignored.
pub fn ranked_words<S>(weights: &[f64], feature_names: &[S], n: usize) -> Vec<(String, f64)>
where
    S: AsRef<str>,
{
    let named = &weights[..weights.len().min(feature_names.len())];
    top_indices(named, n)
        .into_iter()
        .map(|i| (feature_names[i].as_ref().to_string(), named[i]))
        .collect()
}

/// Top `n` words for each vector in `vectors`.
///
/// # Examples
/// ```
/// use trail_topics::top_words::top_words;
///
/// let rows = vec![vec![0.9, 0.1, 0.05, 0.05]];
/// let words = top_words(rows.iter().map(Vec::as_slice), &["a", "b", "c", "d"], 2);
/// assert_eq!(words, vec![vec!["a".to_string(), "b".to_string()]]);
/// ```
pub fn top_words<'a, I, S>(vectors: I, feature_names: &[S], n: usize) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a [f64]>,
    S: AsRef<str>,
{
    vectors
        .into_iter()
        .map(|weights| {
            ranked_words(weights, feature_names, n)
                .into_iter()
                .map(|(word, _)| word)
                .collect()
        })
        .collect()
}
