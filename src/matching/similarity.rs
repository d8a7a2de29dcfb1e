//! Default cross-entity similarity function: Jaccard overlap on
//! whitespace-split tokens of raw content.

use std::collections::HashSet;

/// Jaccard similarity between the whitespace-split token sets of `a` and
/// `b`, in `[0.0, 1.0]`. Two empty token sets are considered identical
/// (similarity `1.0`) to avoid a spurious `0/0` division.
pub fn jaccard_token_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// A pluggable similarity function, used in place of
/// [`jaccard_token_similarity`] by plugins that want an AST-aware measure.
pub type SimilarityFn = fn(&str, &str) -> f64;
