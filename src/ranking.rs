//! Helpers for reading and comparing PPR estimates.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::NotNan;

/// The `k` largest positive finite scores as `(node, score)`, best first.
///
/// Equal scores rank the smaller node id first.
pub fn top_k(estimate: &[f64], k: usize) -> Vec<(usize, f64)> {
    if k == 0 {
        return Vec::new();
    }
    // min-heap of the current best k; the weakest entry has the lowest score and,
    // among equal scores, the highest node id
    let mut heap: BinaryHeap<Reverse<(NotNan<f64>, Reverse<usize>)>> =
        BinaryHeap::with_capacity(k + 1);
    for (node, &score) in estimate.iter().enumerate() {
        if !score.is_finite() || score <= 0.0 {
            continue;
        }
        let Ok(score) = NotNan::new(score) else {
            continue;
        };
        heap.push(Reverse((score, Reverse(node))));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut ranked: Vec<_> = heap
        .into_iter()
        .map(|Reverse((score, Reverse(node)))| (score, Reverse(node)))
        .collect();
    ranked.sort_unstable_by(|a, b| b.cmp(a));
    ranked
        .into_iter()
        .map(|(score, Reverse(node))| (node, score.into_inner()))
        .collect()
}

/// Sum of absolute differences. Panics on length mismatch.
pub fn l1_error(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "estimates cover different node counts");
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_orders_by_score_then_node() {
        let est = [0.1, 0.4, 0.0, 0.4, f64::NAN, 0.2, -1.0];
        assert_eq!(top_k(&est, 3), vec![(1, 0.4), (3, 0.4), (5, 0.2)]);
        assert_eq!(top_k(&est, 10).len(), 4);
        assert!(top_k(&est, 0).is_empty());
    }

    #[test]
    fn l1_error_of_identical_vectors_is_zero() {
        let a = [0.5, 0.25, 0.25];
        assert_eq!(l1_error(&a, &a), 0.0);
        assert!((l1_error(&a, &[0.25, 0.25, 0.5]) - 0.5).abs() < 1e-12);
    }
}
