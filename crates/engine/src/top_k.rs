//! Generic top-K selection shared by every strategy.
//!
//! Ordering is descending by score. Equal scores are ordered by ascending
//! key, so results never depend on hash-map iteration order. For matrix
//! row/column keys, ascending key is the same as first-seen order.
//! NaN scores rank below every real score.

use std::cmp::Ordering;

/// Compare two scores for ranking, NaN being the lowest possible value
fn rank_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Return the `k` highest-scoring `(key, score)` pairs, best first
///
/// Never returns more than `min(k, number of entries)` pairs. `k == 0`
/// yields an empty list.
pub fn select_top_k<K, I>(scores: I, k: usize) -> Vec<(K, f64)>
where
    K: Ord,
    I: IntoIterator<Item = (K, f64)>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut entries: Vec<(K, f64)> = scores.into_iter().collect();
    let by_rank = |a: &(K, f64), b: &(K, f64)| rank_order(b.1, a.1).then_with(|| a.0.cmp(&b.0));

    // Partition first so only the winners get fully sorted
    if entries.len() > k {
        entries.select_nth_unstable_by(k - 1, by_rank);
        entries.truncate(k);
    }
    entries.sort_by(by_rank);
    entries
}

/// [`select_top_k`] over integer keys, shifting every returned key by `key_offset`
///
/// Used to translate internal matrix positions into an external numbering.
pub fn select_top_k_with_offset<I>(scores: I, k: usize, key_offset: usize) -> Vec<(usize, f64)>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    select_top_k(scores, k)
        .into_iter()
        .map(|(key, score)| (key + key_offset, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample() -> HashMap<String, f64> {
        [("10", 4.5), ("11", 3.8), ("12", 2.1), ("14", 6.2), ("15", 2.4)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_top_two() {
        let top = select_top_k(sample(), 2);
        assert_eq!(top, vec![("14".to_string(), 6.2), ("10".to_string(), 4.5)]);
    }

    #[test]
    fn test_size_and_order_invariants() {
        for k in 0..8 {
            let top = select_top_k(sample(), k);
            assert_eq!(top.len(), k.min(5));
            assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }

    #[test]
    fn test_ties_break_by_ascending_key() {
        let scores = vec![(3usize, 1.0), (1, 2.0), (2, 1.0), (0, 1.0)];
        let top = select_top_k(scores, 3);
        assert_eq!(top, vec![(1, 2.0), (0, 1.0), (2, 1.0)]);
    }

    #[test]
    fn test_nan_ranks_last() {
        let scores = vec![(0usize, f64::NAN), (1, -3.0), (2, 0.5)];
        let top = select_top_k(scores, 3);
        assert_eq!(top[0], (2, 0.5));
        assert_eq!(top[1], (1, -3.0));
        assert!(top[2].1.is_nan());
    }

    #[test]
    fn test_offset_shifts_keys() {
        let scores = vec![(0usize, 0.2), (1, 0.9), (2, 0.5)];
        let top = select_top_k_with_offset(scores, 2, 1);
        assert_eq!(top, vec![(2, 0.9), (3, 0.5)]);
    }

    #[test]
    fn test_empty_input() {
        let top: Vec<(usize, f64)> = select_top_k(Vec::new(), 5);
        assert!(top.is_empty());
    }
}
