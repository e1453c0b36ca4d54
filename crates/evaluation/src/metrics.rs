//! MAE / RMSE of a recommendation list against the user's own ratings.
//!
//! ## Sampling policy
//! This is not a held-out split. Ground truth is the first `sample_size`
//! non-zero ratings of the user in store order. Predictions are the scores
//! of the first `sample_size` recommendations. Both lists are sorted
//! ascending on their own and then compared position by position, so a
//! prediction is never matched with the rating of the same item.
//!
//! ## Soft failure
//! Evaluation never errors. When it cannot be computed the result is
//! `(0.0, 0.0)` with a [`EvaluationStatus::NotComputed`] reason; callers
//! must not read that as a perfect score.

use data_loader::RatingStore;
use engine::ScoredItem;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Number of pairs compared by default
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotComputedReason {
    /// The user is not in the store
    UnknownUser,
    /// The user has fewer non-zero ratings than the sample size
    InsufficientRatings { found: usize },
    /// The strategy returned fewer items than the sample size
    InsufficientPredictions { found: usize },
    /// Some recommendations carry no rating-scale score
    MissingScores,
}

impl fmt::Display for NotComputedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotComputedReason::UnknownUser => write!(f, "unknown user"),
            NotComputedReason::InsufficientRatings { found } => {
                write!(f, "only {} non-zero ratings", found)
            }
            NotComputedReason::InsufficientPredictions { found } => {
                write!(f, "only {} recommendations", found)
            }
            NotComputedReason::MissingScores => write!(f, "recommendations have no scores"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvaluationStatus {
    Computed,
    NotComputed(NotComputedReason),
}

/// Result of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub mae: f64,
    pub rmse: f64,
    pub status: EvaluationStatus,
}

impl Evaluation {
    pub fn computed(mae: f64, rmse: f64) -> Self {
        Self {
            mae,
            rmse,
            status: EvaluationStatus::Computed,
        }
    }

    /// The `(0.0, 0.0)` sentinel
    pub fn not_computed(reason: NotComputedReason) -> Self {
        Self {
            mae: 0.0,
            rmse: 0.0,
            status: EvaluationStatus::NotComputed(reason),
        }
    }

    pub fn is_computed(&self) -> bool {
        self.status == EvaluationStatus::Computed
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.mae, self.rmse)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            EvaluationStatus::Computed => write!(f, "MAE {:.4}, RMSE {:.4}", self.mae, self.rmse),
            EvaluationStatus::NotComputed(reason) => write!(f, "not computed ({})", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsEvaluator {
    sample_size: usize,
}

impl Default for MetricsEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEvaluator {
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Number of pairs compared (default: 5, minimum 1)
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// First `sample_size` non-zero ratings of the user, in store order
    ///
    /// `None` when the user is unknown. May be shorter than the sample size.
    pub fn ground_truth(&self, store: &RatingStore, user_id: &str) -> Option<Vec<f64>> {
        let ratings = store.get_user_ratings(user_id)?;
        Some(
            ratings
                .iter()
                .filter(|(_, value)| *value != 0.0)
                .map(|(_, value)| value as f64)
                .take(self.sample_size)
                .collect(),
        )
    }

    pub fn evaluate(&self, store: &RatingStore, user_id: &str, recommendations: &[ScoredItem]) -> Evaluation {
        match self.try_evaluate(store, user_id, recommendations) {
            Ok((mae, rmse)) => {
                debug!("Evaluation for user {}: MAE {:.4}, RMSE {:.4}", user_id, mae, rmse);
                Evaluation::computed(mae, rmse)
            }
            Err(reason) => {
                warn!("Metrics not computed for user {}: {}", user_id, reason);
                Evaluation::not_computed(reason)
            }
        }
    }

    fn try_evaluate(
        &self,
        store: &RatingStore,
        user_id: &str,
        recommendations: &[ScoredItem],
    ) -> Result<(f64, f64), NotComputedReason> {
        let mut truth = self
            .ground_truth(store, user_id)
            .ok_or(NotComputedReason::UnknownUser)?;
        if truth.len() < self.sample_size {
            return Err(NotComputedReason::InsufficientRatings { found: truth.len() });
        }

        if recommendations.len() < self.sample_size {
            return Err(NotComputedReason::InsufficientPredictions {
                found: recommendations.len(),
            });
        }
        let mut predicted = recommendations[..self.sample_size]
            .iter()
            .map(|item| item.score)
            .collect::<Option<Vec<f64>>>()
            .ok_or(NotComputedReason::MissingScores)?;

        truth.sort_by(f64::total_cmp);
        predicted.sort_by(f64::total_cmp);

        let n = self.sample_size as f64;
        let (abs_sum, sq_sum) = predicted
            .iter()
            .zip(&truth)
            .fold((0.0, 0.0), |(abs_sum, sq_sum), (p, t)| {
                let diff = p - t;
                (abs_sum + diff.abs(), sq_sum + diff * diff)
            });

        Ok((abs_sum / n, (sq_sum / n).sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::RatingEntry;

    fn store_with(values: &[f32]) -> RatingStore {
        let mut store = RatingStore::new();
        for (item, value) in values.iter().enumerate() {
            store.insert(RatingEntry::new("1", item.to_string(), *value));
        }
        store
    }

    fn scored(scores: &[f64]) -> Vec<ScoredItem> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| ScoredItem::new(format!("p{}", i), *s))
            .collect()
    }

    #[test]
    fn test_exact_predictions() {
        let store = store_with(&[4.0, 3.0, 5.0, 2.0, 1.0]);
        let evaluation = MetricsEvaluator::new().evaluate(&store, "1", &scored(&[5.0, 4.0, 3.0, 2.0, 1.0]));

        assert!(evaluation.is_computed());
        assert_eq!(evaluation.as_tuple(), (0.0, 0.0));
    }

    #[test]
    fn test_positional_pairing_after_sort() {
        let store = store_with(&[4.0, 3.0, 5.0, 2.0, 1.0]);
        // Sorted predictions [1.5, 2.5, 3.5, 4.5, 5.5] vs truth [1, 2, 3, 4, 5]
        let evaluation = MetricsEvaluator::new().evaluate(&store, "1", &scored(&[5.5, 4.5, 3.5, 2.5, 1.5]));

        assert!((evaluation.mae - 0.5).abs() < 1e-9);
        assert!((evaluation.rmse - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ground_truth_skips_zeros_and_truncates() {
        let store = store_with(&[0.0, 4.0, 3.0, 0.0, 5.0, 2.0, 1.0, 4.5]);
        let truth = MetricsEvaluator::new().ground_truth(&store, "1").unwrap();
        assert_eq!(truth, vec![4.0, 3.0, 5.0, 2.0, 1.0]);
    }

    #[test]
    fn test_insufficient_ratings_is_sentinel() {
        let store = store_with(&[4.0, 0.0, 3.0]);
        let evaluation = MetricsEvaluator::new().evaluate(&store, "1", &scored(&[5.0; 5]));

        assert_eq!(evaluation.as_tuple(), (0.0, 0.0));
        assert_eq!(
            evaluation.status,
            EvaluationStatus::NotComputed(NotComputedReason::InsufficientRatings { found: 2 })
        );
    }

    #[test]
    fn test_short_or_unscored_predictions() {
        let store = store_with(&[4.0, 3.0, 5.0, 2.0, 1.0]);
        let evaluator = MetricsEvaluator::new();

        let short = evaluator.evaluate(&store, "1", &scored(&[4.0, 3.0]));
        assert_eq!(
            short.status,
            EvaluationStatus::NotComputed(NotComputedReason::InsufficientPredictions { found: 2 })
        );

        let unscored: Vec<ScoredItem> = (0..5).map(|i| ScoredItem::unscored(i.to_string())).collect();
        let evaluation = evaluator.evaluate(&store, "1", &unscored);
        assert_eq!(evaluation.status, EvaluationStatus::NotComputed(NotComputedReason::MissingScores));
        assert_eq!(evaluation.as_tuple(), (0.0, 0.0));
    }

    #[test]
    fn test_unknown_user() {
        let evaluation = MetricsEvaluator::new().evaluate(&RatingStore::new(), "9", &scored(&[1.0; 5]));
        assert_eq!(evaluation.status, EvaluationStatus::NotComputed(NotComputedReason::UnknownUser));
    }

    #[test]
    fn test_custom_sample_size() {
        let store = store_with(&[4.0, 2.0]);
        let evaluation = MetricsEvaluator::new()
            .with_sample_size(2)
            .evaluate(&store, "1", &scored(&[3.0, 5.0]));

        // Sorted: predictions [3, 5] vs truth [2, 4]
        assert!((evaluation.mae - 1.0).abs() < 1e-9);
        assert!((evaluation.rmse - 1.0).abs() < 1e-9);
    }
}
