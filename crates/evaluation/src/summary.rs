//! Aggregation of many evaluations, e.g. over a benchmark run.

use crate::metrics::Evaluation;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub computed: usize,
    pub skipped: usize,
    /// Mean over computed evaluations only; 0.0 when none were computed
    pub mean_mae: f64,
    pub mean_rmse: f64,
}

impl EvaluationSummary {
    /// Not-computed sentinels are counted as skipped, never averaged in
    pub fn from_evaluations<'a, I>(evaluations: I) -> Self
    where
        I: IntoIterator<Item = &'a Evaluation>,
    {
        let mut summary = Self::default();
        let (mut mae_sum, mut rmse_sum) = (0.0, 0.0);

        for evaluation in evaluations {
            if evaluation.is_computed() {
                summary.computed += 1;
                mae_sum += evaluation.mae;
                rmse_sum += evaluation.rmse;
            } else {
                summary.skipped += 1;
            }
        }

        if summary.computed > 0 {
            summary.mean_mae = mae_sum / summary.computed as f64;
            summary.mean_rmse = rmse_sum / summary.computed as f64;
        }
        summary
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} evaluated, {} skipped, mean MAE {:.4}, mean RMSE {:.4}",
            self.computed, self.skipped, self.mean_mae, self.mean_rmse
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NotComputedReason;

    #[test]
    fn test_summary_ignores_sentinels() {
        let evaluations = vec![
            Evaluation::computed(1.0, 2.0),
            Evaluation::not_computed(NotComputedReason::MissingScores),
            Evaluation::computed(0.5, 1.0),
        ];

        let summary = EvaluationSummary::from_evaluations(&evaluations);
        assert_eq!(summary.computed, 2);
        assert_eq!(summary.skipped, 1);
        assert!((summary.mean_mae - 0.75).abs() < 1e-9);
        assert!((summary.mean_rmse - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = EvaluationSummary::from_evaluations(&Vec::<Evaluation>::new());
        assert_eq!(summary, EvaluationSummary::default());
    }
}
