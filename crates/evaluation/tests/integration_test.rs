//! Integration tests for evaluation.
//!
//! These run every strategy through the runner on a small store and
//! evaluate the results the way the binary does.

use data_loader::{Item, ItemCatalog, RatingEntry, RatingStore};
use engine::{Recommender, RunParams, StrategyKind};
use evaluation::{EvaluationStatus, EvaluationSummary, MetricsEvaluator, NotComputedReason};
use std::sync::Arc;

const GENRES: [&str; 4] = ["Action", "Drama", "Comedy", "Sci-Fi"];

fn create_test_setup() -> Recommender {
    let mut catalog = ItemCatalog::new();
    for item in 0..12 {
        catalog.insert(Item::new(
            item.to_string(),
            format!("Item {}", item),
            format!("{}|{}", GENRES[item % 4], GENRES[(item + 1) % 4]),
        ));
    }

    let mut store = RatingStore::new();
    // User 1 rated items 0-5
    for item in 0..6 {
        store.insert(RatingEntry::new("1", item.to_string(), (item % 5 + 1) as f32));
    }
    // Users 2-6 rated everything
    for user in 2..7 {
        for item in 0..12 {
            let value = ((user + item) % 5 + 1) as f32;
            store.insert(RatingEntry::new(user.to_string(), item.to_string(), value));
        }
    }
    // User 7 has too few ratings to be evaluated
    store.insert(RatingEntry::new("7", "0", 4.0));

    Recommender::new(Arc::new(store), Arc::new(catalog))
}

#[test]
fn test_scored_strategies_are_evaluated() {
    let recommender = create_test_setup();
    let evaluator = MetricsEvaluator::new();
    let params = RunParams::new("1").with_neighbours(3).with_min_votes(2);

    for kind in [StrategyKind::Popularity, StrategyKind::Collaborative] {
        let items = recommender.run_strategy(kind, &params).unwrap();
        assert_eq!(items.len(), 5);
        // Nothing the user already rated is recommended
        assert!(items.iter().all(|i| i.item_id.parse::<usize>().unwrap() >= 6));

        let evaluation = evaluator.evaluate(recommender.store(), "1", &items);
        assert!(evaluation.is_computed(), "{} was not evaluated", kind);
        assert!(evaluation.mae >= 0.0);
        assert!(evaluation.rmse >= evaluation.mae - 1e-12);
    }
}

#[test]
fn test_content_results_are_not_evaluated() {
    let recommender = create_test_setup();
    let items = recommender
        .run_strategy(StrategyKind::Content, &RunParams::new("1"))
        .unwrap();

    assert_eq!(items.len(), 5);
    let evaluation = MetricsEvaluator::new().evaluate(recommender.store(), "1", &items);
    assert_eq!(
        evaluation.status,
        EvaluationStatus::NotComputed(NotComputedReason::MissingScores)
    );
    assert_eq!(evaluation.as_tuple(), (0.0, 0.0));
}

#[test]
fn test_summary_over_users() {
    let recommender = create_test_setup();
    let evaluator = MetricsEvaluator::new();

    let evaluations: Vec<_> = ["1", "7"]
        .iter()
        .map(|user| {
            let items = recommender
                .run_strategy(StrategyKind::Popularity, &RunParams::new(*user))
                .unwrap();
            evaluator.evaluate(recommender.store(), user, &items)
        })
        .collect();

    let summary = EvaluationSummary::from_evaluations(&evaluations);
    assert_eq!(summary.computed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.mean_mae, evaluations[0].mae);
}
