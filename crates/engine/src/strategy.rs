//! The capability every recommendation strategy implements.
//!
//! Strategies are independent implementations of one trait rather than
//! variants of a base type. The runner picks one by [`StrategyKind`] and
//! drives it through a `Box<dyn RecommendationStrategy>`.

use crate::context::ActiveUserContext;
use crate::error::Result;
use data_loader::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of recommendations every strategy returns by default
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// One ranked recommendation
///
/// `score` is a predicted rating for the popularity and collaborative
/// strategies. Content-based results carry `None`: their similarity is not
/// on the rating scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: Option<f64>,
}

impl ScoredItem {
    pub fn new(item_id: impl Into<ItemId>, score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            score: Some(score),
        }
    }

    /// A ranked item without a rating-scale score
    pub fn unscored(item_id: impl Into<ItemId>) -> Self {
        Self {
            item_id: item_id.into(),
            score: None,
        }
    }
}

/// Which strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    Popularity,
    Collaborative,
    Content,
}

impl StrategyKind {
    /// Whether the strategy reads the dense rating matrix
    pub fn needs_matrix(&self) -> bool {
        matches!(self, StrategyKind::Collaborative)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Popularity => "popularity",
            StrategyKind::Collaborative => "collaborative",
            StrategyKind::Content => "content",
        };
        f.write_str(name)
    }
}

/// Core trait for recommendation strategies.
///
/// - `Send + Sync` so one strategy instance can serve several contexts concurrently
/// - Implementations never mutate shared state; everything user-specific
///   arrives through the context
pub trait RecommendationStrategy: Send + Sync {
    /// Returns the name of this strategy (for logging/debugging)
    fn name(&self) -> &str;

    /// Produce ranked recommendations for the served user, best first
    fn recommend(&self, context: &ActiveUserContext) -> Result<Vec<ScoredItem>>;
}
