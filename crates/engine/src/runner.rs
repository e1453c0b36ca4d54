//! # Strategy Runner
//!
//! Coordinates a single recommendation run:
//! 1. Build the active user's context from the store
//! 2. Build (or reuse) the rating matrix when the strategy needs it
//! 3. Run the chosen strategy through the trait object
//! 4. Log elapsed time
//!
//! The matrix is built at most once per [`Recommender`], so a benchmark over
//! many users pays for it a single time.

use crate::collaborative::CollaborativeStrategy;
use crate::content::ContentStrategy;
use crate::context::build_user_context;
use crate::error::Result;
use crate::matrix::{RatingMatrix, RatingMatrixBuilder};
use crate::popularity::PopularityStrategy;
use crate::strategy::{RecommendationStrategy, ScoredItem, StrategyKind};
use data_loader::{ItemCatalog, ItemId, RatingStore, UserId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{info, warn};

/// Per-run parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    pub user_id: UserId,
    /// Neighbour count K for the collaborative strategy
    pub neighbours: usize,
    /// Vote threshold for the popularity strategy
    pub min_votes: u32,
}

impl RunParams {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            neighbours: 10,
            min_votes: 1,
        }
    }

    pub fn with_neighbours(mut self, neighbours: usize) -> Self {
        self.neighbours = neighbours;
        self
    }

    pub fn with_min_votes(mut self, min_votes: u32) -> Self {
        self.min_votes = min_votes;
        self
    }
}

/// A recommendation joined with its catalog entry, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedItem {
    pub item_id: ItemId,
    pub title: String,
    pub tags: String,
    pub score: Option<f64>,
}

pub struct Recommender {
    store: Arc<RatingStore>,
    catalog: Arc<ItemCatalog>,
    builder: RatingMatrixBuilder,
    matrix: OnceLock<Arc<RatingMatrix>>,
}

impl Recommender {
    pub fn new(store: Arc<RatingStore>, catalog: Arc<ItemCatalog>) -> Self {
        Self {
            store,
            catalog,
            builder: RatingMatrixBuilder::new(),
            matrix: OnceLock::new(),
        }
    }

    /// Builder used when the matrix has to be built from the store
    pub fn with_builder(mut self, builder: RatingMatrixBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Use a previously built or bulk-loaded matrix instead of building one
    ///
    /// A matrix whose shape disagrees with the current store and catalog is
    /// accepted with a warning.
    pub fn with_matrix(mut self, matrix: RatingMatrix) -> Self {
        let expected = (self.store.user_count(), self.catalog.len());
        if matrix.shape() != expected {
            warn!(
                "Rating matrix shape {:?} does not match store/catalog {:?}",
                matrix.shape(),
                expected
            );
        }
        self.matrix = OnceLock::from(Arc::new(matrix));
        self
    }

    pub fn store(&self) -> &Arc<RatingStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<ItemCatalog> {
        &self.catalog
    }

    /// The rating matrix, built on first use
    pub fn matrix(&self) -> Arc<RatingMatrix> {
        self.matrix
            .get_or_init(|| Arc::new(self.builder.build(&self.store, &self.catalog).matrix))
            .clone()
    }

    fn strategy(&self, kind: StrategyKind, params: &RunParams) -> Box<dyn RecommendationStrategy> {
        match kind {
            StrategyKind::Popularity => {
                Box::new(PopularityStrategy::new(self.store.clone(), params.min_votes))
            }
            StrategyKind::Collaborative => {
                Box::new(CollaborativeStrategy::new(self.matrix(), params.neighbours))
            }
            StrategyKind::Content => {
                Box::new(ContentStrategy::new(self.store.clone(), self.catalog.clone()))
            }
        }
    }

    /// Run one strategy for `params.user_id`
    pub fn run_strategy(&self, kind: StrategyKind, params: &RunParams) -> Result<Vec<ScoredItem>> {
        let start_time = Instant::now();

        let mut context = build_user_context(&self.store, &params.user_id)?;
        if kind.needs_matrix() {
            context = context.attach_matrix(&self.matrix())?;
        }

        let strategy = self.strategy(kind, params);
        let items = strategy.recommend(&context)?;

        info!(
            "{} returned {} items for user {} in {:.2?}",
            strategy.name(),
            items.len(),
            params.user_id,
            start_time.elapsed()
        );
        Ok(items)
    }

    /// Join recommendations with catalog titles and tags
    ///
    /// Items missing from the catalog are shown with an empty title.
    pub fn describe(&self, items: &[ScoredItem]) -> Vec<RecommendedItem> {
        items
            .iter()
            .map(|scored| {
                let (title, tags) = match self.catalog.get(&scored.item_id) {
                    Some(item) => (item.title.clone(), item.tags.clone()),
                    None => (String::new(), String::new()),
                };
                RecommendedItem {
                    item_id: scored.item_id.clone(),
                    title,
                    tags,
                    score: scored.score,
                }
            })
            .collect()
    }
}
