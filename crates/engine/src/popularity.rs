//! Popularity Strategy - Bayesian-weighted average rating
//!
//! Ranks items by their mean rating, shrunk towards the global mean when
//! few users have rated them.
//!
//! ## Algorithm
//! 1. Aggregate sum and count of ratings per item across all users
//! 2. Discard items with fewer than `min_votes` ratings
//! 3. Compute each item's mean and the global mean over surviving items,
//!    both rounded to 5 decimals
//! 4. score = (c/(c+m))·itemMean + (m/(c+m))·globalMean
//! 5. Drop items the served user already rated, return the top 5
//!    (equal scores keep the order items first appear in the store)

use crate::context::ActiveUserContext;
use crate::error::Result;
use crate::numeric::round_to;
use crate::strategy::{DEFAULT_RESULT_LIMIT, RecommendationStrategy, ScoredItem};
use crate::top_k::select_top_k;
use data_loader::{ItemId, RatingStore};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Decimal places kept on popularity scores
const SCORE_DECIMALS: i32 = 5;

/// Running sum and count of an item's ratings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemTally {
    pub sum: f64,
    pub count: u32,
}

impl ItemTally {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Bayesian-style weighted score of one item
pub fn weighted_score(count: u32, item_mean: f64, min_votes: u32, global_mean: f64) -> f64 {
    let total = (count + min_votes) as f64;
    if total == 0.0 {
        return global_mean;
    }
    (count as f64 / total) * item_mean + (min_votes as f64 / total) * global_mean
}

/// Popularity-weighted scoring over the whole rating store
pub struct PopularityStrategy {
    store: Arc<RatingStore>,

    /// Minimum number of ratings an item needs to be ranked at all
    min_votes: u32,

    limit: usize,
}

impl PopularityStrategy {
    pub fn new(store: Arc<RatingStore>, min_votes: u32) -> Self {
        Self {
            store,
            min_votes,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Configure how many items are returned (default: 5)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sum and count of ratings per item, in the order items first appear in the store
    pub fn tally_in_order(&self) -> Vec<(ItemId, ItemTally)> {
        let mut positions: HashMap<&ItemId, usize> = HashMap::new();
        let mut tallies: Vec<(ItemId, ItemTally)> = Vec::new();
        for (_, ratings) in self.store.iter() {
            for (item_id, value) in ratings.iter() {
                let pos = *positions.entry(item_id).or_insert_with(|| {
                    tallies.push((item_id.clone(), ItemTally::default()));
                    tallies.len() - 1
                });
                let tally = &mut tallies[pos].1;
                tally.sum += value as f64;
                tally.count += 1;
            }
        }
        tallies
    }

    /// Sum and count of ratings for every rated item
    pub fn tally(&self) -> HashMap<ItemId, ItemTally> {
        self.tally_in_order().into_iter().collect()
    }

    /// Weighted score of every item with at least `min_votes` ratings, in first-seen order
    ///
    /// Item means and the global mean are rounded to 5 decimals before the
    /// weighted score is taken. Empty when no item survives the vote threshold.
    pub fn ordered_scores(&self) -> Vec<(ItemId, f64)> {
        let surviving: Vec<(ItemId, u32, f64)> = self
            .tally_in_order()
            .into_iter()
            .filter(|(_, tally)| tally.count >= self.min_votes)
            .map(|(item_id, tally)| (item_id, tally.count, round_to(tally.mean(), SCORE_DECIMALS)))
            .collect();

        if surviving.is_empty() {
            debug!("No item has at least {} ratings", self.min_votes);
            return Vec::new();
        }

        let global_mean = round_to(
            surviving.iter().map(|(_, _, mean)| mean).sum::<f64>() / surviving.len() as f64,
            SCORE_DECIMALS,
        );
        debug!(
            "{} items survive min_votes={}, global mean {:.5}",
            surviving.len(),
            self.min_votes,
            global_mean
        );

        surviving
            .par_iter()
            .map(|(item_id, count, mean)| {
                let score = weighted_score(*count, *mean, self.min_votes, global_mean);
                (item_id.clone(), round_to(score, SCORE_DECIMALS))
            })
            .collect()
    }

    /// [`ordered_scores`](Self::ordered_scores) keyed by item
    pub fn scores(&self) -> HashMap<ItemId, f64> {
        self.ordered_scores().into_iter().collect()
    }
}

impl RecommendationStrategy for PopularityStrategy {
    fn name(&self) -> &str {
        "PopularityStrategy"
    }

    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    fn recommend(&self, context: &ActiveUserContext) -> Result<Vec<ScoredItem>> {
        let scored = self.ordered_scores();
        // Keyed by first-seen position so equal scores keep store order
        let unrated = scored
            .iter()
            .enumerate()
            .filter(|(_, (item_id, _))| !context.has_rated(item_id))
            .map(|(pos, (_, score))| (pos, *score));

        let top: Vec<ScoredItem> = select_top_k(unrated, self.limit)
            .into_iter()
            .map(|(pos, score)| ScoredItem::new(scored[pos].0.clone(), score))
            .collect();

        debug!("Generated {} popularity recommendations", top.len());
        Ok(top)
    }
}
