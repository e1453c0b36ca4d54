//! Collaborative Strategy - user-based collaborative filtering
//!
//! "Users who rate like you predict how you would rate the rest."
//!
//! ## Algorithm
//! 1. Take the served user's row from the rating matrix
//! 2. Cosine similarity against every other row, restricted to co-rated
//!    items, clamped to [0, 1] and rounded to 2 decimals. The user's
//!    similarity to themself is forced to 0.0
//! 3. Keep the K most similar users as neighbours
//! 4. For every item the user has not rated:
//!    `prediction = mean(user) + Σ sim·(rating − mean(neighbour)) / Σ sim`
//! 5. Return the top 5 predictions, mapped back to item ids
//!
//! ## Degenerate cases
//! - no co-rated items or a zero norm: similarity 0.0
//! - a row without any rating: its mean is `empty_row_mean` (1.0)
//! - neighbour similarities summing to 0: the prediction is the user's own mean

use crate::context::{ActiveUserContext, MatrixRow};
use crate::error::{EngineError, Result};
use crate::matrix::RatingMatrix;
use crate::numeric::round_to;
use crate::strategy::{DEFAULT_RESULT_LIMIT, RecommendationStrategy, ScoredItem};
use crate::top_k::select_top_k;
use ndarray::{ArrayView1, Zip};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Cosine similarity over the items both rows have rated
///
/// Returns `None` when the four views do not share one length. A zero
/// norm on the co-rated cells yields `Some(0.0)`.
pub fn co_rated_cosine(
    u: ArrayView1<'_, f32>,
    u_observed: ArrayView1<'_, bool>,
    v: ArrayView1<'_, f32>,
    v_observed: ArrayView1<'_, bool>,
) -> Option<f64> {
    let n = u.len();
    if v.len() != n || u_observed.len() != n || v_observed.len() != n {
        return None;
    }

    let (mut dot, mut norm_u, mut norm_v) = (0.0f64, 0.0f64, 0.0f64);
    Zip::from(&u)
        .and(&u_observed)
        .and(&v)
        .and(&v_observed)
        .for_each(|&a, &a_rated, &b, &b_rated| {
            if a_rated && b_rated {
                let (a, b) = (a as f64, b as f64);
                dot += a * b;
                norm_u += a * a;
                norm_v += b * b;
            }
        });

    let denominator = norm_u.sqrt() * norm_v.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Some(0.0);
    }
    Some(dot / denominator)
}

/// User-to-user similarity: co-rated cosine clamped to [0, 1] and rounded
///
/// Any fault (shape mismatch, non-finite value) gives 0.0.
pub fn user_similarity(
    u: ArrayView1<'_, f32>,
    u_observed: ArrayView1<'_, bool>,
    v: ArrayView1<'_, f32>,
    v_observed: ArrayView1<'_, bool>,
    decimals: i32,
) -> f64 {
    match co_rated_cosine(u, u_observed, v, v_observed) {
        Some(cosine) if cosine.is_finite() => round_to(cosine.clamp(0.0, 1.0), decimals),
        Some(_) => 0.0,
        None => {
            debug!("Similarity shape mismatch ({} vs {}), using 0.0", u.len(), v.len());
            0.0
        }
    }
}

/// Mean over rated cells, `fallback` when the row has none
pub fn row_mean(values: ArrayView1<'_, f32>, observed: ArrayView1<'_, bool>, fallback: f64) -> f64 {
    let (sum, count) = values
        .iter()
        .zip(observed.iter())
        .filter(|(_, rated)| **rated)
        .fold((0.0f64, 0usize), |(sum, count), (&v, _)| (sum + v as f64, count + 1));

    if count == 0 {
        fallback
    } else {
        sum / count as f64
    }
}

/// User-based collaborative filtering over the dense rating matrix
pub struct CollaborativeStrategy {
    /// Shared, read-only rating matrix
    matrix: Arc<RatingMatrix>,

    /// Number of neighbours (K)
    neighbours: usize,

    limit: usize,

    /// Mean assumed for a row without ratings
    empty_row_mean: f64,

    /// Decimal places kept on similarities
    similarity_decimals: i32,

    /// Only let neighbours who rated an item contribute to its prediction
    skip_unrated_neighbours: bool,
}

impl CollaborativeStrategy {
    pub fn new(matrix: Arc<RatingMatrix>, neighbours: usize) -> Self {
        Self {
            matrix,
            neighbours,
            limit: DEFAULT_RESULT_LIMIT,
            empty_row_mean: 1.0,
            similarity_decimals: 2,
            skip_unrated_neighbours: false,
        }
    }

    /// Configure how many items are returned (default: 5)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Configure the mean used for rows without ratings (default: 1.0)
    pub fn with_empty_row_mean(mut self, mean: f64) -> Self {
        self.empty_row_mean = mean;
        self
    }

    /// Configure similarity rounding (default: 2 decimals)
    pub fn with_similarity_decimals(mut self, decimals: i32) -> Self {
        self.similarity_decimals = decimals;
        self
    }

    /// Skip neighbours without a rating for the predicted item (default: false)
    ///
    /// By default every neighbour contributes, an unrated cell counting as
    /// 0.0, and the weights are normalized by the similarity sum of all K
    /// neighbours.
    pub fn with_skip_unrated_neighbours(mut self, skip: bool) -> Self {
        self.skip_unrated_neighbours = skip;
        self
    }

    fn active_row<'a>(&self, context: &'a ActiveUserContext) -> Result<&'a MatrixRow> {
        context
            .matrix_row()
            .ok_or_else(|| EngineError::MissingMatrixRow {
                user_id: context.user_id.clone(),
            })
    }

    /// Similarity of the served user to every matrix row, indexed by row
    ///
    /// The served user's own entry is always 0.0.
    pub fn similarities(&self, row: &MatrixRow) -> Vec<f64> {
        let (rows, _) = self.matrix.shape();
        (0..rows)
            .into_par_iter()
            .map(|other| {
                if other == row.index {
                    return 0.0;
                }
                user_similarity(
                    row.ratings.view(),
                    row.observed.view(),
                    self.matrix.row(other),
                    self.matrix.observed_row(other),
                    self.similarity_decimals,
                )
            })
            .collect()
    }

    /// The K most similar rows as (row, similarity), most similar first
    pub fn nearest_neighbours(&self, similarities: &[f64]) -> Vec<(usize, f64)> {
        select_top_k(similarities.iter().copied().enumerate(), self.neighbours)
    }

    /// Predicted rating for every column the served user has not rated
    pub fn predictions(&self, row: &MatrixRow, neighbours: &[(usize, f64)]) -> Vec<(usize, f64)> {
        let own_mean = row_mean(row.ratings.view(), row.observed.view(), self.empty_row_mean);
        let neighbour_means: Vec<f64> = neighbours
            .iter()
            .map(|&(other, _)| {
                row_mean(
                    self.matrix.row(other),
                    self.matrix.observed_row(other),
                    self.empty_row_mean,
                )
            })
            .collect();

        let unrated: Vec<usize> = row
            .observed
            .iter()
            .enumerate()
            .filter(|(_, rated)| !**rated)
            .map(|(column, _)| column)
            .collect();

        let values = self.matrix.values();
        unrated
            .par_iter()
            .map(|&column| {
                let (mut weighted, mut weight) = (0.0f64, 0.0f64);
                for (&(other, similarity), &mean) in neighbours.iter().zip(&neighbour_means) {
                    if self.skip_unrated_neighbours && !self.matrix.is_rated(other, column) {
                        continue;
                    }
                    let rating = values[[other, column]] as f64;
                    weighted += similarity * (rating - mean);
                    weight += similarity;
                }

                let prediction = if weight == 0.0 {
                    own_mean
                } else {
                    own_mean + weighted / weight
                };
                (column, prediction)
            })
            .collect()
    }
}

impl RecommendationStrategy for CollaborativeStrategy {
    fn name(&self) -> &str {
        "CollaborativeStrategy"
    }

    #[instrument(skip(self, context), fields(user_id = %context.user_id, k = self.neighbours))]
    fn recommend(&self, context: &ActiveUserContext) -> Result<Vec<ScoredItem>> {
        let row = self.active_row(context)?;

        // Step 1: Similarity to every other user
        let similarities = self.similarities(row);

        // Step 2: Neighbour selection
        let neighbours = self.nearest_neighbours(&similarities);
        debug!(
            "Selected {} neighbours, similarity sum {:.2}",
            neighbours.len(),
            neighbours.iter().map(|(_, s)| s).sum::<f64>()
        );

        // Step 3: Predict unrated items and keep the best
        let predictions = self.predictions(row, &neighbours);
        let top = select_top_k(predictions, self.limit);

        // Step 4: Map columns back to item ids
        let items = self.matrix.items();
        let recommendations: Vec<ScoredItem> = top
            .into_iter()
            .filter_map(|(column, score)| match items.id(column) {
                Some(item_id) => Some(ScoredItem::new(item_id, score)),
                None => {
                    warn!("Column {} has no item id in the matrix index", column);
                    None
                }
            })
            .collect();

        debug!("Generated {} collaborative recommendations", recommendations.len());
        Ok(recommendations)
    }
}
