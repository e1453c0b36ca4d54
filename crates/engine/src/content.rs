//! Content Strategy - tag similarity between items and a user profile
//!
//! ## Algorithm
//! 1. One document per catalog item: its tags with `|` replaced by spaces
//! 2. Vectorize the corpus (TF-IDF by default, pluggable)
//! 3. User profile = rating-weighted average of the rows of every item the user rated
//! 4. Item similarity = dot product of the item row with the profile
//! 5. Score = similarity × highest rating in the store
//! 6. Top 5 items by score
//!
//! Two differences from the other strategies are kept on purpose:
//! - already-rated items are not excluded unless `exclude_rated` is set
//! - results carry no score, since a scaled similarity is not a rating estimate

use crate::context::ActiveUserContext;
use crate::error::{EngineError, Result};
use crate::matrix::IdIndex;
use crate::strategy::{DEFAULT_RESULT_LIMIT, RecommendationStrategy, ScoredItem};
use crate::top_k::select_top_k;
use crate::vectorizer::{TermMatrix, TextVectorizer, TfidfVectorizer};
use data_loader::{ItemCatalog, RatingStore, UserId, UserRatings};
use ndarray::Array1;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct ContentStrategy {
    store: Arc<RatingStore>,
    catalog: Arc<ItemCatalog>,
    vectorizer: Box<dyn TextVectorizer>,
    limit: usize,
    exclude_rated: bool,
}

impl ContentStrategy {
    pub fn new(store: Arc<RatingStore>, catalog: Arc<ItemCatalog>) -> Self {
        Self {
            store,
            catalog,
            vectorizer: Box::new(TfidfVectorizer::new()),
            limit: DEFAULT_RESULT_LIMIT,
            exclude_rated: false,
        }
    }

    /// Swap the text vectorizer (default: TF-IDF with English stop-words)
    pub fn with_vectorizer(mut self, vectorizer: impl TextVectorizer + 'static) -> Self {
        self.vectorizer = Box::new(vectorizer);
        self
    }

    /// Configure how many items are returned (default: 5)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Drop items the user already rated (default: false)
    pub fn with_exclude_rated(mut self, exclude: bool) -> Self {
        self.exclude_rated = exclude;
        self
    }

    /// Normalized tag text of every item, in catalog order
    pub fn corpus(&self) -> Vec<String> {
        self.catalog.iter().map(|item| item.normalized_tags()).collect()
    }

    /// Term weights, one row per catalog item
    pub fn term_matrix(&self) -> TermMatrix {
        let terms = self.vectorizer.fit_transform(&self.corpus());
        debug!(
            "Vectorized {} items into {} terms",
            terms.documents(),
            terms.terms()
        );
        terms
    }

    fn item_rows(&self) -> IdIndex {
        IdIndex::from_ids(self.catalog.ids().iter().cloned())
    }

    /// Rating-weighted average of the term rows of the rated items
    ///
    /// `None` when the weights sum to zero: the profile is undefined.
    fn profile_from(terms: &TermMatrix, rows: &IdIndex, ratings: &UserRatings) -> Option<Array1<f64>> {
        let mut profile = Array1::<f64>::zeros(terms.terms());
        let mut total_weight = 0.0f64;

        for (item_id, value) in ratings.iter() {
            let Some(row) = rows.position(item_id) else {
                debug!("Rated item {} is not in the catalog, skipping", item_id);
                continue;
            };
            profile.scaled_add(value as f64, &terms.weights.row(row));
            total_weight += value as f64;
        }

        if total_weight == 0.0 {
            return None;
        }
        Some(profile / total_weight)
    }

    /// Profile vector of one user, `None` for unknown users and zero total weight
    pub fn user_profile(&self, terms: &TermMatrix, user_id: &str) -> Option<Array1<f64>> {
        let ratings = self.store.get_user_ratings(user_id)?;
        Self::profile_from(terms, &self.item_rows(), ratings)
    }

    /// Profile vectors of every user
    ///
    /// Users with zero total rating weight get a zero vector.
    pub fn user_profiles(&self, terms: &TermMatrix) -> HashMap<UserId, Array1<f64>> {
        let rows = self.item_rows();
        let users: Vec<(&UserId, &UserRatings)> = self.store.iter().collect();

        users
            .par_iter()
            .map(|&(user_id, ratings)| {
                let profile = Self::profile_from(terms, &rows, ratings).unwrap_or_else(|| {
                    warn!("User {} has zero total rating weight, using a zero profile", user_id);
                    Array1::zeros(terms.terms())
                });
                (user_id.clone(), profile)
            })
            .collect()
    }

    /// Score of every catalog item for a profile: dot product × max rating
    pub fn item_scores(&self, terms: &TermMatrix, profile: &Array1<f64>) -> Array1<f64> {
        let max_rating = self.store.max_rating() as f64;
        terms.weights.dot(profile) * max_rating
    }
}

impl RecommendationStrategy for ContentStrategy {
    fn name(&self) -> &str {
        "ContentStrategy"
    }

    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    fn recommend(&self, context: &ActiveUserContext) -> Result<Vec<ScoredItem>> {
        let terms = self.term_matrix();
        let profile = self
            .user_profile(&terms, &context.user_id)
            .ok_or_else(|| EngineError::ColdStart {
                user_id: context.user_id.clone(),
            })?;

        let scores = self.item_scores(&terms, &profile);
        let ids = self.catalog.ids();
        let candidates = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(row, _)| !(self.exclude_rated && context.has_rated(&ids[row])));

        let top: Vec<ScoredItem> = select_top_k(candidates, self.limit)
            .into_iter()
            .map(|(row, _)| ScoredItem::unscored(ids[row].clone()))
            .collect();

        debug!("Generated {} content recommendations", top.len());
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_user_context;
    use data_loader::{Item, RatingEntry};

    fn create_test_data() -> (Arc<RatingStore>, Arc<ItemCatalog>) {
        let mut catalog = ItemCatalog::new();
        catalog.insert(Item::new("1", "Space Opera", "Sci-Fi|Adventure"));
        catalog.insert(Item::new("2", "Love Story", "Romance|Drama"));
        catalog.insert(Item::new("3", "Star Quest", "Sci-Fi|Action"));
        catalog.insert(Item::new("4", "Tears", "Drama"));
        catalog.insert(Item::new("5", "Galaxy Raid", "Sci-Fi|Action|Adventure"));

        let mut store = RatingStore::new();
        store.insert(RatingEntry::new("fan", "1", 5.0));
        store.insert(RatingEntry::new("fan", "2", 1.0));
        store.insert(RatingEntry::new("zero", "2", 0.0));
        store.insert(RatingEntry::new("other", "4", 4.0));

        (Arc::new(store), Arc::new(catalog))
    }

    #[test]
    fn test_corpus_normalizes_separator() {
        let (store, catalog) = create_test_data();
        let strategy = ContentStrategy::new(store, catalog);
        assert_eq!(strategy.corpus()[0], "Sci-Fi Adventure");
    }

    #[test]
    fn test_profile_is_weighted_average() {
        let (store, catalog) = create_test_data();
        let strategy = ContentStrategy::new(store, catalog);
        let terms = strategy.term_matrix();

        let profile = strategy.user_profile(&terms, "fan").unwrap();
        let expected = (&terms.weights.row(0) * 5.0 + &terms.weights.row(1) * 1.0) / 6.0;
        for (a, b) in profile.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_weight_profile() {
        let (store, catalog) = create_test_data();
        let strategy = ContentStrategy::new(store, catalog);
        let terms = strategy.term_matrix();

        assert!(strategy.user_profile(&terms, "zero").is_none());
        let profiles = strategy.user_profiles(&terms);
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles["zero"].sum(), 0.0);
    }

    #[test]
    fn test_recommend_ranks_similar_tags_first() {
        let (store, catalog) = create_test_data();
        let strategy = ContentStrategy::new(store.clone(), catalog);
        let context = build_user_context(&store, "fan").unwrap();

        let recs = strategy.recommend(&context).unwrap();

        assert_eq!(recs.len(), 5);
        // Already-rated items are kept and scores are placeholders
        assert_eq!(recs[0].item_id, "1");
        assert!(recs.iter().all(|r| r.score.is_none()));
        let sci_fi_rank = recs.iter().position(|r| r.item_id == "5").unwrap();
        let drama_rank = recs.iter().position(|r| r.item_id == "4").unwrap();
        assert!(sci_fi_rank < drama_rank);
    }

    #[test]
    fn test_recommend_can_exclude_rated() {
        let (store, catalog) = create_test_data();
        let strategy = ContentStrategy::new(store.clone(), catalog).with_exclude_rated(true);
        let context = build_user_context(&store, "fan").unwrap();

        let recs = strategy.recommend(&context).unwrap();
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.item_id != "1" && r.item_id != "2"));
    }

    #[test]
    fn test_cold_start_user() {
        let (store, catalog) = create_test_data();
        let strategy = ContentStrategy::new(store.clone(), catalog);
        let context = build_user_context(&store, "zero").unwrap();

        let result = strategy.recommend(&context);
        assert!(matches!(result, Err(EngineError::ColdStart { .. })));
    }
}
