//! # Engine Crate
//!
//! Recommendation strategies over a rating store and an item catalog.
//!
//! ## Components
//!
//! ### Rating Matrix
//! Dense user×item matrix with an observed-cell mask, built once per run
//! and optionally cached as a JSON snapshot.
//!
//! ### Strategies
//! - **Popularity**: vote-weighted mean rating, same list for everyone
//!   apart from already-rated items
//! - **Collaborative**: user-user cosine similarity, K nearest neighbours,
//!   mean-centred rating prediction
//! - **Content**: TF-IDF over item tags, rating-weighted user profile
//!
//! All three implement [`RecommendationStrategy`] and return at most five
//! items. [`Recommender`] picks one by [`StrategyKind`] and runs it.
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Dataset, DatasetKind};
//! use engine::{Recommender, RunParams, StrategyKind};
//! use std::sync::Arc;
//!
//! let dataset = Dataset::load_from_files(data_dir, &DatasetKind::Movies.layout())?;
//! let recommender = Recommender::new(Arc::new(dataset.store), Arc::new(dataset.catalog));
//!
//! let params = RunParams::new("1").with_neighbours(10);
//! let items = recommender.run_strategy(StrategyKind::Collaborative, &params)?;
//! for item in recommender.describe(&items) {
//!     println!("{} {:?}", item.title, item.score);
//! }
//! ```

// Public modules
pub mod error;
pub mod numeric;
pub mod top_k;
pub mod matrix;
pub mod context;
pub mod strategy;
pub mod popularity;
pub mod collaborative;
pub mod vectorizer;
pub mod content;
pub mod runner;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use matrix::{BuildReport, IdIndex, MatrixBuild, RatingMatrix, RatingMatrixBuilder};
pub use context::{ActiveUserContext, build_user_context};
pub use strategy::{RecommendationStrategy, ScoredItem, StrategyKind};
pub use popularity::PopularityStrategy;
pub use collaborative::CollaborativeStrategy;
pub use vectorizer::{TermMatrix, TextVectorizer, TfidfVectorizer};
pub use content::ContentStrategy;
pub use runner::{RecommendedItem, Recommender, RunParams};
pub use top_k::select_top_k;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!(StrategyKind::Popularity.to_string(), "popularity");
        assert!(StrategyKind::Collaborative.needs_matrix());
        assert!(!StrategyKind::Content.needs_matrix());
    }

    #[test]
    fn test_scored_item_creation() {
        let item = ScoredItem::new("10", 4.5);
        assert_eq!(item.item_id, "10");
        assert_eq!(item.score, Some(4.5));
        assert_eq!(ScoredItem::unscored("11").score, None);
    }
}
