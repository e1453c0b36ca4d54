//! The user being served in a recommendation run.
//!
//! The context is an explicit value built once per run and passed by
//! reference into every strategy, so several users can be served side by
//! side without shared mutable state.

use crate::error::{EngineError, Result};
use crate::matrix::RatingMatrix;
use data_loader::{ItemId, RatingStore, UserId};
use ndarray::Array1;
use std::collections::HashSet;

/// The active user's row in the rating matrix, copied out once per run
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    /// Row index in the matrix
    pub index: usize,
    pub ratings: Array1<f32>,
    pub observed: Array1<bool>,
}

/// Everything a strategy needs to know about the served user
#[derive(Debug, Clone)]
pub struct ActiveUserContext {
    pub user_id: UserId,
    /// Items the user has a rating for in the store
    pub rated_items: HashSet<ItemId>,
    /// Mean of the user's store ratings
    pub avg_rating: f32,
    matrix_row: Option<MatrixRow>,
}

impl ActiveUserContext {
    /// An empty context, mostly useful in tests
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            rated_items: HashSet::new(),
            avg_rating: 0.0,
            matrix_row: None,
        }
    }

    /// Resolve the user's row in `matrix` and keep a copy of it
    ///
    /// Fails with `MissingMatrixRow` when the matrix has no (valid) row for
    /// the user, which happens with snapshots built from another store.
    pub fn attach_matrix(mut self, matrix: &RatingMatrix) -> Result<Self> {
        let (rows, _) = matrix.shape();
        let index = matrix
            .users()
            .position(&self.user_id)
            .filter(|&row| row < rows)
            .ok_or_else(|| EngineError::MissingMatrixRow {
                user_id: self.user_id.clone(),
            })?;

        self.matrix_row = Some(MatrixRow {
            index,
            ratings: matrix.row(index).to_owned(),
            observed: matrix.observed_row(index).to_owned(),
        });
        Ok(self)
    }

    pub fn matrix_row(&self) -> Option<&MatrixRow> {
        self.matrix_row.as_ref()
    }

    pub fn has_rated(&self, item_id: &str) -> bool {
        self.rated_items.contains(item_id)
    }
}

/// Build the context for `user_id` from the rating store
///
/// An id that is absent from the store is an `UnknownUser` error: serving
/// some other user's preferences instead is never acceptable.
pub fn build_user_context(store: &RatingStore, user_id: &str) -> Result<ActiveUserContext> {
    let ratings = store
        .get_user_ratings(user_id)
        .ok_or_else(|| EngineError::UnknownUser {
            user_id: user_id.to_string(),
        })?;

    let mut context = ActiveUserContext::new(user_id);
    context.rated_items = ratings.iter().map(|(item_id, _)| item_id.clone()).collect();
    context.avg_rating = ratings.mean().unwrap_or(0.0);

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::RatingMatrixBuilder;
    use data_loader::{Item, ItemCatalog, RatingEntry};

    fn create_test_store() -> RatingStore {
        let mut store = RatingStore::new();
        store.insert(RatingEntry::new("1", "10", 5.0));
        store.insert(RatingEntry::new("1", "11", 3.0));
        store.insert(RatingEntry::new("1", "12", 4.5));
        store.insert(RatingEntry::new("2", "10", 2.0));
        store
    }

    #[test]
    fn test_build_user_context_basic() {
        let store = create_test_store();
        let context = build_user_context(&store, "1").unwrap();

        assert_eq!(context.user_id, "1");
        assert_eq!(context.rated_items.len(), 3);
        assert!(context.has_rated("11"));
        assert!(!context.has_rated("13"));
        // Average: (5.0 + 3.0 + 4.5) / 3 = 4.166...
        assert!((context.avg_rating - 4.166).abs() < 0.01);
        assert!(context.matrix_row().is_none());
    }

    #[test]
    fn test_user_not_found() {
        let store = create_test_store();
        let result = build_user_context(&store, "999");
        assert!(matches!(result, Err(EngineError::UnknownUser { .. })));
    }

    #[test]
    fn test_attach_matrix_copies_row() {
        let store = create_test_store();
        let mut catalog = ItemCatalog::new();
        for id in ["10", "11", "12"] {
            catalog.insert(Item::new(id, format!("Item {}", id), ""));
        }
        let matrix = RatingMatrixBuilder::new().build(&store, &catalog).matrix;

        let context = build_user_context(&store, "2")
            .unwrap()
            .attach_matrix(&matrix)
            .unwrap();
        let row = context.matrix_row().unwrap();

        assert_eq!(row.index, 1);
        assert_eq!(row.ratings.to_vec(), vec![2.0, 0.0, 0.0]);
        assert_eq!(row.observed.to_vec(), vec![true, false, false]);
    }

    #[test]
    fn test_attach_matrix_without_row() {
        let matrix = RatingMatrixBuilder::new()
            .build(&RatingStore::new(), &ItemCatalog::new())
            .matrix;
        let result = ActiveUserContext::new("1").attach_matrix(&matrix);
        assert!(matches!(result, Err(EngineError::MissingMatrixRow { .. })));
    }
}
