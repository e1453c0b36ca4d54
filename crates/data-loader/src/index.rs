//! Dataset loading and cross-referencing.
//!
//! Builds the two leaf collections from a dataset directory:
//! - parse the item and rating files in parallel
//! - insert them in file order (this fixes the first-seen ordering)
//! - report ratings that reference items missing from the catalog

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The datasets shipped with the recommender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Movies,
    Books,
}

impl DatasetKind {
    /// File locations relative to the data directory
    pub fn layout(&self) -> DatasetLayout {
        match self {
            DatasetKind::Movies => DatasetLayout {
                items_file: PathBuf::from("MoviesLens100k/movies.csv"),
                ratings_file: PathBuf::from("MoviesLens100k/ratings.csv"),
            },
            DatasetKind::Books => DatasetLayout {
                items_file: PathBuf::from("Books/Books-small.csv"),
                ratings_file: PathBuf::from("Books/Ratings-small.csv"),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Movies => "movies",
            DatasetKind::Books => "books",
        }
    }
}

/// Where the item and rating files live, relative to a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub items_file: PathBuf,
    pub ratings_file: PathBuf,
}

/// A fully materialized dataset: catalog plus ratings
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub catalog: ItemCatalog,
    pub store: RatingStore,
}

impl Dataset {
    pub fn new(catalog: ItemCatalog, store: RatingStore) -> Self {
        Self { catalog, store }
    }

    /// Load a dataset from `data_dir` using the given file layout
    ///
    /// Steps:
    /// 1. Parse both files IN PARALLEL using Rayon
    /// 2. Insert items and ratings in file order
    /// 3. Log dangling references (non-fatal)
    pub fn load_from_files(data_dir: &Path, layout: &DatasetLayout) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let items_path = data_dir.join(&layout.items_file);
        let ratings_path = data_dir.join(&layout.ratings_file);

        let (items, ratings) = rayon::join(
            || parser::parse_items(&items_path),
            || parser::parse_ratings(&ratings_path),
        );
        let items = items?;
        let ratings = ratings?;

        let mut catalog = ItemCatalog::new();
        for item in items {
            catalog.insert(item);
        }

        let rating_count = ratings.len();
        let mut store = RatingStore::new();
        for rating in ratings {
            store.insert(rating);
        }

        let (users, stored) = store.counts();
        info!(
            "Loaded {} items, {} users, {} ratings ({} rows read)",
            catalog.len(),
            users,
            stored,
            rating_count
        );

        let dataset = Dataset::new(catalog, store);
        let dangling = dataset.dangling_references();
        if !dangling.is_empty() {
            warn!(
                "{} ratings reference items missing from the catalog",
                dangling.len()
            );
        }

        Ok(dataset)
    }

    /// Every rating whose item is absent from the catalog
    ///
    /// These are not fatal: the matrix builder skips them and reports them again.
    pub fn dangling_references(&self) -> Vec<DataLoadError> {
        self.store
            .entries()
            .filter(|entry| !self.catalog.contains(&entry.item_id))
            .map(|entry| DataLoadError::missing_item(&entry.item_id))
            .collect()
    }

    /// Strict validation: fail on the first dangling reference
    pub fn validate(&self) -> Result<()> {
        match self.dangling_references().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
