//! # Data Loader Crate
//!
//! This crate holds the raw inputs of the recommender and reads them from disk.
//!
//! ## Main Components
//!
//! - **types**: RatingStore, ItemCatalog and their entries
//! - **parser**: Parse CSV item and rating files
//! - **index**: Load a dataset directory and cross-check references
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Dataset, DatasetKind};
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_files(Path::new("dataset"), &DatasetKind::Movies.layout())?;
//!
//! let ratings = dataset.store.get_user_ratings("1").unwrap();
//! println!("User 1 rated {} items", ratings.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{Dataset, DatasetKind, DatasetLayout};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Core types
    Item,
    ItemCatalog,
    RatingEntry,
    RatingStore,
    UserRatings,
};
