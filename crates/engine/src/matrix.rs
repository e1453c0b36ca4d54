//! Dense user×item rating matrix.
//!
//! Rows are users in RatingStore first-seen order, columns are items in
//! ItemCatalog first-seen order. Unrated cells hold [`MISSING`] (0.0); a
//! parallel boolean mask records which cells were actually written, so an
//! explicit rating of 0.0 stays distinguishable from "no rating".
//!
//! The matrix is built once per run and never mutated afterwards. It can be
//! written out as an opaque JSON snapshot and bulk-loaded on a later run.

use crate::error::Result;
use data_loader::{DataLoadError, ItemCatalog, RatingStore};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info, warn};

/// Value stored in every unrated cell
pub const MISSING: f32 = 0.0;

// =============================================================================
// IdIndex - bijection between ids and matrix positions
// =============================================================================

/// Ordered id ↔ position mapping
///
/// Positions are assigned by first-seen order; duplicates keep their first
/// position. Serialized as the plain id list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IdIndex {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl IdIndex {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = IdIndex::default();
        for id in ids {
            let id = id.into();
            if !index.positions.contains_key(&id) {
                index.positions.insert(id.clone(), index.ids.len());
                index.ids.push(id);
            }
        }
        index
    }

    /// Position of an id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Id at a position (the inverse mapping)
    pub fn id(&self, position: usize) -> Option<&str> {
        self.ids.get(position).map(|s| s.as_str())
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl From<Vec<String>> for IdIndex {
    fn from(ids: Vec<String>) -> Self {
        IdIndex::from_ids(ids)
    }
}

impl From<IdIndex> for Vec<String> {
    fn from(index: IdIndex) -> Self {
        index.ids
    }
}

// =============================================================================
// RatingMatrix
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingMatrix {
    values: Array2<f32>,
    observed: Array2<bool>,
    users: IdIndex,
    items: IdIndex,
}

impl RatingMatrix {
    /// Wrap a dense array using the legacy convention: every non-zero cell is a rating
    pub fn from_dense(users: IdIndex, items: IdIndex, values: Array2<f32>) -> Self {
        let observed = values.mapv(|v| v != MISSING);
        Self {
            values,
            observed,
            users,
            items,
        }
    }

    /// (rows, columns) = (users, items)
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn users(&self) -> &IdIndex {
        &self.users
    }

    pub fn items(&self) -> &IdIndex {
        &self.items
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Rating values of one user; unrated cells read as [`MISSING`]
    pub fn row(&self, row: usize) -> ArrayView1<'_, f32> {
        self.values.row(row)
    }

    /// Which cells of a user's row hold a rating
    pub fn observed_row(&self, row: usize) -> ArrayView1<'_, bool> {
        self.observed.row(row)
    }

    pub fn is_rated(&self, row: usize, column: usize) -> bool {
        self.observed.get((row, column)).copied().unwrap_or(false)
    }

    /// Rating of `user_id` for `item_id`, `None` when unrated or unknown
    pub fn get(&self, user_id: &str, item_id: &str) -> Option<f32> {
        let row = self.users.position(user_id)?;
        let column = self.items.position(item_id)?;
        if self.is_rated(row, column) {
            self.values.get((row, column)).copied()
        } else {
            None
        }
    }

    /// Serialize into an opaque snapshot blob
    pub fn to_snapshot(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Write the snapshot to a file
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        info!("Rating matrix snapshot written to {}", path.display());
        Ok(())
    }
}

// =============================================================================
// RatingMatrixBuilder
// =============================================================================

/// Outcome of a build: the matrix plus everything that was skipped
#[derive(Debug, Clone)]
pub struct MatrixBuild {
    pub matrix: RatingMatrix,
    pub report: BuildReport,
}

/// Records written and records dropped during a build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub written: usize,
    /// One `MissingReference` per skipped rating
    pub dropped: Vec<DataLoadError>,
}

#[derive(Debug, Clone, Default)]
pub struct RatingMatrixBuilder {
    zero_as_missing: bool,
}

impl RatingMatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat explicit 0.0 ratings as absent (default: false)
    pub fn with_zero_as_missing(mut self, zero_as_missing: bool) -> Self {
        self.zero_as_missing = zero_as_missing;
        self
    }

    /// Build the matrix with rows from the store's users and columns from the catalog's items
    pub fn build(&self, store: &RatingStore, catalog: &ItemCatalog) -> MatrixBuild {
        let users = IdIndex::from_ids(store.user_ids().iter().cloned());
        let items = IdIndex::from_ids(catalog.ids().iter().cloned());
        self.build_with_indices(store, users, items)
    }

    /// Build the matrix against explicit index mappings
    ///
    /// Ratings whose user or item has no position are dropped and reported;
    /// the build always completes.
    pub fn build_with_indices(
        &self,
        store: &RatingStore,
        users: IdIndex,
        items: IdIndex,
    ) -> MatrixBuild {
        let shape = (users.len(), items.len());
        let mut values = Array2::<f32>::from_elem(shape, MISSING);
        let mut observed = Array2::<bool>::from_elem(shape, false);
        let mut report = BuildReport::default();

        for (user_id, ratings) in store.iter() {
            let Some(row) = users.position(user_id) else {
                debug!("User {} is not in the user index, skipping {} ratings", user_id, ratings.len());
                for _ in 0..ratings.len() {
                    report.dropped.push(DataLoadError::missing_user(user_id));
                }
                continue;
            };

            for (item_id, value) in ratings.iter() {
                let Some(column) = items.position(item_id) else {
                    debug!("Item {} rated by user {} is not in the catalog", item_id, user_id);
                    report.dropped.push(DataLoadError::missing_item(item_id));
                    continue;
                };

                values[[row, column]] = value;
                observed[[row, column]] = !(self.zero_as_missing && value == MISSING);
                report.written += 1;
            }
        }

        if !report.dropped.is_empty() {
            warn!(
                "Dropped {} ratings with unknown user or item while building the rating matrix",
                report.dropped.len()
            );
        }
        info!(
            "Built {}x{} rating matrix from {} ratings",
            shape.0, shape.1, report.written
        );

        MatrixBuild {
            matrix: RatingMatrix {
                values,
                observed,
                users,
                items,
            },
            report,
        }
    }

    /// Replace the whole matrix with a previously saved snapshot
    ///
    /// No validation against the current store or catalog happens here;
    /// keeping them consistent is the caller's job.
    pub fn bulk_load(snapshot: &[u8]) -> Result<RatingMatrix> {
        let matrix: RatingMatrix = serde_json::from_slice(snapshot)?;
        log_loaded(&matrix);
        Ok(matrix)
    }

    /// [`RatingMatrixBuilder::bulk_load`] from a snapshot file
    pub fn load_snapshot(path: &Path) -> Result<RatingMatrix> {
        let reader = BufReader::new(File::open(path)?);
        let matrix: RatingMatrix = serde_json::from_reader(reader)?;
        log_loaded(&matrix);
        Ok(matrix)
    }
}

fn log_loaded(matrix: &RatingMatrix) {
    let (rows, columns) = matrix.shape();
    info!("Loaded {}x{} rating matrix snapshot", rows, columns);
    if matrix.observed.dim() != matrix.values.dim()
        || matrix.users.len() != rows
        || matrix.items.len() != columns
    {
        warn!("Rating matrix snapshot is internally inconsistent: indices or mask disagree with its shape");
    }
}
