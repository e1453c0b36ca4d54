//! Error types for the recommendation engine.
//!
//! Only conditions the caller has to act on are errors. Degenerate numeric
//! cases (zero norms, zero neighbour weight) resolve to fallback values
//! inside the strategies and never reach this enum.

use data_loader::UserId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The served user has no ratings in the store
    #[error("Unknown user: {user_id}")]
    UnknownUser { user_id: UserId },

    /// The served user has no row in the rating matrix
    ///
    /// Happens with a stale snapshot, or when a context that was built
    /// without a matrix is handed to a matrix-based strategy.
    #[error("User {user_id} has no row in the rating matrix")]
    MissingMatrixRow { user_id: UserId },

    /// A content profile cannot be built because the user's ratings sum to zero
    #[error("User {user_id} has zero total rating weight, cannot build a content profile")]
    ColdStart { user_id: UserId },

    #[error("Snapshot I/O error: {0}")]
    SnapshotIo(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    SnapshotFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
