//! # Evaluation Crate
//!
//! Error metrics for recommendation lists.
//!
//! - **metrics**: MAE / RMSE of one list against the user's own ratings
//! - **summary**: averages over many users
//!
//! ## Example Usage
//!
//! ```ignore
//! use evaluation::MetricsEvaluator;
//!
//! let items = recommender.run_strategy(StrategyKind::Popularity, &params)?;
//! let evaluation = MetricsEvaluator::new().evaluate(&store, &params.user_id, &items);
//! println!("{}", evaluation);
//! ```

pub mod metrics;
pub mod summary;

pub use metrics::{Evaluation, EvaluationStatus, MetricsEvaluator, NotComputedReason};
pub use summary::EvaluationSummary;
