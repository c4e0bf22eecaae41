/// This crate is a recommender-systems orchestration engine.
/// It fits content-based models per user or runs graph-based algorithms in batch,
/// and evaluates the produced rankings/predictions against ground truth.
pub mod algorithm;
pub mod config;
pub mod content;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod methodology;
pub mod ratings;
pub mod recsys;
pub mod utils;

#[cfg(test)]
mod testing;

/// Content-Based Recommender
/// Drives one model per user, cloned from a template algorithm.
///
/// Per user, the template is cloned, `process_rated` and `fit` are called on the
/// clone, and the fitted clone is stored in a `FitRegistry`. A user the algorithm
/// refuses to fit is recorded as skipped and the run goes on.
///
/// Item content is acquired from an `ItemsLoader` once per call and released
/// when the call returns, on success and on error.
///
/// Operations:
/// - `fit` / `predict` / `rank`: two passes, models kept in between
/// - `fit_predict` / `fit_rank`: one fused pass, models optionally saved
///
/// With `RecSysConfig::n_jobs > 1` the per-user loop runs on a rayon pool.
pub use recsys::ContentBasedRS;

/// Graph-Based Recommender
/// Delegates a whole user batch to one algorithm call over an `InteractionGraph`.
///
/// Candidates are computed for the entire batch up front (`Methodology::filter_all`)
/// with the graph's own links as the training data.
/// Users with no rankable node are reported through the observer.
pub use recsys::GraphBasedRS;

/// Fit Registry
/// Per-user record of fit attempts: never attempted, skipped (with reason) or fitted.
pub use recsys::{FitRegistry, FitState, FitStatus};

/// Observability hooks and the default `tracing` based implementation
pub use recsys::{NoopObserver, RecSysObserver, RecSysReport, Stage, TracingObserver};

/// Algorithm capabilities
/// - `ContentBasedAlgorithm`: `process_rated`, `fit`, `predict`, `rank` on a single user
/// - `GraphBasedAlgorithm`: `predict`, `rank` on a batch of users over a shared graph
///
/// Reference implementations:
/// - `CentroidVector`: centroid of positive items, cosine ranking
/// - `SimilarityRegressor`: kNN score regression over content similarity
/// - `PersonalizedPageRank`: random walk with restart on the user node
pub use algorithm::{
    CentroidVector, ContentBasedAlgorithm, GraphBasedAlgorithm, PersonalizedPageRank, SimilarityRegressor,
    UserRatings,
};

/// Ratings Store
/// Immutable table of (user, item, score, timestamp) interactions.
///
/// User and item ids are mapped to dense indices once at construction.
/// Rows are grouped by user, so a user's interactions are a contiguous slice.
///
/// # Serialization
/// Supported. Only the rows are written; the index maps are rebuilt on load.
pub use ratings::{Interaction, Ratings};

/// Result containers
/// - `Prediction`: scored (user, item) records, per-user emission order kept
/// - `Rank`: per-user lists sorted by descending score (stable), NaN dropped
pub use ratings::result::{Prediction, Rank, ResultRecord};

/// Item content and its loaders
/// `LoadedItems` is a read-only handle shared by every per-user task.
pub use content::{CborItemsLoader, ItemContent, ItemsLoader, LoadedItems, MemoryItemsLoader};

pub use config::RecSysConfig;
pub use error::{FitError, RecSysError, Result};
pub use graph::{InteractionGraph, Node};
pub use methodology::Methodology;

/// Evaluation stage
/// `EvalModel` validates the fold lists and runs `MetricEvaluator`, which
/// produces a system frame (`sys - fold{i}`, `sys - mean`) and a per-user frame.
pub use evaluation::{EvalModel, Metric, MetricEvaluator, MetricFrame, Split};
