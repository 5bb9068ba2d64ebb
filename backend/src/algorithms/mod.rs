//! Numerical building blocks for the forecast engine and the query resolver.

pub mod additive;
pub mod linalg;
pub mod metrics;
pub mod similarity;
pub mod stats;

pub use additive::{AdditiveModel, ModelSpec};
pub use metrics::fit_metrics;
pub use similarity::{scorer_for, LevenshteinRatio, SequenceRatio, SimilarityScorer};
