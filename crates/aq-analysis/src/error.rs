//! Error types for network analyses.

use aq_network::NetError;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// An augmenting path selected a pipe without positive remaining
    /// capacity. The search predicate rules this out, so hitting it means
    /// the working copy was corrupted.
    #[error("augmenting path crossed {from}-{to} with capacity {capacity}")]
    InvalidPath {
        from: String,
        to: String,
        capacity: f64,
    },

    #[error(transparent)]
    Net(#[from] NetError),
}
