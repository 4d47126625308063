//! Error types for srs-core.

use thiserror::Error;

/// Result type alias using SchedulerError.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors raised while mapping answers or computing a schedule.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("correctness {0} is outside 0..=100")]
    InvalidCorrectness(i32),

    #[error("invalid knobs: {0}")]
    InvalidKnobs(String),

    #[error("invalid memory state: {0}")]
    InvalidState(String),

    #[error("numerical failure: {0}")]
    Numerical(String),
}
