//! Database error types.

use srs_core::SchedulerError;
use thiserror::Error;

/// Result type alias using DbError.
pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("table {table} already exists without required column {column}")]
    SchemaConflict { table: String, column: String },

    #[error("table {table} already exists but {column} is not a unique key")]
    KeyNotUnique { table: String, column: String },

    #[error("scheduling backend error: {0}")]
    Backend(String),
}

/// Broad category of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed a value outside the accepted range.
    InvalidInput,
    /// Knobs failed validation.
    Config,
    /// SQLite failed, or the file holds data the store cannot use.
    Storage,
    /// The scheduling algorithm rejected its state or could not compute a schedule.
    Backend,
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Sqlite(_) | Self::SchemaConflict { .. } | Self::KeyNotUnique { .. } => {
                ErrorKind::Storage
            }
            Self::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl From<SchedulerError> for DbError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::InvalidCorrectness(_) => Self::InvalidInput(err.to_string()),
            SchedulerError::InvalidKnobs(_) => Self::InvalidConfig(err.to_string()),
            SchedulerError::InvalidState(_) | SchedulerError::Numerical(_) => {
                Self::Backend(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_errors_map_to_kinds() {
        assert_eq!(
            DbError::from(SchedulerError::InvalidCorrectness(101)).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            DbError::from(SchedulerError::InvalidKnobs("w".into())).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            DbError::from(SchedulerError::InvalidState("alpha".into())).kind(),
            ErrorKind::Backend
        );
        assert_eq!(
            DbError::from(SchedulerError::Numerical("sum".into())).kind(),
            ErrorKind::Backend
        );
    }

    #[test]
    fn schema_conflict_is_storage() {
        let err = DbError::SchemaConflict {
            table: "fsrs_cards".into(),
            column: "due".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(
            err.to_string(),
            "table fsrs_cards already exists without required column due"
        );
        let err = DbError::KeyNotUnique {
            table: "ebisu_cards".into(),
            column: "question_key".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn invalid_correctness_message() {
        let err = DbError::from(SchedulerError::InvalidCorrectness(-1));
        assert_eq!(err.to_string(), "invalid input: correctness -1 is outside 0..=100");
    }
}
