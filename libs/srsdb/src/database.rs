//! The backend-independent database contract.

use crate::error::Result;
use chrono::{DateTime, Utc};

/// A spaced repetition store that schedules questions by answer correctness.
///
/// Every operation opens the underlying file and initializes the backend's
/// tables on first use; construction performs no I/O.
pub trait SrsDatabase {
    /// Record an answer to `question_key` with `correct` in 0..=100.
    ///
    /// Loads (or creates) the question's memory state, reschedules it and
    /// appends one history row, all in a single transaction. Values of
    /// `correct` outside the range fail with an invalid-input error before
    /// anything is touched.
    fn answer(&mut self, now: DateTime<Utc>, question_key: &str, correct: i32) -> Result<()>;

    /// Questions due at or before `now`, earliest due first, ties broken by key.
    fn next(&mut self, now: DateTime<Utc>) -> Result<Vec<String>>;

    /// Earliest due date over all answered questions, or `None` if none exist.
    fn next_due_date(&mut self) -> Result<Option<DateTime<Utc>>>;
}
