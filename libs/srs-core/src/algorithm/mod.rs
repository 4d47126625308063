//! Spaced repetition algorithm implementations.

pub mod ebisu;
pub mod fsrs;
mod special;

use crate::correctness::Correctness;
use crate::error::{Result, SchedulerError};
use chrono::{DateTime, Duration, Utc};

/// Result of scheduling a card after review.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingResult<S> {
    pub new_state: S,
    pub next_due: DateTime<Utc>,
    /// Predicted probability of recall at review time, for models that track one.
    pub recall_probability: Option<f64>,
}

/// Trait for spaced repetition algorithms.
///
/// Implementations must be deterministic: the same state, input and `now`
/// always produce the same result.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Per-card memory state the algorithm reads and replaces.
    type State: Clone + std::fmt::Debug;
    /// Native answer input (a discrete rating, a success probability, ...).
    type Input: Copy + std::fmt::Debug;

    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Convert a validated correctness score into the native input.
    fn input_for(&self, correctness: Correctness) -> Self::Input;

    /// State for a card that has never been answered.
    fn initial_state(&self, now: DateTime<Utc>) -> Self::State;

    /// Calculate next review state after a review.
    fn schedule(
        &self,
        state: &Self::State,
        input: Self::Input,
        now: DateTime<Utc>,
    ) -> Result<SchedulingResult<Self::State>>;
}

/// `now` moved forward by a fractional number of days, to the millisecond.
pub(crate) fn after_days(now: DateTime<Utc>, days: f64) -> Result<DateTime<Utc>> {
    after_millis(now, days * 86_400_000.0)
}

/// `now` moved forward by a fractional number of hours, to the millisecond.
pub(crate) fn after_hours(now: DateTime<Utc>, hours: f64) -> Result<DateTime<Utc>> {
    after_millis(now, hours * 3_600_000.0)
}

fn after_millis(now: DateTime<Utc>, millis: f64) -> Result<DateTime<Utc>> {
    let millis = millis.round();
    // i64::MAX as f64 rounds up, so the bound is exclusive.
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(SchedulerError::Numerical(format!(
            "interval of {millis} ms is out of range"
        )));
    }
    Duration::try_milliseconds(millis as i64)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or_else(|| {
            SchedulerError::Numerical(format!("due date {millis} ms after {now} is out of range"))
        })
}

/// Fractional hours from `earlier` to `later`; negative if out of order.
pub(crate) fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    later.signed_duration_since(earlier).num_milliseconds() as f64 / 3_600_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn fractional_offsets_round_to_milliseconds() {
        assert_eq!(after_hours(now(), 1.5).unwrap(), now() + Duration::minutes(90));
        assert_eq!(after_days(now(), 0.25).unwrap(), now() + Duration::hours(6));
        assert_eq!(after_hours(now(), 0.4 / 3_600_000.0).unwrap(), now());
    }

    #[test]
    fn oversized_offsets_are_errors() {
        for hours in [1e20, 1e300, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                after_hours(now(), hours),
                Err(SchedulerError::Numerical(_))
            ));
        }
        // Representable as a duration but past the last supported date.
        assert!(matches!(
            after_days(now(), 1e9),
            Err(SchedulerError::Numerical(_))
        ));
    }
}
