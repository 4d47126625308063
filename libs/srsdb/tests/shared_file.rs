//! Both backends in one file, and the facade driven by a scripted scheduler.

mod common;

use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use srsdb::srs_core::{
    CardStatus, Correctness, FsrsState, Rating, SchedulerError, SchedulingResult,
    SpacedRepetitionAlgorithm,
};
use srsdb::{EbisuDatabase, ErrorKind, FsrsDatabase, SrsDatabase};

use common::{days_after, t0, TestFile};

#[test]
fn test_backends_share_a_file() {
    let file = TestFile::new();
    file.add_unrelated_table();
    let mut fsrs = FsrsDatabase::new(file.path());
    let mut ebisu = EbisuDatabase::new(file.path());

    fsrs.answer(t0(), "q1", 90).unwrap();
    ebisu.answer(t0(), "q2", 90).unwrap();

    assert_eq!(
        file.tables(),
        vec!["ebisu_cards", "ebisu_reviews", "fsrs_cards", "fsrs_reviews", "unrelated_table"]
    );
    assert_eq!(fsrs.next(days_after(30)).unwrap(), vec!["q1"]);
    assert_eq!(ebisu.next(days_after(30)).unwrap(), vec!["q2"]);
    assert!(fsrs.card("q2").unwrap().is_none());
    assert!(ebisu.card("q1").unwrap().is_none());
    assert_eq!(file.unrelated_data(), "test");
}

#[test]
fn test_same_key_tracked_independently() {
    let file = TestFile::new();
    let mut fsrs = FsrsDatabase::new(file.path());
    let mut ebisu = EbisuDatabase::new(file.path());

    fsrs.answer(t0(), "shared", 0).unwrap();
    ebisu.answer(t0(), "shared", 100).unwrap();
    ebisu.answer(t0() + Duration::hours(1), "shared", 100).unwrap();

    assert_eq!(fsrs.review_history("shared").unwrap().len(), 1);
    assert_eq!(ebisu.review_history("shared").unwrap().len(), 2);
    assert_eq!(fsrs.card("shared").unwrap().unwrap().lapses, 1);
}

#[test]
fn test_one_backend_conflict_leaves_other_usable() {
    let file = TestFile::new();
    file.raw()
        .execute_batch("CREATE TABLE fsrs_reviews (id INTEGER PRIMARY KEY)")
        .unwrap();

    let mut fsrs = FsrsDatabase::new(file.path());
    assert_eq!(fsrs.next(t0()).unwrap_err().kind(), ErrorKind::Storage);

    let mut ebisu = EbisuDatabase::new(file.path());
    ebisu.answer(t0(), "q1", 50).unwrap();
    assert!(ebisu.next_due_date().unwrap().is_some());
}

/// Scheduler that moves a card a fixed number of hours ahead per rating.
struct FixedIntervals;

impl FixedIntervals {
    fn hours(rating: Rating) -> i64 {
        match rating {
            Rating::Again => 1,
            Rating::Hard => 6,
            Rating::Good => 24,
            Rating::Easy => 72,
        }
    }
}

impl SpacedRepetitionAlgorithm for FixedIntervals {
    type State = FsrsState;
    type Input = Rating;

    fn name(&self) -> &'static str {
        "fixed"
    }

    fn input_for(&self, correctness: Correctness) -> Rating {
        match correctness.value() {
            0..=24 => Rating::Again,
            25..=49 => Rating::Hard,
            50..=84 => Rating::Good,
            _ => Rating::Easy,
        }
    }

    fn initial_state(&self, now: DateTime<Utc>) -> FsrsState {
        FsrsState::new(now)
    }

    fn schedule(
        &self,
        state: &FsrsState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<SchedulingResult<FsrsState>, SchedulerError> {
        let next_due = now + Duration::hours(Self::hours(rating));
        Ok(SchedulingResult {
            new_state: FsrsState {
                status: CardStatus::Review,
                difficulty: 5.0,
                stability: 1.0,
                reps: state.reps + 1,
                last_review: Some(now),
                due: next_due,
                ..state.clone()
            },
            next_due,
            recall_probability: None,
        })
    }
}

/// Scheduler whose every schedule call fails.
struct Broken;

impl SpacedRepetitionAlgorithm for Broken {
    type State = FsrsState;
    type Input = Rating;

    fn name(&self) -> &'static str {
        "broken"
    }

    fn input_for(&self, _correctness: Correctness) -> Rating {
        Rating::Good
    }

    fn initial_state(&self, now: DateTime<Utc>) -> FsrsState {
        FsrsState::new(now)
    }

    fn schedule(
        &self,
        _state: &FsrsState,
        _rating: Rating,
        _now: DateTime<Utc>,
    ) -> Result<SchedulingResult<FsrsState>, SchedulerError> {
        Err(SchedulerError::Numerical("no convergence".to_string()))
    }
}

#[test]
fn test_injected_scheduler_drives_due_dates() {
    let file = TestFile::new();
    let mut db = FsrsDatabase::with_scheduler(file.path(), FixedIntervals);
    db.answer(t0(), "easy", 100).unwrap();
    db.answer(t0(), "again", 0).unwrap();
    db.answer(t0(), "good", 60).unwrap();

    assert_eq!(db.next_due_date().unwrap(), Some(t0() + Duration::hours(1)));
    assert_eq!(db.next(t0() + Duration::hours(23)).unwrap(), vec!["again"]);
    assert_eq!(db.next(t0() + Duration::hours(72)).unwrap(), vec!["again", "good", "easy"]);
}

#[test]
fn test_equal_due_dates_ordered_by_key() {
    let file = TestFile::new();
    let mut db = FsrsDatabase::with_scheduler(file.path(), FixedIntervals);
    for key in ["delta", "bravo", "alpha", "charlie"] {
        db.answer(t0(), key, 70).unwrap();
    }
    let due = t0() + Duration::hours(24);
    assert_eq!(db.next(due - Duration::seconds(1)).unwrap(), Vec::<String>::new());
    assert_eq!(db.next(due).unwrap(), vec!["alpha", "bravo", "charlie", "delta"]);
}

#[test]
fn test_scheduler_failure_writes_nothing() {
    let file = TestFile::new();
    let mut db = FsrsDatabase::with_scheduler(file.path(), Broken);
    let err = db.answer(t0(), "q1", 80).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(db.is_initialized());
    assert_eq!(file.count("fsrs_cards"), 0);
    assert_eq!(file.count("fsrs_reviews"), 0);
}
