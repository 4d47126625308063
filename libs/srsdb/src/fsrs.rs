//! SQLite-backed database scheduled by FSRS.

use crate::database::SrsDatabase;
use crate::date_utils::is_storable;
use crate::error::{DbError, Result};
use crate::repository::{
    DueRepository, FsrsRepository, FsrsReview, FsrsStats, ReviewRepository, StateRepository,
};
use crate::schema::FSRS_SCHEMA;
use crate::store::LazyStore;
use chrono::{DateTime, Utc};
use srs_core::{Correctness, Fsrs, FsrsKnobs, FsrsState, Rating, SpacedRepetitionAlgorithm};
use std::path::Path;

/// Spaced repetition database using the `fsrs_cards` / `fsrs_reviews` tables.
///
/// The algorithm is a type parameter so alternative implementations (or test
/// doubles) can be injected with [`FsrsDatabase::with_scheduler`].
#[derive(Debug)]
pub struct FsrsDatabase<A = Fsrs> {
    store: LazyStore,
    algorithm: A,
}

impl FsrsDatabase<Fsrs> {
    /// Database at `path` with default knobs. The file is not touched until first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_scheduler(path, Fsrs::default())
    }

    pub fn with_knobs<P: AsRef<Path>>(path: P, knobs: FsrsKnobs) -> Result<Self> {
        Ok(Self::with_scheduler(path, Fsrs::new(knobs)?))
    }

    pub fn knobs(&self) -> &FsrsKnobs {
        self.algorithm.knobs()
    }
}

impl<A> FsrsDatabase<A>
where
    A: SpacedRepetitionAlgorithm<State = FsrsState, Input = Rating>,
{
    pub fn with_scheduler<P: AsRef<Path>>(path: P, algorithm: A) -> Self {
        Self {
            store: LazyStore::new(path, &FSRS_SCHEMA),
            algorithm,
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Whether the file has been opened and the schema brought up.
    pub fn is_initialized(&self) -> bool {
        self.store.is_ready()
    }

    /// Current memory state of a question, if it has ever been answered.
    pub fn card(&mut self, question_key: &str) -> Result<Option<FsrsState>> {
        let conn = self.store.connection()?;
        FsrsRepository::new(conn).get_state(question_key)
    }

    /// Answer history of a question, ordered by the `now` each answer was given.
    pub fn review_history(&mut self, question_key: &str) -> Result<Vec<FsrsReview>> {
        let conn = self.store.connection()?;
        FsrsRepository::new(conn).get_reviews(question_key)
    }

    pub fn stats(&mut self) -> Result<FsrsStats> {
        let conn = self.store.connection()?;
        FsrsRepository::new(conn).get_stats()
    }
}

impl<A> SrsDatabase for FsrsDatabase<A>
where
    A: SpacedRepetitionAlgorithm<State = FsrsState, Input = Rating>,
{
    fn answer(&mut self, now: DateTime<Utc>, question_key: &str, correct: i32) -> Result<()> {
        let correctness = Correctness::new(correct)?;
        if !is_storable(now) {
            return Err(DbError::InvalidInput(format!(
                "answer time {now} is outside years 0000-9999"
            )));
        }
        let rating = self.algorithm.input_for(correctness);

        let conn = self.store.connection()?;
        let tx = conn.transaction()?;
        let repo = FsrsRepository::new(&tx);

        let current = repo
            .get_state(question_key)?
            .unwrap_or_else(|| self.algorithm.initial_state(now));
        let result = self.algorithm.schedule(&current, rating, now)?;
        let state = &result.new_state;
        if !is_storable(result.next_due) || !is_storable(state.due) {
            return Err(DbError::Backend(format!(
                "due date {} is outside years 0000-9999",
                result.next_due
            )));
        }

        repo.save_state(question_key, state)?;
        repo.insert_review(&FsrsReview {
            id: 0,
            question_key: question_key.to_string(),
            reviewed_at: now,
            correctness: correctness.value(),
            rating,
            state: state.status,
            difficulty: state.difficulty,
            stability: state.stability,
            elapsed_days: state.elapsed_days,
            scheduled_days: state.scheduled_days,
            due: result.next_due,
        })?;
        tx.commit()?;

        tracing::debug!(
            question_key,
            correct,
            rating = ?rating,
            due = %result.next_due,
            algorithm = self.algorithm.name(),
            "recorded answer"
        );
        Ok(())
    }

    fn next(&mut self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let conn = self.store.connection()?;
        let keys = FsrsRepository::new(conn).get_due_keys(now)?;
        tracing::debug!(due = keys.len(), "fetched due questions");
        Ok(keys)
    }

    fn next_due_date(&mut self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.store.connection()?;
        FsrsRepository::new(conn).get_earliest_due()
    }
}
