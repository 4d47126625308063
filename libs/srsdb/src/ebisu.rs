//! SQLite-backed database scheduled by a Bayesian Beta recall model.

use crate::database::SrsDatabase;
use crate::date_utils::is_storable;
use crate::error::{DbError, Result};
use crate::repository::{
    DueRepository, EbisuRepository, EbisuReview, EbisuStats, ReviewRepository, StateRepository,
};
use crate::schema::EBISU_SCHEMA;
use crate::store::LazyStore;
use chrono::{DateTime, Utc};
use srs_core::{Correctness, Ebisu, EbisuKnobs, EbisuState, SpacedRepetitionAlgorithm};
use std::path::Path;

/// Spaced repetition database using the `ebisu_cards` / `ebisu_reviews` tables.
#[derive(Debug)]
pub struct EbisuDatabase<A = Ebisu> {
    store: LazyStore,
    algorithm: A,
}

impl EbisuDatabase<Ebisu> {
    /// Database at `path` with default knobs. The file is not touched until first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_scheduler(path, Ebisu::default())
    }

    pub fn with_knobs<P: AsRef<Path>>(path: P, knobs: EbisuKnobs) -> Result<Self> {
        Ok(Self::with_scheduler(path, Ebisu::new(knobs)?))
    }

    pub fn knobs(&self) -> &EbisuKnobs {
        self.algorithm.knobs()
    }
}

impl<A> EbisuDatabase<A>
where
    A: SpacedRepetitionAlgorithm<State = EbisuState, Input = f64>,
{
    pub fn with_scheduler<P: AsRef<Path>>(path: P, algorithm: A) -> Self {
        Self {
            store: LazyStore::new(path, &EBISU_SCHEMA),
            algorithm,
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn is_initialized(&self) -> bool {
        self.store.is_ready()
    }

    pub fn card(&mut self, question_key: &str) -> Result<Option<EbisuState>> {
        let conn = self.store.connection()?;
        EbisuRepository::new(conn).get_state(question_key)
    }

    pub fn review_history(&mut self, question_key: &str) -> Result<Vec<EbisuReview>> {
        let conn = self.store.connection()?;
        EbisuRepository::new(conn).get_reviews(question_key)
    }

    pub fn stats(&mut self) -> Result<EbisuStats> {
        let conn = self.store.connection()?;
        EbisuRepository::new(conn).get_stats()
    }
}

impl<A> SrsDatabase for EbisuDatabase<A>
where
    A: SpacedRepetitionAlgorithm<State = EbisuState, Input = f64>,
{
    fn answer(&mut self, now: DateTime<Utc>, question_key: &str, correct: i32) -> Result<()> {
        let correctness = Correctness::new(correct)?;
        if !is_storable(now) {
            return Err(DbError::InvalidInput(format!(
                "answer time {now} is outside years 0000-9999"
            )));
        }
        let success = self.algorithm.input_for(correctness);

        let conn = self.store.connection()?;
        let tx = conn.transaction()?;
        let repo = EbisuRepository::new(&tx);

        let current = repo
            .get_state(question_key)?
            .unwrap_or_else(|| self.algorithm.initial_state(now));
        let result = self.algorithm.schedule(&current, success, now)?;
        let state = &result.new_state;
        if !is_storable(result.next_due) || !is_storable(state.due) {
            return Err(DbError::Backend(format!(
                "due date {} is outside years 0000-9999",
                result.next_due
            )));
        }

        repo.save_state(question_key, state)?;
        repo.insert_review(&EbisuReview {
            id: 0,
            question_key: question_key.to_string(),
            reviewed_at: now,
            correctness: correctness.value(),
            success,
            recall_probability: result.recall_probability,
            alpha: state.alpha,
            beta: state.beta,
            t: state.t,
            due: result.next_due,
        })?;
        tx.commit()?;

        tracing::debug!(
            question_key,
            correct,
            half_life_hours = state.t,
            due = %result.next_due,
            algorithm = self.algorithm.name(),
            "recorded answer"
        );
        Ok(())
    }

    fn next(&mut self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let conn = self.store.connection()?;
        let keys = EbisuRepository::new(conn).get_due_keys(now)?;
        tracing::debug!(due = keys.len(), "fetched due questions");
        Ok(keys)
    }

    fn next_due_date(&mut self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.store.connection()?;
        EbisuRepository::new(conn).get_earliest_due()
    }
}
