//! Repository pattern for database access.
//!
//! Repositories borrow a connection (or a transaction, which derefs to one) and
//! never open, create or commit anything themselves.

use crate::date_utils::{
    format_timestamp, optional_timestamp_column, timestamp_column, upper_bound,
};
use crate::error::Result;
use crate::schema::{EBISU_CARDS, EBISU_REVIEWS, FSRS_CARDS, FSRS_REVIEWS};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use srs_core::{CardStatus, EbisuState, FsrsState, Rating};

/// Repository for current per-question memory state.
pub trait StateRepository {
    type State;

    fn get_state(&self, question_key: &str) -> Result<Option<Self::State>>;
    /// Insert or fully replace the state for `question_key`.
    fn save_state(&self, question_key: &str, state: &Self::State) -> Result<()>;
}

/// Repository for the append-only answer history.
pub trait ReviewRepository {
    type Review;

    fn insert_review(&self, review: &Self::Review) -> Result<i64>;
    /// History for one question, ordered by stored review time then insertion.
    fn get_reviews(&self, question_key: &str) -> Result<Vec<Self::Review>>;
    fn count_reviews(&self) -> Result<usize>;
}

/// Repository for due-date queries over the current state table.
pub trait DueRepository {
    /// Keys due at or before `now`, earliest due first, ties by key.
    fn get_due_keys(&self, now: DateTime<Utc>) -> Result<Vec<String>>;
    fn get_earliest_due(&self) -> Result<Option<DateTime<Utc>>>;
}

fn due_keys(conn: &Connection, table: &str, now: DateTime<Utc>) -> Result<Vec<String>> {
    let Some(bound) = upper_bound(now) else {
        return Ok(Vec::new());
    };
    let sql = format!(
        "SELECT question_key FROM {table} WHERE due <= ?1 ORDER BY due ASC, question_key ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let keys = stmt
        .query_map(params![bound], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(keys)
}

fn earliest_due(conn: &Connection, table: &str) -> Result<Option<DateTime<Utc>>> {
    let sql = format!("SELECT MIN(due) FROM {table}");
    let due = conn.query_row(&sql, [], |row| optional_timestamp_column(row, 0))?;
    Ok(due)
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count as usize)
}

fn status_column(row: &Row, idx: usize) -> rusqlite::Result<CardStatus> {
    let value: i64 = row.get(idx)?;
    u8::try_from(value)
        .ok()
        .and_then(CardStatus::from_value)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn rating_column(row: &Row, idx: usize) -> rusqlite::Result<Rating> {
    let value: i64 = row.get(idx)?;
    u8::try_from(value)
        .ok()
        .and_then(Rating::from_value)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

/// One recorded FSRS answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FsrsReview {
    /// Assigned by the database; ignored on insert.
    pub id: i64,
    pub question_key: String,
    pub reviewed_at: DateTime<Utc>,
    pub correctness: u8,
    pub rating: Rating,
    pub state: CardStatus,
    pub difficulty: f64,
    pub stability: f64,
    pub elapsed_days: f64,
    pub scheduled_days: f64,
    pub due: DateTime<Utc>,
}

/// Aggregate statistics over the FSRS tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FsrsStats {
    pub total_cards: usize,
    pub average_difficulty: f64,
    pub average_stability: f64,
    pub average_reps: f64,
    pub total_lapses: u64,
    pub total_reviews: usize,
}

/// FSRS tables over a borrowed connection.
pub struct FsrsRepository<'c> {
    conn: &'c Connection,
}

impl<'c> FsrsRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn row_to_state(row: &Row) -> rusqlite::Result<FsrsState> {
        Ok(FsrsState {
            difficulty: row.get(0)?,
            stability: row.get(1)?,
            reps: row.get(2)?,
            lapses: row.get(3)?,
            status: status_column(row, 4)?,
            elapsed_days: row.get(5)?,
            scheduled_days: row.get(6)?,
            last_review: optional_timestamp_column(row, 7)?,
            due: timestamp_column(row, 8)?,
        })
    }

    fn row_to_review(row: &Row) -> rusqlite::Result<FsrsReview> {
        Ok(FsrsReview {
            id: row.get(0)?,
            question_key: row.get(1)?,
            reviewed_at: timestamp_column(row, 2)?,
            correctness: row.get(3)?,
            rating: rating_column(row, 4)?,
            state: status_column(row, 5)?,
            difficulty: row.get(6)?,
            stability: row.get(7)?,
            elapsed_days: row.get(8)?,
            scheduled_days: row.get(9)?,
            due: timestamp_column(row, 10)?,
        })
    }

    pub fn get_stats(&self) -> Result<FsrsStats> {
        let (total_cards, average_difficulty, average_stability, average_reps, total_lapses) =
            self.conn.query_row(
                "SELECT COUNT(*), AVG(difficulty), AVG(stability), AVG(reps), SUM(lapses) FROM fsrs_cards",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )?;

        Ok(FsrsStats {
            total_cards: total_cards as usize,
            average_difficulty: average_difficulty.unwrap_or(0.0),
            average_stability: average_stability.unwrap_or(0.0),
            average_reps: average_reps.unwrap_or(0.0),
            total_lapses: total_lapses.unwrap_or(0) as u64,
            total_reviews: self.count_reviews()?,
        })
    }
}

impl StateRepository for FsrsRepository<'_> {
    type State = FsrsState;

    fn get_state(&self, question_key: &str) -> Result<Option<FsrsState>> {
        self.conn
            .query_row(
                "SELECT difficulty, stability, reps, lapses, state, elapsed_days, scheduled_days, last_review, due
                 FROM fsrs_cards WHERE question_key = ?1",
                params![question_key],
                Self::row_to_state,
            )
            .optional()
            .map_err(Into::into)
    }

    fn save_state(&self, question_key: &str, state: &FsrsState) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO fsrs_cards (question_key, difficulty, stability, reps, lapses, state, elapsed_days, scheduled_days, last_review, due)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                question_key,
                state.difficulty,
                state.stability,
                state.reps,
                state.lapses,
                state.status.to_value(),
                state.elapsed_days,
                state.scheduled_days,
                state.last_review.map(format_timestamp),
                format_timestamp(state.due),
            ],
        )?;
        Ok(())
    }
}

impl ReviewRepository for FsrsRepository<'_> {
    type Review = FsrsReview;

    fn insert_review(&self, review: &FsrsReview) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO fsrs_reviews (question_key, reviewed_at, correctness, rating, state, difficulty, stability, elapsed_days, scheduled_days, due)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                review.question_key,
                format_timestamp(review.reviewed_at),
                review.correctness,
                review.rating.to_value(),
                review.state.to_value(),
                review.difficulty,
                review.stability,
                review.elapsed_days,
                review.scheduled_days,
                format_timestamp(review.due),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_reviews(&self, question_key: &str) -> Result<Vec<FsrsReview>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question_key, reviewed_at, correctness, rating, state, difficulty, stability, elapsed_days, scheduled_days, due
             FROM fsrs_reviews WHERE question_key = ?1 ORDER BY reviewed_at ASC, id ASC",
        )?;
        let reviews = stmt
            .query_map(params![question_key], Self::row_to_review)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn count_reviews(&self) -> Result<usize> {
        count_rows(self.conn, FSRS_REVIEWS)
    }
}

impl DueRepository for FsrsRepository<'_> {
    fn get_due_keys(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        due_keys(self.conn, FSRS_CARDS, now)
    }

    fn get_earliest_due(&self) -> Result<Option<DateTime<Utc>>> {
        earliest_due(self.conn, FSRS_CARDS)
    }
}

/// One recorded Ebisu answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EbisuReview {
    /// Assigned by the database; ignored on insert.
    pub id: i64,
    pub question_key: String,
    pub reviewed_at: DateTime<Utc>,
    pub correctness: u8,
    pub success: f64,
    /// Predicted recall just before this answer was applied.
    pub recall_probability: Option<f64>,
    pub alpha: f64,
    pub beta: f64,
    pub t: f64,
    pub due: DateTime<Utc>,
}

/// Minimum, mean and maximum of the logged recall probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallSummary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Aggregate statistics over the Ebisu tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EbisuStats {
    pub total_cards: usize,
    pub average_alpha: f64,
    pub average_beta: f64,
    pub average_half_life_hours: f64,
    pub average_reviews: f64,
    pub total_reviews: usize,
    /// `None` until a review with a recall estimate exists.
    pub recall: Option<RecallSummary>,
}

/// Ebisu tables over a borrowed connection.
pub struct EbisuRepository<'c> {
    conn: &'c Connection,
}

impl<'c> EbisuRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn row_to_state(row: &Row) -> rusqlite::Result<EbisuState> {
        Ok(EbisuState {
            alpha: row.get(0)?,
            beta: row.get(1)?,
            t: row.get(2)?,
            total_reviews: row.get(3)?,
            last_review: timestamp_column(row, 4)?,
            due: timestamp_column(row, 5)?,
        })
    }

    fn row_to_review(row: &Row) -> rusqlite::Result<EbisuReview> {
        Ok(EbisuReview {
            id: row.get(0)?,
            question_key: row.get(1)?,
            reviewed_at: timestamp_column(row, 2)?,
            correctness: row.get(3)?,
            success: row.get(4)?,
            recall_probability: row.get(5)?,
            alpha: row.get(6)?,
            beta: row.get(7)?,
            t: row.get(8)?,
            due: timestamp_column(row, 9)?,
        })
    }

    pub fn get_stats(&self) -> Result<EbisuStats> {
        let (total_cards, average_alpha, average_beta, average_t, average_reviews) =
            self.conn.query_row(
                "SELECT COUNT(*), AVG(alpha), AVG(beta), AVG(t), AVG(total_reviews) FROM ebisu_cards",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                    ))
                },
            )?;

        let recall = self.conn.query_row(
            "SELECT AVG(recall_probability), MIN(recall_probability), MAX(recall_probability)
             FROM ebisu_reviews WHERE recall_probability IS NOT NULL",
            [],
            |row| {
                let average: Option<f64> = row.get(0)?;
                let min: Option<f64> = row.get(1)?;
                let max: Option<f64> = row.get(2)?;
                Ok(match (average, min, max) {
                    (Some(average), Some(min), Some(max)) => Some(RecallSummary { average, min, max }),
                    _ => None,
                })
            },
        )?;

        Ok(EbisuStats {
            total_cards: total_cards as usize,
            average_alpha: average_alpha.unwrap_or(0.0),
            average_beta: average_beta.unwrap_or(0.0),
            average_half_life_hours: average_t.unwrap_or(0.0),
            average_reviews: average_reviews.unwrap_or(0.0),
            total_reviews: self.count_reviews()?,
            recall,
        })
    }
}

impl StateRepository for EbisuRepository<'_> {
    type State = EbisuState;

    fn get_state(&self, question_key: &str) -> Result<Option<EbisuState>> {
        self.conn
            .query_row(
                "SELECT alpha, beta, t, total_reviews, last_review, due FROM ebisu_cards WHERE question_key = ?1",
                params![question_key],
                Self::row_to_state,
            )
            .optional()
            .map_err(Into::into)
    }

    fn save_state(&self, question_key: &str, state: &EbisuState) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO ebisu_cards (question_key, alpha, beta, t, total_reviews, last_review, due)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                question_key,
                state.alpha,
                state.beta,
                state.t,
                state.total_reviews,
                format_timestamp(state.last_review),
                format_timestamp(state.due),
            ],
        )?;
        Ok(())
    }
}

impl ReviewRepository for EbisuRepository<'_> {
    type Review = EbisuReview;

    fn insert_review(&self, review: &EbisuReview) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO ebisu_reviews (question_key, reviewed_at, correctness, success, recall_probability, alpha, beta, t, due)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                review.question_key,
                format_timestamp(review.reviewed_at),
                review.correctness,
                review.success,
                review.recall_probability,
                review.alpha,
                review.beta,
                review.t,
                format_timestamp(review.due),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_reviews(&self, question_key: &str) -> Result<Vec<EbisuReview>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question_key, reviewed_at, correctness, success, recall_probability, alpha, beta, t, due
             FROM ebisu_reviews WHERE question_key = ?1 ORDER BY reviewed_at ASC, id ASC",
        )?;
        let reviews = stmt
            .query_map(params![question_key], Self::row_to_review)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn count_reviews(&self) -> Result<usize> {
        count_rows(self.conn, EBISU_REVIEWS)
    }
}

impl DueRepository for EbisuRepository<'_> {
    fn get_due_keys(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        due_keys(self.conn, EBISU_CARDS, now)
    }

    fn get_earliest_due(&self) -> Result<Option<DateTime<Utc>>> {
        earliest_due(self.conn, EBISU_CARDS)
    }
}
