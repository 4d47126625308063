//! FSRS (Free Spaced Repetition Scheduler) algorithm.
//!
//! Deterministic model based on memory research using DSR model:
//! - Difficulty (D): Card difficulty 1-10
//! - Stability (S): Days until retention drops to target
//! - Retrievability (R): Probability of recall

use super::{after_days, hours_between, SchedulingResult, SpacedRepetitionAlgorithm};
use crate::correctness::{Correctness, RatingThresholds};
use crate::error::{Result, SchedulerError};
use crate::types::{CardStatus, Rating};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// FSRS-4.5 default parameters (17 weights).
pub const DEFAULT_WEIGHTS: [f64; 17] = [
    0.4, 0.6, 2.4, 5.8, // w[0-3]: initial stability for Again, Hard, Good, Easy
    4.93,  // w[4]: initial difficulty base
    0.94,  // w[5]: initial difficulty modifier
    0.86,  // w[6]: difficulty decay
    0.01,  // w[7]: mean reversion weight
    1.49,  // w[8]: stability exp base
    0.14,  // w[9]: stability decay
    0.94,  // w[10]: retrievability effect
    2.18,  // w[11]: forget stability base
    0.05,  // w[12]: difficulty on forget
    0.34,  // w[13]: stability on forget
    1.26,  // w[14]: retrievability on forget
    0.29,  // w[15]: hard penalty
    2.61,  // w[16]: easy bonus
];

/// Tunable FSRS parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsrsKnobs {
    pub rating_thresholds: RatingThresholds,
    pub w: [f64; 17],
    pub request_retention: f64,
    /// Upper bound on any interval, in days.
    pub maximum_interval: f64,
}

impl Default for FsrsKnobs {
    fn default() -> Self {
        Self {
            rating_thresholds: RatingThresholds::default(),
            w: DEFAULT_WEIGHTS,
            request_retention: 0.9,
            maximum_interval: 36500.0,
        }
    }
}

impl FsrsKnobs {
    pub fn validate(&self) -> Result<()> {
        self.rating_thresholds.validate()?;
        if !(self.request_retention > 0.0 && self.request_retention < 1.0) {
            return Err(SchedulerError::InvalidKnobs(format!(
                "request_retention must be in (0, 1), got {}",
                self.request_retention
            )));
        }
        if !(self.maximum_interval.is_finite() && self.maximum_interval > 0.0) {
            return Err(SchedulerError::InvalidKnobs(format!(
                "maximum_interval must be positive, got {}",
                self.maximum_interval
            )));
        }
        if let Some(i) = self.w.iter().position(|w| !w.is_finite()) {
            return Err(SchedulerError::InvalidKnobs(format!("weight w[{i}] is not finite")));
        }
        Ok(())
    }
}

/// Per-card FSRS memory state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsState {
    pub status: CardStatus,
    pub difficulty: f64,
    pub stability: f64,
    pub reps: u32,
    pub lapses: u32,
    /// Days between the previous review and the latest one.
    pub elapsed_days: f64,
    /// Days between the latest review and the due date.
    pub scheduled_days: f64,
    pub last_review: Option<DateTime<Utc>>,
    pub due: DateTime<Utc>,
}

impl FsrsState {
    /// A card with no reviews, due immediately.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: CardStatus::New,
            difficulty: 0.0,
            stability: 0.0,
            reps: 0,
            lapses: 0,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            last_review: None,
            due: now,
        }
    }

    fn is_first_review(&self) -> bool {
        self.reps == 0 || self.status == CardStatus::New
    }

    fn validate(&self) -> Result<()> {
        if !self.stability.is_finite() || self.stability < 0.0 {
            return Err(SchedulerError::InvalidState(format!(
                "stability must be a non-negative number, got {}",
                self.stability
            )));
        }
        if !self.difficulty.is_finite() {
            return Err(SchedulerError::InvalidState(format!(
                "difficulty must be finite, got {}",
                self.difficulty
            )));
        }
        if !self.is_first_review() {
            if !(1.0..=10.0).contains(&self.difficulty) {
                return Err(SchedulerError::InvalidState(format!(
                    "difficulty must be within 1-10 after a review, got {}",
                    self.difficulty
                )));
            }
            if self.stability <= 0.0 {
                return Err(SchedulerError::InvalidState(
                    "reviewed card has zero stability".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// FSRS algorithm with configurable parameters.
#[derive(Debug, Clone, Default)]
pub struct Fsrs {
    knobs: FsrsKnobs,
}

impl Fsrs {
    pub fn new(knobs: FsrsKnobs) -> Result<Self> {
        knobs.validate()?;
        Ok(Self { knobs })
    }

    pub fn knobs(&self) -> &FsrsKnobs {
        &self.knobs
    }
}

impl SpacedRepetitionAlgorithm for Fsrs {
    type State = FsrsState;
    type Input = Rating;

    fn name(&self) -> &'static str {
        "fsrs"
    }

    fn input_for(&self, correctness: Correctness) -> Rating {
        self.knobs.rating_thresholds.rating_for(correctness)
    }

    fn initial_state(&self, now: DateTime<Utc>) -> FsrsState {
        FsrsState::new(now)
    }

    fn schedule(
        &self,
        state: &FsrsState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<SchedulingResult<FsrsState>> {
        state.validate()?;
        let rating_value = rating.to_value();
        let elapsed = state
            .last_review
            .map(|last| (hours_between(last, now) / 24.0).max(0.0))
            .unwrap_or(0.0);

        let (new_stability, new_difficulty) = if state.is_first_review() {
            (
                self.initial_stability(rating_value),
                self.initial_difficulty(rating_value),
            )
        } else {
            self.schedule_subsequent_review(state, rating_value, elapsed)
        };

        let new_interval = if rating == Rating::Again {
            self.short_term_interval(new_stability)
        } else {
            self.interval_from_stability(new_stability)
        };
        let lapses = if rating == Rating::Again {
            state.lapses + 1
        } else {
            state.lapses
        };

        let next_due = after_days(now, new_interval)?;

        Ok(SchedulingResult {
            new_state: FsrsState {
                status: Self::determine_status(state.status, rating),
                difficulty: new_difficulty,
                stability: new_stability,
                reps: state.reps + 1,
                lapses,
                elapsed_days: elapsed,
                scheduled_days: new_interval,
                last_review: Some(now),
                due: next_due,
            },
            next_due,
            recall_probability: None,
        })
    }
}

impl Fsrs {
    fn w(&self) -> &[f64; 17] {
        &self.knobs.w
    }

    /// Calculate initial stability for a new card based on first rating.
    /// S0(G) = w[G-1] where G is rating 1-4
    fn initial_stability(&self, rating: u8) -> f64 {
        let index = (rating.saturating_sub(1)) as usize;
        self.w()[index.min(3)].max(0.1)
    }

    /// Calculate initial difficulty for a new card based on first rating.
    /// D0(G) = w[4] - w[5] * (G - 3)
    fn initial_difficulty(&self, rating: u8) -> f64 {
        let d0 = self.w()[4] - self.w()[5] * (rating as f64 - 3.0);
        d0.clamp(1.0, 10.0)
    }

    /// Calculate next difficulty using mean reversion.
    /// D' = w[7] * D0(G) + (1 - w[7]) * D
    /// Apply decay: D'' = D' - w[6] * (G - 3)
    fn next_difficulty(&self, current_d: f64, rating: u8) -> f64 {
        let w = self.w();
        let d0 = self.initial_difficulty(rating);
        let d_new = w[7] * d0 + (1.0 - w[7]) * current_d;
        let d_decayed = d_new - w[6] * (rating as f64 - 3.0);
        d_decayed.clamp(1.0, 10.0)
    }

    /// Calculate retrievability (probability of recall).
    /// R = (1 + t / (9 * S))^(-1)
    pub fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        if stability <= 0.0 {
            return 0.0;
        }
        let factor = 1.0 + elapsed_days / (9.0 * stability);
        factor.powf(-1.0)
    }

    /// Calculate next stability after successful recall.
    /// S' = S * (e^(w[8]) * (11 - D) * S^(-w[9]) * (e^(w[10]*(1-R)) - 1) + 1) * modifier
    fn next_stability_recall(
        &self,
        stability: f64,
        difficulty: f64,
        retrievability: f64,
        rating: u8,
    ) -> f64 {
        let w = self.w();
        let exp_w8 = w[8].exp();
        let d_factor = (11.0 - difficulty).max(0.1);
        let s_decay = stability.powf(-w[9]);
        let r_factor = (w[10] * (1.0 - retrievability)).exp() - 1.0;

        let growth = exp_w8 * d_factor * s_decay * r_factor + 1.0;

        let modifier = match rating {
            2 => w[15], // Hard penalty
            4 => w[16], // Easy bonus
            _ => 1.0,
        };

        let new_s = stability * growth * modifier;
        new_s.max(0.1).min(self.knobs.maximum_interval)
    }

    /// Calculate next stability after forgetting (lapse).
    /// S' = w[11] * D^(-w[12]) * ((S+1)^w[13] - 1) * e^(w[14]*(1-R))
    fn next_stability_forget(&self, stability: f64, difficulty: f64, retrievability: f64) -> f64 {
        let w = self.w();
        let d_factor = difficulty.max(1.0).powf(-w[12]);
        let s_factor = (stability + 1.0).powf(w[13]) - 1.0;
        let r_factor = (w[14] * (1.0 - retrievability)).exp();

        let new_s = w[11] * d_factor * s_factor * r_factor;
        // Never exceed previous stability on lapse
        new_s.max(0.1).min(stability)
    }

    /// Calculate optimal interval from stability.
    /// I = 9 * S * (1/R - 1) where R = request_retention
    fn interval_from_stability(&self, stability: f64) -> f64 {
        let interval = 9.0 * stability * (1.0 / self.knobs.request_retention - 1.0);
        interval.max(1.0).min(self.knobs.maximum_interval)
    }

    /// Calculate short-term interval for relearning after a lapse.
    fn short_term_interval(&self, stability: f64) -> f64 {
        // 10 minutes to 1 day based on stability
        let minutes = (stability * 60.0).clamp(10.0, 1440.0);
        minutes / 1440.0
    }

    /// Determine new status based on current status and rating.
    fn determine_status(current: CardStatus, rating: Rating) -> CardStatus {
        match (current, rating) {
            (_, Rating::Again) => CardStatus::Relearning,
            (CardStatus::New | CardStatus::Learning, Rating::Hard) => CardStatus::Learning,
            (CardStatus::Relearning, Rating::Hard) => CardStatus::Relearning,
            _ => CardStatus::Review,
        }
    }

    /// Update stability and difficulty for a card that has been reviewed before.
    fn schedule_subsequent_review(&self, state: &FsrsState, rating: u8, elapsed: f64) -> (f64, f64) {
        let r = self.retrievability(elapsed, state.stability);
        let new_d = self.next_difficulty(state.difficulty, rating);
        let new_s = if rating == 1 {
            self.next_stability_forget(state.stability, state.difficulty, r)
        } else {
            self.next_stability_recall(state.stability, state.difficulty, r, rating)
        };
        (new_s, new_d)
    }
}
