//! Bayesian recall model in the style of Ebisu.
//!
//! Recall probability `t` hours after a review is modelled as `p ~ Beta(alpha, beta)`;
//! at any other elapsed time `e` the recall probability is `p^(e / t)`. Each
//! answer is treated as a noisy observation of recall and the posterior is
//! moment-matched back into a Beta at a re-centred reference time.

use super::special::{ln_beta, ln_weighted_sum, solve_decreasing};
use super::{after_hours, hours_between, SchedulingResult, SpacedRepetitionAlgorithm};
use crate::correctness::Correctness;
use crate::error::{Result, SchedulerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tunable parameters for the Beta recall model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EbisuKnobs {
    /// Reference time of a brand new card's prior, in hours.
    pub default_half_life_hours: f64,
    /// Shape of the initial prior; beta uses the same value.
    pub default_alpha: f64,
    /// A card is due once its predicted recall falls to this level.
    pub recall_threshold: f64,
    /// Recall level the model's reference time is re-centred on after an update.
    pub target_recall: f64,
    /// Floor on the elapsed time fed into an update.
    pub min_elapsed_hours: f64,
}

impl Default for EbisuKnobs {
    fn default() -> Self {
        Self {
            default_half_life_hours: 24.0,
            default_alpha: 3.0,
            recall_threshold: 0.5,
            target_recall: 0.5,
            min_elapsed_hours: 0.1,
        }
    }
}

impl EbisuKnobs {
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SchedulerError::InvalidKnobs(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };
        let probability = |name: &str, value: f64| {
            if value > 0.0 && value < 1.0 {
                Ok(())
            } else {
                Err(SchedulerError::InvalidKnobs(format!(
                    "{name} must be in (0, 1), got {value}"
                )))
            }
        };
        positive("default_half_life_hours", self.default_half_life_hours)?;
        positive("default_alpha", self.default_alpha)?;
        positive("min_elapsed_hours", self.min_elapsed_hours)?;
        probability("recall_threshold", self.recall_threshold)?;
        probability("target_recall", self.target_recall)
    }
}

/// Beta distribution over recall probability at `t` hours after review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaModel {
    pub alpha: f64,
    pub beta: f64,
    pub t: f64,
}

impl BetaModel {
    fn validate(&self) -> Result<()> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta), ("t", self.t)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SchedulerError::InvalidState(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Expected recall probability `elapsed` hours after the last review.
    pub fn predict_recall(&self, elapsed: f64) -> f64 {
        let delta = elapsed.max(0.0) / self.t;
        (ln_beta(self.alpha + delta, self.beta) - ln_beta(self.alpha, self.beta)).exp()
    }

    /// Hours after the last review until predicted recall falls to `recall`.
    pub fn hours_until_recall(&self, recall: f64) -> Result<f64> {
        let ratio = solve_decreasing(|x| Ok(self.predict_recall(x * self.t)), recall)?;
        Ok(ratio * self.t)
    }

    /// Posterior after observing `success` (0-1) `elapsed` hours after review,
    /// re-centred so that its mean recall at the new `t` equals `target`.
    pub fn update(&self, success: f64, elapsed: f64, target: f64) -> Result<Self> {
        let Self { alpha, beta, t } = *self;
        let delta = elapsed / t;

        // Noisy-Bernoulli observation: q1 = P(result | recalled), q0 = P(result | forgot).
        let passed = success > 0.5;
        let q1 = if passed { success } else { 1.0 - success };
        let q0 = 1.0 - q1;
        let (c, d) = if passed { (q1 - q0, q0) } else { (q0 - q1, 1.0 - q0) };

        let ln_den = ln_weighted_sum(&[
            (c, ln_beta(alpha + delta, beta)),
            (d, ln_beta(alpha, beta)),
        ])?;
        // n-th posterior moment of recall at `ratio * t` hours.
        let moment = |n: f64, ratio: f64| -> Result<f64> {
            let ln_num = ln_weighted_sum(&[
                (c, ln_beta(alpha + delta + n * ratio, beta)),
                (d, ln_beta(alpha + n * ratio, beta)),
            ])?;
            Ok((ln_num - ln_den).exp())
        };

        let ratio = solve_decreasing(|r| moment(1.0, r), target)?;
        let mean = moment(1.0, ratio)?;
        let second = moment(2.0, ratio)?;
        let (new_alpha, new_beta) = mean_var_to_beta(mean, second - mean * mean)?;
        Ok(Self {
            alpha: new_alpha,
            beta: new_beta,
            t: ratio * t,
        })
    }
}

fn mean_var_to_beta(mean: f64, var: f64) -> Result<(f64, f64)> {
    if !(mean > 0.0 && mean < 1.0 && var > 0.0 && var < mean * (1.0 - mean)) {
        return Err(SchedulerError::Numerical(format!(
            "cannot fit a Beta to mean {mean} and variance {var}"
        )));
    }
    let common = mean * (1.0 - mean) / var - 1.0;
    Ok((mean * common, (1.0 - mean) * common))
}

/// Per-card Beta model state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EbisuState {
    pub alpha: f64,
    pub beta: f64,
    /// Reference elapsed time of the model, in hours.
    pub t: f64,
    pub total_reviews: u32,
    pub last_review: DateTime<Utc>,
    pub due: DateTime<Utc>,
}

impl EbisuState {
    pub fn model(&self) -> BetaModel {
        BetaModel {
            alpha: self.alpha,
            beta: self.beta,
            t: self.t,
        }
    }
}

/// Beta recall model scheduler.
#[derive(Debug, Clone, Default)]
pub struct Ebisu {
    knobs: EbisuKnobs,
}

impl Ebisu {
    pub fn new(knobs: EbisuKnobs) -> Result<Self> {
        knobs.validate()?;
        Ok(Self { knobs })
    }

    pub fn knobs(&self) -> &EbisuKnobs {
        &self.knobs
    }
}

impl SpacedRepetitionAlgorithm for Ebisu {
    type State = EbisuState;
    /// Soft success in [0, 1].
    type Input = f64;

    fn name(&self) -> &'static str {
        "ebisu"
    }

    fn input_for(&self, correctness: Correctness) -> f64 {
        correctness.as_fraction()
    }

    fn initial_state(&self, now: DateTime<Utc>) -> EbisuState {
        EbisuState {
            alpha: self.knobs.default_alpha,
            beta: self.knobs.default_alpha,
            t: self.knobs.default_half_life_hours,
            total_reviews: 0,
            last_review: now,
            due: now,
        }
    }

    fn schedule(
        &self,
        state: &EbisuState,
        success: f64,
        now: DateTime<Utc>,
    ) -> Result<SchedulingResult<EbisuState>> {
        let prior = state.model();
        prior.validate()?;
        if !(0.0..=1.0).contains(&success) {
            return Err(SchedulerError::InvalidState(format!(
                "success must be within 0-1, got {success}"
            )));
        }

        let elapsed = hours_between(state.last_review, now).max(self.knobs.min_elapsed_hours);
        let recall_probability = prior.predict_recall(elapsed);
        let posterior = prior.update(success, elapsed, self.knobs.target_recall)?;
        let interval = posterior.hours_until_recall(self.knobs.recall_threshold)?;
        let next_due = after_hours(now, interval)?;

        Ok(SchedulingResult {
            new_state: EbisuState {
                alpha: posterior.alpha,
                beta: posterior.beta,
                t: posterior.t,
                total_reviews: state.total_reviews + 1,
                last_review: now,
                due: next_due,
            },
            next_due,
            recall_probability: Some(recall_probability),
        })
    }
}
