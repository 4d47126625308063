//! Conversion of the public 0-100 correctness score into algorithm inputs.

use crate::error::{Result, SchedulerError};
use crate::types::Rating;
use serde::{Deserialize, Serialize};

/// A validated answer score between 0 (wrong) and 100 (perfect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Correctness(u8);

impl Correctness {
    pub const MIN: i32 = 0;
    pub const MAX: i32 = 100;

    /// Validate a raw score.
    pub fn new(value: i32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(SchedulerError::InvalidCorrectness(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Linear scaling into [0, 1], used as a soft success by belief models.
    pub fn as_fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl TryFrom<i32> for Correctness {
    type Error = SchedulerError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Correctness> for i32 {
    fn from(c: Correctness) -> Self {
        i32::from(c.0)
    }
}

/// Minimum correctness needed for each passing rating.
///
/// Anything below `hard` is rated Again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingThresholds {
    pub hard: u8,
    pub good: u8,
    pub easy: u8,
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self {
            hard: 25,
            good: 50,
            easy: 85,
        }
    }
}

impl RatingThresholds {
    /// Map a correctness score into one of the four rating classes.
    pub fn rating_for(&self, correctness: Correctness) -> Rating {
        let value = correctness.value();
        if value < self.hard {
            Rating::Again
        } else if value < self.good {
            Rating::Hard
        } else if value < self.easy {
            Rating::Good
        } else {
            Rating::Easy
        }
    }

    /// Thresholds must be strictly increasing and leave room for an Again band.
    pub fn validate(&self) -> Result<()> {
        let ordered = 0 < self.hard && self.hard < self.good && self.good < self.easy;
        if !ordered || i32::from(self.easy) > Correctness::MAX {
            return Err(SchedulerError::InvalidKnobs(format!(
                "rating thresholds must satisfy 0 < hard < good < easy <= 100, got {}/{}/{}",
                self.hard, self.good, self.easy
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(value: i32) -> Correctness {
        Correctness::new(value).unwrap()
    }

    #[test]
    fn accepts_full_range() {
        for value in 0..=100 {
            assert!(Correctness::new(value).is_ok(), "{value} should be accepted");
        }
    }

    #[test]
    fn rejects_out_of_range() {
        for value in [-100, -1, 101, 255, i32::MAX, i32::MIN] {
            assert_eq!(
                Correctness::new(value),
                Err(SchedulerError::InvalidCorrectness(value))
            );
        }
    }

    #[test]
    fn default_threshold_boundaries() {
        let thresholds = RatingThresholds::default();
        assert_eq!(thresholds.rating_for(c(0)), Rating::Again);
        assert_eq!(thresholds.rating_for(c(24)), Rating::Again);
        assert_eq!(thresholds.rating_for(c(25)), Rating::Hard);
        assert_eq!(thresholds.rating_for(c(49)), Rating::Hard);
        assert_eq!(thresholds.rating_for(c(50)), Rating::Good);
        assert_eq!(thresholds.rating_for(c(84)), Rating::Good);
        assert_eq!(thresholds.rating_for(c(85)), Rating::Easy);
        assert_eq!(thresholds.rating_for(c(100)), Rating::Easy);
    }

    #[test]
    fn strict_thresholds() {
        let thresholds = RatingThresholds {
            hard: 30,
            good: 60,
            easy: 90,
        };
        assert_eq!(thresholds.rating_for(c(29)), Rating::Again);
        assert_eq!(thresholds.rating_for(c(59)), Rating::Hard);
        assert_eq!(thresholds.rating_for(c(89)), Rating::Good);
        assert_eq!(thresholds.rating_for(c(90)), Rating::Easy);
    }

    #[test]
    fn rating_never_improves_with_lower_correctness() {
        let thresholds = RatingThresholds::default();
        for value in 1..=100 {
            assert!(thresholds.rating_for(c(value - 1)) <= thresholds.rating_for(c(value)));
        }
    }

    #[test]
    fn fraction_is_linear() {
        assert_eq!(c(0).as_fraction(), 0.0);
        assert_eq!(c(50).as_fraction(), 0.5);
        assert_eq!(c(75).as_fraction(), 0.75);
        assert_eq!(c(100).as_fraction(), 1.0);
    }

    #[test]
    fn unordered_thresholds_rejected() {
        let bad = RatingThresholds {
            hard: 50,
            good: 50,
            easy: 85,
        };
        assert!(bad.validate().is_err());
        let too_high = RatingThresholds {
            hard: 25,
            good: 50,
            easy: 101,
        };
        assert!(too_high.validate().is_err());
        assert!(RatingThresholds::default().validate().is_ok());
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Correctness>("101").is_err());
        assert_eq!(serde_json::from_str::<Correctness>("42").unwrap(), c(42));
    }
}
