//! Core types shared by the scheduling algorithms.

use serde::{Deserialize, Serialize};

/// Card learning status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl CardStatus {
    /// Numeric code used in storage (0-3).
    pub fn to_value(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Review => 2,
            Self::Relearning => 3,
        }
    }

    /// Create from storage code.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::New),
            1 => Some(Self::Learning),
            2 => Some(Self::Review),
            3 => Some(Self::Relearning),
            _ => None,
        }
    }
}

/// Rating for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in [
            CardStatus::New,
            CardStatus::Learning,
            CardStatus::Review,
            CardStatus::Relearning,
        ] {
            assert_eq!(CardStatus::from_value(status.to_value()), Some(status));
        }
        assert_eq!(CardStatus::from_value(4), None);
        assert_eq!(CardStatus::default(), CardStatus::New);
    }

    #[test]
    fn rating_values() {
        assert_eq!(Rating::Again.to_value(), 1);
        assert_eq!(Rating::Easy.to_value(), 4);
        assert_eq!(Rating::from_value(0), None);
        assert!(Rating::Again < Rating::Hard && Rating::Good < Rating::Easy);
    }
}
