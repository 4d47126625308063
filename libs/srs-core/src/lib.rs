//! Core scheduling library for spaced repetition databases.
//!
//! Provides:
//! - Correctness mapping from a 0-100 score into algorithm inputs
//! - Spaced repetition algorithm implementations (FSRS, Ebisu-style Beta model)
//! - Shared types (CardStatus, Rating, per-algorithm memory states)

pub mod algorithm;
pub mod correctness;
pub mod error;
pub mod types;

pub use algorithm::ebisu::{BetaModel, Ebisu, EbisuKnobs, EbisuState};
pub use algorithm::fsrs::{Fsrs, FsrsKnobs, FsrsState};
pub use algorithm::{SchedulingResult, SpacedRepetitionAlgorithm};
pub use correctness::{Correctness, RatingThresholds};
pub use error::{Result, SchedulerError};
pub use types::{CardStatus, Rating};
