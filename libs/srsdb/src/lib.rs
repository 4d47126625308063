//! Spaced repetition scheduling state persisted in SQLite.
//!
//! Two backends share the [`SrsDatabase`] contract and can live side by side in
//! one file, each in its own tables:
//! - [`FsrsDatabase`]: deterministic difficulty/stability model (`fsrs_*` tables)
//! - [`EbisuDatabase`]: Bayesian Beta recall model (`ebisu_*` tables)
//!
//! ```no_run
//! use chrono::Utc;
//! use srsdb::{FsrsDatabase, SrsDatabase};
//!
//! let mut db = FsrsDatabase::new("study.db");
//! db.answer(Utc::now(), "capital-of-peru", 90)?;
//! let due = db.next(Utc::now())?;
//! # Ok::<(), srsdb::DbError>(())
//! ```

pub mod database;
pub mod date_utils;
pub mod ebisu;
pub mod error;
pub mod fsrs;
pub mod repository;
pub mod schema;
mod store;

pub use database::SrsDatabase;
pub use ebisu::EbisuDatabase;
pub use error::{DbError, ErrorKind, Result};
pub use fsrs::FsrsDatabase;
pub use repository::{
    DueRepository, EbisuRepository, EbisuReview, EbisuStats, FsrsRepository, FsrsReview,
    FsrsStats, RecallSummary, ReviewRepository, StateRepository,
};
pub use srs_core;
