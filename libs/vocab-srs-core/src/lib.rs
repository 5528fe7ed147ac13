//! Spaced repetition core for vocabulary review.
//!
//! Provides:
//! - SM-2 scheduling of per-word review records
//! - Due-set selection (overdue backlog first, then new words)
//! - A steppable review session with running statistics
//! - Vocabulary statistics over a deck of review records
//!
//! Everything here is pure: no I/O, no clocks. Callers pass `now` in and
//! persist the records that come back.

pub mod algorithm;
pub mod error;
pub mod selector;
pub mod session;
pub mod stats;
pub mod types;

pub use algorithm::{get_algorithm, schedule, sm2::Sm2, SpacedRepetitionAlgorithm};
pub use error::{Result, SrsError};
pub use selector::{select_due, DueSummary};
pub use session::{CardFailure, ReviewOutcome, ReviewSink, Session, SessionPhase, SessionStats};
pub use stats::VocabularyStats;
pub use types::{ReviewButton, ReviewQuality, ReviewRecord, WordStatus};
