//! Spaced repetition scheduling.

pub mod sm2;

use crate::error::Result;
use crate::types::{ReviewQuality, ReviewRecord};
use chrono::{DateTime, Utc};

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate the record that results from reviewing `record` at `now`.
    fn schedule(
        &self,
        record: &ReviewRecord,
        quality: ReviewQuality,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord>;

    /// Initial record for a word that has never been reviewed.
    fn initial_record(&self, word_id: &str) -> ReviewRecord;
}

/// Get algorithm by name.
pub fn get_algorithm(name: &str) -> Option<Box<dyn SpacedRepetitionAlgorithm>> {
    match name {
        "sm2" => Some(Box::new(sm2::Sm2::default())),
        _ => None,
    }
}

/// Schedule one review with default SM-2 parameters.
///
/// `record` is `None` the first time `word_id` is reviewed.
pub fn schedule(
    record: Option<&ReviewRecord>,
    word_id: &str,
    quality: ReviewQuality,
    now: DateTime<Utc>,
) -> Result<ReviewRecord> {
    sm2::Sm2::default().schedule_optional(record, word_id, quality, now)
}
