//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2: the ease factor moves with every review, failed
//! recalls restart the interval ladder, and successful ones climb it
//! (1 day, 6 days, then the previous interval times the ease factor).

use super::SpacedRepetitionAlgorithm;
use crate::error::Result;
use crate::types::{
    ReviewQuality, ReviewRecord, WordStatus, INITIAL_EASE, MASTERY_INTERVAL_DAYS, MINIMUM_EASE,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub first_interval: u32,
    pub second_interval: u32,
    pub mastery_interval: u32,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: INITIAL_EASE,
            minimum_ease: MINIMUM_EASE,
            first_interval: 1,
            second_interval: 6,
            mastery_interval: MASTERY_INTERVAL_DAYS,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_record(&self, word_id: &str) -> ReviewRecord {
        ReviewRecord {
            ease_factor: self.initial_ease,
            ..ReviewRecord::new(word_id)
        }
    }

    fn schedule(
        &self,
        record: &ReviewRecord,
        quality: ReviewQuality,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord> {
        record.validate(self.minimum_ease)?;

        let ease_factor = self.next_ease(record.ease_factor, quality);

        let (repetitions, interval) = if quality.is_success() {
            let repetitions = record.repetitions.saturating_add(1);
            (repetitions, self.next_interval(repetitions, record.interval, ease_factor))
        } else {
            // Lapse: restart learning
            (0, self.first_interval)
        };

        let correct = quality.is_correct();

        Ok(ReviewRecord {
            word_id: record.word_id.clone(),
            repetitions,
            ease_factor,
            interval,
            last_reviewed_at: Some(now),
            next_review_at: Some(
                now.checked_add_signed(Duration::days(i64::from(interval)))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            ),
            // Lifetime counters stop at u32::MAX
            correct_count: record.correct_count.saturating_add(u32::from(correct)),
            incorrect_count: record.incorrect_count.saturating_add(u32::from(!correct)),
        })
    }
}

impl Sm2 {
    /// Schedule a review of a word that may not have a record yet.
    pub fn schedule_optional(
        &self,
        record: Option<&ReviewRecord>,
        word_id: &str,
        quality: ReviewQuality,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord> {
        match record {
            Some(record) => self.schedule(record, quality, now),
            None => self.schedule(&self.initial_record(word_id), quality, now),
        }
    }

    /// Status of a record under this configuration's mastery threshold.
    pub fn status(&self, record: &ReviewRecord) -> WordStatus {
        record.status_with(self.mastery_interval)
    }

    fn next_ease(&self, ease_factor: f64, quality: ReviewQuality) -> f64 {
        let miss = (ReviewQuality::MAX - quality.value()) as f64;
        (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(self.minimum_ease)
    }

    fn next_interval(&self, repetitions: u32, interval: u32, ease_factor: f64) -> u32 {
        match repetitions {
            1 => self.first_interval,
            2 => self.second_interval,
            // float-to-int casts saturate, so huge intervals clamp to u32::MAX
            _ => ((interval as f64 * ease_factor).round() as u32).max(1),
        }
    }
}
