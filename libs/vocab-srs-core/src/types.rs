//! Core types for vocabulary review scheduling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SrsError};

/// Ease factor every word starts with.
pub const INITIAL_EASE: f64 = 2.5;

/// Ease factor floor.
pub const MINIMUM_EASE: f64 = 1.3;

/// Interval (days) at which a word counts as mastered.
pub const MASTERY_INTERVAL_DAYS: u32 = 21;

/// Learner's self-assessed recall quality, 0 (blackout) to 5 (instant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct ReviewQuality(u8);

impl ReviewQuality {
    pub const MAX: u8 = 5;

    /// Validate a raw rating.
    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(SrsError::InvalidQuality { value })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Recall good enough to keep the repetition streak (quality >= 3).
    pub fn is_success(self) -> bool {
        self.0 >= 3
    }

    /// Counted as a correct answer in statistics (quality >= 4).
    ///
    /// Deliberately stricter than [`is_success`](Self::is_success): a quality
    /// of 3 continues the streak but is scored as incorrect.
    pub fn is_correct(self) -> bool {
        self.0 >= 4
    }
}

impl TryFrom<i64> for ReviewQuality {
    type Error = SrsError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<u8> for ReviewQuality {
    type Error = SrsError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value as i64)
    }
}

impl From<ReviewQuality> for u8 {
    fn from(quality: ReviewQuality) -> Self {
        quality.0
    }
}

/// The four answer buttons shown under a flipped card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewButton {
    Again,
    Hard,
    Good,
    Easy,
}

impl ReviewButton {
    /// Quality submitted for this button.
    pub fn quality(self) -> ReviewQuality {
        match self {
            Self::Again => ReviewQuality(1),
            Self::Hard => ReviewQuality(3),
            Self::Good => ReviewQuality(4),
            Self::Easy => ReviewQuality(5),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Again => "Again",
            Self::Hard => "Hard",
            Self::Good => "Good",
            Self::Easy => "Easy",
        }
    }
}

/// Learning status of a word. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordStatus {
    New,
    Learning,
    Review,
    Mastered,
}

impl WordStatus {
    /// Classify from repetitions and interval.
    pub fn classify(repetitions: u32, interval: u32, mastery_interval: u32) -> Self {
        if interval == 0 {
            Self::New
        } else if interval >= mastery_interval {
            Self::Mastered
        } else if repetitions < 2 {
            Self::Learning
        } else {
            Self::Review
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Mastered => "mastered",
        }
    }
}

/// Scheduling state of one word for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub word_id: String,
    pub repetitions: u32,
    pub ease_factor: f64,
    /// Days between `last_reviewed_at` and `next_review_at`. Zero until the
    /// first review.
    pub interval: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

impl ReviewRecord {
    /// A never-reviewed record, due immediately.
    pub fn new(word_id: impl Into<String>) -> Self {
        Self {
            word_id: word_id.into(),
            repetitions: 0,
            ease_factor: INITIAL_EASE,
            interval: 0,
            last_reviewed_at: None,
            next_review_at: None,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    pub fn status(&self) -> WordStatus {
        self.status_with(MASTERY_INTERVAL_DAYS)
    }

    pub fn status_with(&self, mastery_interval: u32) -> WordStatus {
        WordStatus::classify(self.repetitions, self.interval, mastery_interval)
    }

    pub fn is_new(&self) -> bool {
        self.last_reviewed_at.is_none()
    }

    /// When the word becomes due. `None` means due immediately.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.next_review_at
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at {
            Some(due) => due <= now,
            None => true,
        }
    }

    /// Whether the word falls due strictly before `cutoff`. New words
    /// always do.
    pub fn is_due_before(&self, cutoff: DateTime<Utc>) -> bool {
        match self.next_review_at {
            Some(due) => due < cutoff,
            None => true,
        }
    }

    /// How long the word has been due; zero for new or not-yet-due words.
    pub fn overdue_by(&self, now: DateTime<Utc>) -> Duration {
        match self.next_review_at {
            Some(due) if due <= now => now - due,
            _ => Duration::zero(),
        }
    }

    /// Lifetime answers, saturating at `u32::MAX`.
    pub fn total_reviews(&self) -> u32 {
        self.correct_count.saturating_add(self.incorrect_count)
    }

    /// Check the invariants a stored record must satisfy before scheduling.
    pub fn validate(&self, minimum_ease: f64) -> Result<()> {
        if !self.ease_factor.is_finite() {
            return Err(SrsError::invalid_record(
                &self.word_id,
                "ease factor is not a finite number",
            ));
        }
        if self.ease_factor < minimum_ease {
            return Err(SrsError::invalid_record(
                &self.word_id,
                format!(
                    "ease factor {} below minimum {}",
                    self.ease_factor, minimum_ease
                ),
            ));
        }

        match (self.last_reviewed_at, self.next_review_at) {
            (None, None) => {
                if self.repetitions > 0 || self.interval > 0 {
                    return Err(SrsError::invalid_record(
                        &self.word_id,
                        format!(
                            "never reviewed but has repetitions {} and interval {}",
                            self.repetitions, self.interval
                        ),
                    ));
                }
            }
            (None, Some(_)) => {
                return Err(SrsError::invalid_record(
                    &self.word_id,
                    "next review scheduled without a previous review",
                ));
            }
            (Some(_), None) => {
                return Err(SrsError::invalid_record(
                    &self.word_id,
                    "reviewed but has no next review time",
                ));
            }
            (Some(_), Some(_)) => {
                if self.interval == 0 {
                    return Err(SrsError::invalid_record(
                        &self.word_id,
                        "reviewed record has a zero-day interval",
                    ));
                }
            }
        }

        Ok(())
    }
}
