//! Review session over a due set.
//!
//! A session shows one card at a time. Each card takes exactly one review
//! submission, after which the cursor moves on; there is no skip or undo.
//! Once every card has been reviewed the session is complete and a new one
//! has to be started from a fresh due set.
//!
//! Sessions are single-writer. Callers that share one between tasks must
//! serialize submissions themselves.

use std::convert::Infallible;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::{sm2::Sm2, SpacedRepetitionAlgorithm};
use crate::error::{Result, SrsError};
use crate::types::{ReviewQuality, ReviewRecord};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    InProgress,
    Complete,
}

/// Running tally for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub reviewed: usize,
    pub correct: usize,
    pub incorrect: usize,
}

impl SessionStats {
    fn record(&mut self, quality: ReviewQuality) {
        self.reviewed += 1;
        if quality.is_correct() {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    /// Percentage of correct answers, rounded. Zero before any review.
    pub fn accuracy(&self) -> u32 {
        if self.reviewed == 0 {
            return 0;
        }
        (self.correct as f64 / self.reviewed as f64 * 100.0).round() as u32
    }
}

/// A card whose updated record could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFailure {
    pub word_id: String,
    pub message: String,
}

impl From<CardFailure> for SrsError {
    fn from(failure: CardFailure) -> Self {
        SrsError::PersistenceFailure {
            word_id: failure.word_id,
            message: failure.message,
        }
    }
}

/// Result of one review submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub updated_record: ReviewRecord,
    pub stats: SessionStats,
    /// Set when the sink rejected the updated record. The session has
    /// already moved on.
    pub persistence_error: Option<CardFailure>,
}

/// Write-back channel for updated records.
pub trait ReviewSink {
    type Error: Display;

    fn persist(&mut self, record: &ReviewRecord) -> std::result::Result<(), Self::Error>;
}

/// Collects updated records in memory.
impl ReviewSink for Vec<ReviewRecord> {
    type Error = Infallible;

    fn persist(&mut self, record: &ReviewRecord) -> std::result::Result<(), Infallible> {
        self.push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    cards: Vec<ReviewRecord>,
    cursor: usize,
    stats: SessionStats,
    failures: Vec<CardFailure>,
    algorithm: Sm2,
}

impl Session {
    /// Start a session over `due_set` with default SM-2 parameters.
    pub fn start(due_set: Vec<ReviewRecord>) -> Self {
        Self::with_algorithm(due_set, Sm2::default())
    }

    pub fn with_algorithm(due_set: Vec<ReviewRecord>, algorithm: Sm2) -> Self {
        Self {
            cards: due_set,
            cursor: 0,
            stats: SessionStats::default(),
            failures: Vec::new(),
            algorithm,
        }
    }

    /// The card awaiting review, if any.
    pub fn current(&self) -> Option<&ReviewRecord> {
        self.cards.get(self.cursor)
    }

    /// Like [`current`](Self::current), but reports an empty or finished
    /// session as [`SrsError::EmptySession`].
    pub fn try_current(&self) -> Result<&ReviewRecord> {
        self.current().ok_or(SrsError::EmptySession)
    }

    /// Review the current card and advance.
    ///
    /// If the card's record is rejected by the scheduler the error is
    /// returned and the session does not move.
    pub fn submit_review(
        &mut self,
        quality: ReviewQuality,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        let card = self.cards.get(self.cursor).ok_or(SrsError::EmptySession)?;
        let updated = self.algorithm.schedule(card, quality, now)?;

        self.cards[self.cursor] = updated.clone();
        self.cursor += 1;
        self.stats.record(quality);

        Ok(ReviewOutcome {
            updated_record: updated,
            stats: self.stats,
            persistence_error: None,
        })
    }

    /// Review the current card, advance, then hand the result to `sink`.
    ///
    /// A sink failure does not undo the review: it is kept on the session
    /// and returned in [`ReviewOutcome::persistence_error`].
    pub fn submit_review_into<S: ReviewSink>(
        &mut self,
        quality: ReviewQuality,
        now: DateTime<Utc>,
        sink: &mut S,
    ) -> Result<ReviewOutcome> {
        let mut outcome = self.submit_review(quality, now)?;
        if let Err(err) = sink.persist(&outcome.updated_record) {
            let failure =
                self.record_persistence_failure(&outcome.updated_record.word_id, err.to_string());
            outcome.persistence_error = Some(failure);
        }
        Ok(outcome)
    }

    /// Note that the record for `word_id` was not stored.
    pub fn record_persistence_failure(
        &mut self,
        word_id: &str,
        message: impl Into<String>,
    ) -> CardFailure {
        let failure = CardFailure {
            word_id: word_id.to_string(),
            message: message.into(),
        };
        self.failures.push(failure.clone());
        failure
    }

    pub fn phase(&self) -> SessionPhase {
        if self.cursor >= self.cards.len() {
            SessionPhase::Complete
        } else if self.cursor == 0 {
            SessionPhase::Idle
        } else {
            SessionPhase::InProgress
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == SessionPhase::Complete
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn failures(&self) -> &[CardFailure] {
        &self.failures
    }

    /// Cards in session order; reviewed ones hold their updated records.
    pub fn records(&self) -> &[ReviewRecord] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Index of the current card.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::select_due;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 18, 0, 0).unwrap()
    }

    fn q(value: i64) -> ReviewQuality {
        ReviewQuality::new(value).unwrap()
    }

    fn deck(words: &[&str]) -> Vec<ReviewRecord> {
        words.iter().map(|w| ReviewRecord::new(*w)).collect()
    }

    struct FailingSink {
        fail_on: &'static str,
        stored: Vec<String>,
    }

    impl ReviewSink for FailingSink {
        type Error = String;

        fn persist(&mut self, record: &ReviewRecord) -> std::result::Result<(), String> {
            if record.word_id == self.fail_on {
                return Err("disk full".to_string());
            }
            self.stored.push(record.word_id.clone());
            Ok(())
        }
    }

    #[test]
    fn starts_idle_with_first_card_current() {
        let session = Session::start(deck(&["hola", "agua"]));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.current().unwrap().word_id, "hola");
        assert_eq!(session.stats(), SessionStats::default());
        assert_eq!(session.remaining(), 2);
    }

    #[test]
    fn empty_session_is_complete() {
        let mut session = Session::start(Vec::new());
        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert_eq!(session.try_current(), Err(SrsError::EmptySession));
        assert_eq!(
            session.submit_review(q(4), now()),
            Err(SrsError::EmptySession)
        );
    }

    #[test]
    fn walks_through_every_card_once() {
        let mut session = Session::start(deck(&["hola", "agua", "casa"]));

        let outcome = session.submit_review(q(5), now()).unwrap();
        assert_eq!(outcome.updated_record.word_id, "hola");
        assert_eq!(outcome.updated_record.interval, 1);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.current().unwrap().word_id, "agua");

        let outcome = session.submit_review(q(3), now()).unwrap();
        assert_eq!(outcome.updated_record.word_id, "agua");
        assert_eq!(
            outcome.stats,
            SessionStats {
                reviewed: 2,
                correct: 1,
                incorrect: 1,
            }
        );

        let outcome = session.submit_review(q(0), now()).unwrap();
        assert_eq!(outcome.updated_record.word_id, "casa");
        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert_eq!(session.position(), 3);
    }

    #[test]
    fn complete_session_rejects_more_reviews() {
        let mut session = Session::start(deck(&["hola"]));
        session.submit_review(q(4), now()).unwrap();

        let before = session.stats();
        assert_eq!(
            session.submit_review(q(4), now()),
            Err(SrsError::EmptySession)
        );
        assert_eq!(session.stats(), before);
    }

    #[test]
    fn full_session_counts_add_up() {
        let words = ["a", "b", "c", "d", "e", "f", "g"];
        let qualities = [5, 4, 3, 2, 1, 0, 4];
        let mut session = Session::start(deck(&words));
        let mut sink: Vec<ReviewRecord> = Vec::new();

        for quality in qualities {
            session
                .submit_review_into(q(quality), now(), &mut sink)
                .unwrap();
        }

        let stats = session.stats();
        assert_eq!(sink.len(), words.len());
        assert_eq!(stats.reviewed, words.len());
        assert_eq!(stats.correct + stats.incorrect, words.len());
        assert_eq!(stats.correct, 3);
        assert_eq!(stats.accuracy(), 43);
        assert!(session.is_complete());
    }

    #[test]
    fn records_reflect_reviews() {
        let mut session = Session::start(deck(&["hola", "agua"]));
        session.submit_review(q(5), now()).unwrap();

        let records = session.records();
        assert_eq!(records[0].repetitions, 1);
        assert_eq!(records[0].next_review_at, Some(now() + Duration::days(1)));
        assert!(records[1].is_new());
    }

    #[test]
    fn persistence_failure_does_not_stop_session() {
        let mut session = Session::start(deck(&["hola", "agua", "casa"]));
        let mut sink = FailingSink {
            fail_on: "agua",
            stored: Vec::new(),
        };

        let first = session.submit_review_into(q(4), now(), &mut sink).unwrap();
        assert!(first.persistence_error.is_none());

        let second = session.submit_review_into(q(4), now(), &mut sink).unwrap();
        assert_eq!(
            second.persistence_error,
            Some(CardFailure {
                word_id: "agua".to_string(),
                message: "disk full".to_string(),
            })
        );
        assert_eq!(session.current().unwrap().word_id, "casa");

        session.submit_review_into(q(4), now(), &mut sink).unwrap();
        assert!(session.is_complete());
        assert_eq!(sink.stored, vec!["hola".to_string(), "casa".to_string()]);
        assert_eq!(session.failures().len(), 1);
        assert_eq!(session.stats().reviewed, 3);
    }

    #[test]
    fn card_failure_converts_to_error() {
        let failure = CardFailure {
            word_id: "hola".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(
            SrsError::from(failure),
            SrsError::PersistenceFailure {
                word_id: "hola".to_string(),
                message: "timeout".to_string(),
            }
        );
    }

    #[test]
    fn corrupt_card_blocks_without_advancing() {
        let mut corrupt = ReviewRecord::new("roto");
        corrupt.ease_factor = 1.0;
        let mut session = Session::start(vec![corrupt]);

        let result = session.submit_review(q(4), now());
        assert!(matches!(result, Err(SrsError::InvalidRecord { .. })));
        assert_eq!(session.position(), 0);
        assert_eq!(session.stats().reviewed, 0);
    }

    #[test]
    fn session_from_selected_due_set() {
        let mut overdue = ReviewRecord::new("ayer");
        overdue.repetitions = 1;
        overdue.interval = 1;
        overdue.last_reviewed_at = Some(now() - Duration::days(2));
        overdue.next_review_at = Some(now() - Duration::days(1));
        overdue.correct_count = 1;

        let records = vec![ReviewRecord::new("nuevo"), overdue];
        let mut session = Session::start(select_due(&records, now(), None));

        assert_eq!(session.current().unwrap().word_id, "ayer");
        let outcome = session.submit_review(q(4), now()).unwrap();
        assert_eq!(outcome.updated_record.repetitions, 2);
        assert_eq!(outcome.updated_record.interval, 6);
        assert_eq!(session.current().unwrap().word_id, "nuevo");
    }

    #[test]
    fn accuracy_before_reviews_is_zero() {
        assert_eq!(SessionStats::default().accuracy(), 0);
    }
}
