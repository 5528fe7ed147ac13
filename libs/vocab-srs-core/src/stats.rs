//! Deck-level vocabulary statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ReviewRecord, WordStatus, MASTERY_INTERVAL_DAYS};

/// Summary of a learner's deck at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyStats {
    pub total_words: usize,
    pub words_new: usize,
    pub words_learning: usize,
    /// Words past the learning phase (`review` or `mastered`).
    pub words_learned: usize,
    pub words_mastered: usize,
    /// Reviewed words whose next review is due.
    pub reviews_due: usize,
    /// Reviewed words due before the end of the current UTC day.
    pub reviews_due_today: usize,
    /// Never-reviewed words waiting to be introduced.
    pub new_available: usize,
    /// New words to introduce today: `new_available` under the daily cap.
    pub new_words_today: usize,
    /// Lifetime correct answers as a rounded percentage.
    pub accuracy: u32,
}

impl VocabularyStats {
    pub fn from_records(records: &[ReviewRecord], now: DateTime<Utc>) -> Self {
        Self::compute(records, now, MASTERY_INTERVAL_DAYS)
    }

    pub fn compute(records: &[ReviewRecord], now: DateTime<Utc>, mastery_interval: u32) -> Self {
        let mut stats = Self {
            total_words: records.len(),
            ..Self::default()
        };
        let mut correct: u64 = 0;
        let mut answered: u64 = 0;
        let end_of_day = end_of_day(now);

        for record in records {
            match record.status_with(mastery_interval) {
                WordStatus::New => stats.words_new += 1,
                WordStatus::Learning => stats.words_learning += 1,
                WordStatus::Review => stats.words_learned += 1,
                WordStatus::Mastered => {
                    stats.words_learned += 1;
                    stats.words_mastered += 1;
                }
            }

            if record.is_new() {
                stats.new_available += 1;
            } else {
                if record.is_due(now) {
                    stats.reviews_due += 1;
                }
                if end_of_day.map_or(true, |end| record.is_due_before(end)) {
                    stats.reviews_due_today += 1;
                }
            }

            correct += u64::from(record.correct_count);
            answered += u64::from(record.correct_count) + u64::from(record.incorrect_count);
        }
        stats.new_words_today = stats.new_available;

        if answered > 0 {
            stats.accuracy = (correct as f64 / answered as f64 * 100.0).round() as u32;
        }

        stats
    }

    /// Limit `new_words_today` to a per-day cap on new words.
    pub fn with_new_word_cap(mut self, cap: Option<usize>) -> Self {
        if let Some(cap) = cap {
            self.new_words_today = self.new_available.min(cap);
        }
        self
    }
}

/// Midnight UTC following `now`; `None` past the last representable day.
fn end_of_day(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap()
    }

    fn reviewed(word_id: &str, repetitions: u32, interval: u32, due_in: i64) -> ReviewRecord {
        let next = now() + Duration::days(due_in);
        ReviewRecord {
            word_id: word_id.to_string(),
            repetitions,
            ease_factor: 2.5,
            interval,
            last_reviewed_at: Some(next - Duration::days(interval as i64)),
            next_review_at: Some(next),
            correct_count: 4,
            incorrect_count: 1,
        }
    }

    #[test]
    fn empty_deck() {
        assert_eq!(
            VocabularyStats::from_records(&[], now()),
            VocabularyStats::default()
        );
    }

    #[test]
    fn counts_by_status() {
        let records = vec![
            ReviewRecord::new("hola"),
            ReviewRecord::new("gracias"),
            reviewed("agua", 1, 1, -1),
            reviewed("comer", 2, 6, 2),
            reviewed("casa", 5, 30, -3),
            reviewed("trabajar", 4, 21, 10),
        ];

        let stats = VocabularyStats::from_records(&records, now());
        assert_eq!(
            stats,
            VocabularyStats {
                total_words: 6,
                words_new: 2,
                words_learning: 1,
                words_learned: 3,
                words_mastered: 2,
                reviews_due: 2,
                reviews_due_today: 2,
                new_available: 2,
                new_words_today: 2,
                accuracy: 80,
            }
        );
    }

    #[test]
    fn mastery_threshold_is_configurable() {
        let records = vec![reviewed("casa", 4, 21, 5)];
        let stats = VocabularyStats::compute(&records, now(), 30);
        assert_eq!(stats.words_mastered, 0);
        assert_eq!(stats.words_learned, 1);
    }

    #[test]
    fn due_today_runs_to_midnight_utc() {
        // now() is 07:00; 16h later is 23:00 the same day, 18h later is tomorrow
        let mut later_today = reviewed("tarde", 2, 6, 0);
        later_today.next_review_at = Some(now() + Duration::hours(16));
        let mut tomorrow = reviewed("manana", 2, 6, 0);
        tomorrow.next_review_at = Some(now() + Duration::hours(18));

        let stats = VocabularyStats::from_records(&[later_today, tomorrow], now());
        assert_eq!(stats.reviews_due, 0);
        assert_eq!(stats.reviews_due_today, 1);
    }

    #[test]
    fn new_word_cap_limits_words_for_today() {
        let records = vec![
            ReviewRecord::new("uno"),
            ReviewRecord::new("dos"),
            ReviewRecord::new("tres"),
        ];
        let stats = VocabularyStats::from_records(&records, now());
        assert_eq!(stats.new_words_today, 3);
        assert_eq!(stats.with_new_word_cap(Some(2)).new_words_today, 2);
        assert_eq!(stats.with_new_word_cap(Some(10)).new_words_today, 3);
        assert_eq!(stats.with_new_word_cap(None).new_words_today, 3);
    }

    #[test]
    fn accuracy_with_saturated_counters() {
        let mut record = reviewed("casa", 5, 30, 4);
        record.correct_count = u32::MAX;
        record.incorrect_count = u32::MAX;
        let stats = VocabularyStats::from_records(&[record], now());
        assert_eq!(stats.accuracy, 50);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(VocabularyStats::default()).unwrap();
        assert!(json.get("totalWords").is_some());
        assert!(json.get("reviewsDue").is_some());
        assert!(json.get("newAvailable").is_some());
        assert!(json.get("reviewsDueToday").is_some());
        assert!(json.get("newWordsToday").is_some());
    }
}
