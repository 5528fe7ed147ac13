//! Test fixtures and factory functions for creating test data.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use vocab_srs_backend::models::ReviewRecord;

/// A reviewed record whose next review is `due_in_days` from now
/// (negative for overdue).
pub fn scheduled_record(word_id: &str, repetitions: u32, interval: u32, due_in_days: i64) -> ReviewRecord {
    let next = Utc::now() + Duration::days(due_in_days);
    ReviewRecord {
        word_id: word_id.to_string(),
        repetitions,
        ease_factor: 2.5,
        interval,
        last_reviewed_at: Some(next - Duration::days(interval as i64)),
        next_review_at: Some(next),
        correct_count: repetitions,
        incorrect_count: 0,
    }
}

/// Body for POST /api/users/:user_id/words
pub fn add_word_request(word_id: &str) -> Value {
    json!({ "word_id": word_id })
}

/// Body for POST /api/users/:user_id/flashcards/review
pub fn review_request(word_id: &str, quality: i64) -> Value {
    json!({
        "word_id": word_id,
        "quality": quality,
        "response_time_ms": 2500,
    })
}

/// Body for POST /api/sessions/:session_id/review
pub fn session_review_request(quality: i64) -> Value {
    json!({ "quality": quality, "response_time_ms": 1800 })
}

/// Parse an RFC 3339 timestamp field from a response body.
pub fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .expect("expected an RFC 3339 timestamp")
}

/// Compare a JSON number against an expected float.
pub fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().expect("expected a number");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} to be close to {}",
        actual,
        expected
    );
}
