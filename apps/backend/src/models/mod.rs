//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from vocab-srs-core
pub use vocab_srs_core::{
    CardFailure, DueSummary, ReviewQuality, ReviewRecord, SessionPhase, SessionStats, SrsError,
    VocabularyStats, WordStatus,
};

// === Database Entity Types ===

/// Review record stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReviewRecord {
    pub user_id: String,
    pub word_id: String,
    pub repetitions: i32,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub correct_count: i32,
    pub incorrect_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbReviewRecord {
    /// Create from vocab-srs-core ReviewRecord.
    ///
    /// Counters that do not fit an INTEGER column are rejected rather than
    /// clamped, so a stored interval always matches its review dates.
    pub fn from_core_record(
        user_id: &str,
        record: &ReviewRecord,
    ) -> std::result::Result<Self, SrsError> {
        Ok(Self {
            user_id: user_id.to_string(),
            word_id: record.word_id.clone(),
            repetitions: to_column(&record.word_id, "repetitions", record.repetitions)?,
            ease_factor: record.ease_factor,
            interval_days: to_column(&record.word_id, "interval", record.interval)?,
            last_reviewed_at: record.last_reviewed_at,
            next_review_at: record.next_review_at,
            correct_count: to_column(&record.word_id, "correct count", record.correct_count)?,
            incorrect_count: to_column(
                &record.word_id,
                "incorrect count",
                record.incorrect_count,
            )?,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    /// Convert to vocab-srs-core ReviewRecord.
    ///
    /// Negative counters mean the row was corrupted outside this service.
    pub fn to_core_record(&self) -> std::result::Result<ReviewRecord, SrsError> {
        Ok(ReviewRecord {
            word_id: self.word_id.clone(),
            repetitions: self.read_count("repetitions", self.repetitions)?,
            ease_factor: self.ease_factor,
            interval: self.read_count("interval", self.interval_days)?,
            last_reviewed_at: self.last_reviewed_at,
            next_review_at: self.next_review_at,
            correct_count: self.read_count("correct count", self.correct_count)?,
            incorrect_count: self.read_count("incorrect count", self.incorrect_count)?,
        })
    }

    fn read_count(&self, field: &str, value: i32) -> std::result::Result<u32, SrsError> {
        u32::try_from(value).map_err(|_| SrsError::InvalidRecord {
            word_id: self.word_id.clone(),
            reason: format!("negative {}: {}", field, value),
        })
    }
}

fn to_column(word_id: &str, field: &str, value: u32) -> std::result::Result<i32, SrsError> {
    i32::try_from(value).map_err(|_| SrsError::InvalidRecord {
        word_id: word_id.to_string(),
        reason: format!("{} {} does not fit in storage", field, value),
    })
}

/// One review submission, kept for history
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReviewLog {
    pub id: Uuid,
    pub user_id: String,
    pub word_id: String,
    pub session_id: Option<Uuid>,
    pub quality: i32,
    pub response_time_ms: Option<i32>,
    pub reviewed_at: DateTime<Utc>,
    pub interval_before: i32,
    pub interval_after: i32,
    pub ease_before: f64,
    pub ease_after: f64,
    pub algorithm: String,
    pub created_at: DateTime<Utc>,
}

impl DbReviewLog {
    /// Build a log entry from the record before and after a review
    pub fn from_review(
        user_id: &str,
        session_id: Option<Uuid>,
        quality: ReviewQuality,
        response_time_ms: Option<i32>,
        before: &ReviewRecord,
        after: &ReviewRecord,
        algorithm: &str,
    ) -> std::result::Result<Self, SrsError> {
        let reviewed_at = after.last_reviewed_at.unwrap_or_else(Utc::now);
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            word_id: after.word_id.clone(),
            session_id,
            quality: quality.value() as i32,
            response_time_ms,
            reviewed_at,
            interval_before: to_column(&before.word_id, "interval", before.interval)?,
            interval_after: to_column(&after.word_id, "interval", after.interval)?,
            ease_before: before.ease_factor,
            ease_after: after.ease_factor,
            algorithm: algorithm.to_string(),
            created_at: Utc::now(),
        })
    }
}

// === API Request/Response Types ===

/// Review record with its derived status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecordView {
    #[serde(flatten)]
    pub record: ReviewRecord,
    pub status: WordStatus,
}

impl ReviewRecordView {
    pub fn new(record: ReviewRecord, mastery_interval: u32) -> Self {
        let status = record.status_with(mastery_interval);
        Self { record, status }
    }
}

/// Add word request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWordRequest {
    pub word_id: String,
}

/// Deck listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordsQuery {
    pub status: Option<WordStatus>,
}

/// Deck listing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordsResponse {
    pub words: Vec<ReviewRecordView>,
    pub total: usize,
}

/// Due flashcards query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DueQuery {
    pub new_limit: Option<usize>,
}

/// Due flashcards response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueResponse {
    pub cards: Vec<ReviewRecordView>,
    pub summary: DueSummary,
}

/// Submit review request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub word_id: String,
    pub quality: i64,
    pub response_time_ms: Option<i32>,
}

/// Submit review response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewResponse {
    pub record: ReviewRecordView,
}

/// Start session request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub new_limit: Option<usize>,
}

/// Session review request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReviewRequest {
    pub quality: i64,
    pub response_time_ms: Option<i32>,
}

/// Session snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub user_id: String,
    pub phase: SessionPhase,
    pub position: usize,
    pub total: usize,
    pub remaining: usize,
    pub current: Option<ReviewRecordView>,
    pub stats: SessionStats,
    pub accuracy: u32,
    pub failures: Vec<CardFailure>,
    pub started_at: DateTime<Utc>,
}

/// Session review response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReviewResponse {
    pub updated_record: ReviewRecordView,
    pub stats: SessionStats,
    pub accuracy: u32,
    pub phase: SessionPhase,
    pub next: Option<ReviewRecordView>,
    pub persistence_error: Option<CardFailure>,
}
