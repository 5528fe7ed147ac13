//! Due cards and one-off review endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use vocab_srs_core::{select_due, SpacedRepetitionAlgorithm};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/users/:user_id/flashcards/due
pub async fn due(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DueQuery>,
) -> Result<Json<DueResponse>> {
    let records = state.db.get_review_records(&user_id).await?;
    let now = Utc::now();

    let new_limit = query.new_limit.or(state.review.new_words_per_session);
    let mastery_interval = state.review.algorithm.mastery_interval;

    let summary = DueSummary::from_records(&records, now);
    let cards = select_due(&records, now, new_limit)
        .into_iter()
        .map(|r| ReviewRecordView::new(r, mastery_interval))
        .collect();

    Ok(Json(DueResponse { cards, summary }))
}

/// POST /api/users/:user_id/flashcards/review
/// Reviews a single word outside of a session
pub async fn review(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>> {
    let quality = ReviewQuality::new(payload.quality)?;

    let word_id = payload.word_id.trim();
    if word_id.is_empty() {
        return Err(ApiError::BadRequest("word_id must not be empty".to_string()));
    }

    let algorithm = &state.review.algorithm;

    // First review of a word creates its record
    let existing = state.db.get_review_record(&user_id, word_id).await?;
    let before = existing
        .clone()
        .unwrap_or_else(|| algorithm.initial_record(word_id));

    let updated = algorithm.schedule(&before, quality, Utc::now())?;

    let row = DbReviewRecord::from_core_record(&user_id, &updated)?;
    let log = DbReviewLog::from_review(
        &user_id,
        None,
        quality,
        payload.response_time_ms,
        &before,
        &updated,
        algorithm.name(),
    )?;

    let saved = match existing {
        Some(previous) => {
            state
                .db
                .save_review(&row, previous.last_reviewed_at, &log)
                .await?
        }
        None => state.db.insert_review(&row, &log).await?,
    };
    if !saved {
        return Err(ApiError::Conflict(format!(
            "Word {} was changed by another review, retry",
            word_id
        )));
    }

    tracing::debug!(
        %user_id,
        %word_id,
        quality = quality.value(),
        interval = updated.interval,
        "Scheduled review"
    );

    Ok(Json(SubmitReviewResponse {
        record: ReviewRecordView::new(updated, algorithm.mastery_interval),
    }))
}
