//! Deck membership endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/users/:user_id/words?status=
/// Lists the deck in insertion order, optionally filtered by derived status
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<WordsQuery>,
) -> Result<Json<WordsResponse>> {
    let mastery_interval = state.review.algorithm.mastery_interval;
    let words: Vec<ReviewRecordView> = state
        .db
        .get_review_records(&user_id)
        .await?
        .into_iter()
        .map(|r| ReviewRecordView::new(r, mastery_interval))
        .filter(|view| query.status.map_or(true, |status| view.status == status))
        .collect();

    Ok(Json(WordsResponse {
        total: words.len(),
        words,
    }))
}

/// GET /api/users/:user_id/words/:word_id
pub async fn get(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(String, String)>,
) -> Result<Json<ReviewRecordView>> {
    let record = state
        .db
        .get_review_record(&user_id, &word_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Word {}", word_id)))?;

    Ok(Json(ReviewRecordView::new(
        record,
        state.review.algorithm.mastery_interval,
    )))
}

/// POST /api/users/:user_id/words
/// Adds a word to the deck as a new, immediately due record
pub async fn add(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AddWordRequest>,
) -> Result<(StatusCode, Json<ReviewRecordView>)> {
    let word_id = payload.word_id.trim();
    if word_id.is_empty() {
        return Err(ApiError::BadRequest("word_id must not be empty".to_string()));
    }

    if !state.db.add_word(&user_id, word_id).await? {
        return Err(ApiError::Conflict(format!("Word {} already in deck", word_id)));
    }

    tracing::info!(%user_id, %word_id, "Added word to deck");

    let record = ReviewRecord::new(word_id);
    Ok((
        StatusCode::CREATED,
        Json(ReviewRecordView::new(
            record,
            state.review.algorithm.mastery_interval,
        )),
    ))
}

/// DELETE /api/users/:user_id/words/:word_id
pub async fn remove(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    if !state.db.remove_word(&user_id, &word_id).await? {
        return Err(ApiError::NotFound(format!("Word {}", word_id)));
    }

    tracing::info!(%user_id, %word_id, "Removed word from deck");

    Ok(StatusCode::NO_CONTENT)
}
