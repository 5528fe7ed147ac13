//! Vocabulary statistics endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/users/:user_id/vocabulary/stats
pub async fn vocabulary(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<VocabularyStats>> {
    let records = state.db.get_review_records(&user_id).await?;
    let stats = VocabularyStats::compute(
        &records,
        Utc::now(),
        state.review.algorithm.mastery_interval,
    )
    .with_new_word_cap(state.review.new_words_per_session);
    Ok(Json(stats))
}
