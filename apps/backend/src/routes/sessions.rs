//! Review session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use vocab_srs_core::{select_due, Session, SpacedRepetitionAlgorithm};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::sessions::{SessionEntry, SharedSession};
use crate::AppState;

/// POST /api/users/:user_id/sessions
/// Starts a session over the user's current due set
pub async fn start(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Option<Json<StartSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let records = state.db.get_review_records(&user_id).await?;
    // The body is optional
    let new_limit = payload
        .and_then(|Json(p)| p.new_limit)
        .or(state.review.new_words_per_session);

    let due = select_due(&records, Utc::now(), new_limit);
    let session = Session::with_algorithm(due, state.review.algorithm.clone());
    let session_id = state.sessions.insert(&user_id, session).await;

    let shared = find(&state, session_id).await?;
    let entry = shared.lock().await;

    tracing::info!(%session_id, %user_id, cards = entry.session.len(), "Started review session");

    Ok((
        StatusCode::CREATED,
        Json(snapshot(&state, session_id, &entry)),
    ))
}

/// GET /api/sessions/:session_id
pub async fn get(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let shared = find(&state, session_id).await?;
    let entry = shared.lock().await;
    Ok(Json(snapshot(&state, session_id, &entry)))
}

/// POST /api/sessions/:session_id/review
/// Reviews the current card and moves to the next one
pub async fn review(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SessionReviewRequest>,
) -> Result<Json<SessionReviewResponse>> {
    let quality = ReviewQuality::new(payload.quality)?;
    let algorithm = &state.review.algorithm;

    let shared = find(&state, session_id).await?;
    // Held until the response is built: one submission per session at a time
    let mut entry = shared.lock().await;
    let now = Utc::now();
    entry.touch(now);

    let before = entry.session.try_current()?.clone();
    let mut outcome = entry.session.submit_review(quality, now)?;

    let persisted = persist_review(
        &state,
        &entry.user_id,
        session_id,
        quality,
        payload.response_time_ms,
        &before,
        &outcome.updated_record,
    )
    .await;

    if let Err(err) = persisted {
        let word_id = &outcome.updated_record.word_id;
        tracing::warn!(
            %session_id,
            %word_id,
            error = %err,
            "Failed to persist review, continuing session"
        );
        let failure = entry
            .session
            .record_persistence_failure(word_id, err.to_string());
        outcome.persistence_error = Some(failure);
    }

    let mastery_interval = algorithm.mastery_interval;
    Ok(Json(SessionReviewResponse {
        updated_record: ReviewRecordView::new(outcome.updated_record, mastery_interval),
        stats: outcome.stats,
        accuracy: outcome.stats.accuracy(),
        phase: entry.session.phase(),
        next: entry
            .session
            .current()
            .cloned()
            .map(|r| ReviewRecordView::new(r, mastery_interval)),
        persistence_error: outcome.persistence_error,
    }))
}

/// DELETE /api/sessions/:session_id
pub async fn end(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.sessions.remove(session_id).await {
        return Err(ApiError::NotFound(format!("Session {}", session_id)));
    }
    tracing::info!(%session_id, "Ended review session");
    Ok(StatusCode::NO_CONTENT)
}

/// Write a session review, provided the stored record is still the one the
/// session was started from.
async fn persist_review(
    state: &AppState,
    user_id: &str,
    session_id: Uuid,
    quality: ReviewQuality,
    response_time_ms: Option<i32>,
    before: &ReviewRecord,
    after: &ReviewRecord,
) -> Result<()> {
    let row = DbReviewRecord::from_core_record(user_id, after)?;
    let log = DbReviewLog::from_review(
        user_id,
        Some(session_id),
        quality,
        response_time_ms,
        before,
        after,
        state.review.algorithm.name(),
    )?;

    if !state
        .db
        .save_review(&row, before.last_reviewed_at, &log)
        .await?
    {
        return Err(ApiError::Conflict(format!(
            "Word {} was removed or reviewed elsewhere since the session started",
            after.word_id
        )));
    }
    Ok(())
}

async fn find(state: &AppState, session_id: Uuid) -> Result<SharedSession> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {}", session_id)))
}

fn snapshot(state: &AppState, session_id: Uuid, entry: &SessionEntry) -> SessionResponse {
    let session = &entry.session;
    let stats = session.stats();
    let mastery_interval = state.review.algorithm.mastery_interval;

    SessionResponse {
        session_id,
        user_id: entry.user_id.clone(),
        phase: session.phase(),
        position: session.position(),
        total: session.len(),
        remaining: session.remaining(),
        current: session
            .current()
            .cloned()
            .map(|r| ReviewRecordView::new(r, mastery_interval)),
        stats,
        accuracy: stats.accuracy(),
        failures: session.failures().to_vec(),
        started_at: entry.started_at,
    }
}
