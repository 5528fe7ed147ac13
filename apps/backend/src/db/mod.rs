//! PostgreSQL database operations

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that opens connections on first use
    pub fn connect_lazy(database_url: &str, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Review Record Repository ===

    /// Get every review record in a user's deck, oldest first
    pub async fn get_review_records(&self, user_id: &str) -> Result<Vec<ReviewRecord>> {
        let rows = sqlx::query_as::<_, DbReviewRecord>(
            r#"
            SELECT user_id, word_id, repetitions, ease_factor, interval_days,
                   last_reviewed_at, next_review_at, correct_count, incorrect_count,
                   created_at, updated_at
            FROM review_records
            WHERE user_id = $1
            ORDER BY created_at, word_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .iter()
            .map(DbReviewRecord::to_core_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Get the review record for one word
    pub async fn get_review_record(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Option<ReviewRecord>> {
        let row = sqlx::query_as::<_, DbReviewRecord>(
            r#"
            SELECT user_id, word_id, repetitions, ease_factor, interval_days,
                   last_reviewed_at, next_review_at, correct_count, incorrect_count,
                   created_at, updated_at
            FROM review_records
            WHERE user_id = $1 AND word_id = $2
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.to_core_record()).transpose()?)
    }

    /// Add a word to a user's deck as a new record.
    ///
    /// Returns `false` if the word was already in the deck.
    pub async fn add_word(&self, user_id: &str, word_id: &str) -> Result<bool> {
        let row = DbReviewRecord::from_core_record(user_id, &ReviewRecord::new(word_id))?;
        let result = sqlx::query(
            r#"
            INSERT INTO review_records (user_id, word_id, repetitions, ease_factor, interval_days,
                                        correct_count, incorrect_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, word_id) DO NOTHING
            "#,
        )
        .bind(&row.user_id)
        .bind(&row.word_id)
        .bind(row.repetitions)
        .bind(row.ease_factor)
        .bind(row.interval_days)
        .bind(row.correct_count)
        .bind(row.incorrect_count)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a word and its scheduling state from a user's deck
    pub async fn remove_word(&self, user_id: &str, word_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM review_records
            WHERE user_id = $1 AND word_id = $2
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Upsert a review record (insert or update)
    pub async fn upsert_review_record(&self, record: &DbReviewRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_records (user_id, word_id, repetitions, ease_factor, interval_days,
                                        last_reviewed_at, next_review_at, correct_count,
                                        incorrect_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, word_id) DO UPDATE SET
                repetitions = EXCLUDED.repetitions,
                ease_factor = EXCLUDED.ease_factor,
                interval_days = EXCLUDED.interval_days,
                last_reviewed_at = EXCLUDED.last_reviewed_at,
                next_review_at = EXCLUDED.next_review_at,
                correct_count = EXCLUDED.correct_count,
                incorrect_count = EXCLUDED.incorrect_count,
                updated_at = NOW()
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.word_id)
        .bind(record.repetitions)
        .bind(record.ease_factor)
        .bind(record.interval_days)
        .bind(record.last_reviewed_at)
        .bind(record.next_review_at)
        .bind(record.correct_count)
        .bind(record.incorrect_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Review Log Repository ===

    /// Get a user's review history for one word, oldest first
    pub async fn get_review_log(&self, user_id: &str, word_id: &str) -> Result<Vec<DbReviewLog>> {
        let logs = sqlx::query_as::<_, DbReviewLog>(
            r#"
            SELECT id, user_id, word_id, session_id, quality, response_time_ms, reviewed_at,
                   interval_before, interval_after, ease_before, ease_after, algorithm, created_at
            FROM review_log
            WHERE user_id = $1 AND word_id = $2
            ORDER BY reviewed_at
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    /// Store a reviewed record together with its log entry in one transaction.
    ///
    /// The row is only updated while its `last_reviewed_at` still equals
    /// `previously_reviewed_at`, the value the review was scheduled from.
    /// Returns `false` and writes nothing when the row was removed or reviewed
    /// elsewhere in the meantime.
    pub async fn save_review(
        &self,
        record: &DbReviewRecord,
        previously_reviewed_at: Option<DateTime<Utc>>,
        log: &DbReviewLog,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE review_records SET
                repetitions = $3,
                ease_factor = $4,
                interval_days = $5,
                last_reviewed_at = $6,
                next_review_at = $7,
                correct_count = $8,
                incorrect_count = $9,
                updated_at = NOW()
            WHERE user_id = $1 AND word_id = $2
              AND last_reviewed_at IS NOT DISTINCT FROM $10
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.word_id)
        .bind(record.repetitions)
        .bind(record.ease_factor)
        .bind(record.interval_days)
        .bind(record.last_reviewed_at)
        .bind(record.next_review_at)
        .bind(record.correct_count)
        .bind(record.incorrect_count)
        .bind(previously_reviewed_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_log(&mut tx, log).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Store the first review of a word that had no record yet.
    ///
    /// Returns `false` and writes nothing if a record appeared in the meantime.
    pub async fn insert_review(&self, record: &DbReviewRecord, log: &DbReviewLog) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO review_records (user_id, word_id, repetitions, ease_factor, interval_days,
                                        last_reviewed_at, next_review_at, correct_count,
                                        incorrect_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, word_id) DO NOTHING
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.word_id)
        .bind(record.repetitions)
        .bind(record.ease_factor)
        .bind(record.interval_days)
        .bind(record.last_reviewed_at)
        .bind(record.next_review_at)
        .bind(record.correct_count)
        .bind(record.incorrect_count)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_log(&mut tx, log).await?;
        tx.commit().await?;
        Ok(true)
    }
}

async fn insert_log(tx: &mut Transaction<'_, Postgres>, log: &DbReviewLog) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO review_log (id, user_id, word_id, session_id, quality, response_time_ms,
                                reviewed_at, interval_before, interval_after, ease_before,
                                ease_after, algorithm)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(log.id)
    .bind(&log.user_id)
    .bind(&log.word_id)
    .bind(log.session_id)
    .bind(log.quality)
    .bind(log.response_time_ms)
    .bind(log.reviewed_at)
    .bind(log.interval_before)
    .bind(log.interval_after)
    .bind(log.ease_before)
    .bind(log.ease_after)
    .bind(&log.algorithm)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
