use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::ScoreStore;
use crate::error::{AppError, Result};
use crate::models::{LeaderboardEntry, UserScore};

/// `ScoreStore` over Postgres. Rank is computed with `ROW_NUMBER()` over
/// `(score DESC, user_id ASC)`; every query here must keep that ordering
/// identical to the in-memory index comparator.
#[derive(Clone)]
pub struct PostgresScoreStore {
    pool: PgPool,
    call_timeout: Duration,
}

impl PostgresScoreStore {
    pub fn new(pool: PgPool, call_timeout: Duration) -> Self {
        Self { pool, call_timeout }
    }

    /// Bound every store call; a hung database surfaces as a 503 instead of
    /// a hung request.
    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(AppError::StoreTimeout(self.call_timeout.as_millis() as u64)),
        }
    }
}

fn classify(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::StoreUnavailable(e.to_string())
        }
        other => AppError::Database(other),
    }
}

#[async_trait::async_trait]
impl ScoreStore for PostgresScoreStore {
    async fn upsert(&self, instance_id: &str, user_id: &str, score: f64) -> Result<()> {
        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO user_scores (leaderboard_instance_id, user_id, score)
                VALUES ($1, $2, $3)
                ON CONFLICT (leaderboard_instance_id, user_id)
                DO UPDATE SET score = EXCLUDED.score, updated_at = NOW()
                "#,
            )
            .bind(instance_id)
            .bind(user_id)
            .bind(score)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn get(&self, instance_id: &str, user_id: &str) -> Result<Option<f64>> {
        let row = self
            .bounded(
                sqlx::query_as::<_, UserScore>(
                    r#"
                    SELECT id, leaderboard_instance_id, user_id, score, created_at, updated_at
                    FROM user_scores
                    WHERE leaderboard_instance_id = $1 AND user_id = $2
                    "#,
                )
                .bind(instance_id)
                .bind(user_id)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|r| r.score))
    }

    async fn rank_of(
        &self,
        instance_id: &str,
        user_id: &str,
    ) -> Result<Option<LeaderboardEntry>> {
        let entry = self
            .bounded(
                sqlx::query_as::<_, LeaderboardEntry>(
                    r#"
                    WITH ranked AS (
                        SELECT
                            user_id,
                            score,
                            ROW_NUMBER() OVER (ORDER BY score DESC, user_id ASC) AS rank
                        FROM user_scores
                        WHERE leaderboard_instance_id = $1
                    )
                    SELECT user_id, score, rank
                    FROM ranked
                    WHERE user_id = $2
                    "#,
                )
                .bind(instance_id)
                .bind(user_id)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(entry)
    }

    async fn top_n(
        &self,
        instance_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>> {
        let entries = self
            .bounded(
                sqlx::query_as::<_, LeaderboardEntry>(
                    r#"
                    WITH ranked AS (
                        SELECT
                            user_id,
                            score,
                            ROW_NUMBER() OVER (ORDER BY score DESC, user_id ASC) AS rank
                        FROM user_scores
                        WHERE leaderboard_instance_id = $1
                    )
                    SELECT user_id, score, rank
                    FROM ranked
                    WHERE rank BETWEEN $2 + 1 AND $2 + $3
                    ORDER BY rank
                    "#,
                )
                .bind(instance_id)
                .bind(offset)
                .bind(limit)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(entries)
    }

    async fn around(
        &self,
        instance_id: &str,
        user_id: &str,
        radius: i64,
    ) -> Result<Option<Vec<LeaderboardEntry>>> {
        let entries = self
            .bounded(
                sqlx::query_as::<_, LeaderboardEntry>(
                    r#"
                    WITH ranked AS (
                        SELECT
                            user_id,
                            score,
                            ROW_NUMBER() OVER (ORDER BY score DESC, user_id ASC) AS rank
                        FROM user_scores
                        WHERE leaderboard_instance_id = $1
                    ),
                    target AS (
                        SELECT rank FROM ranked WHERE user_id = $2
                    )
                    SELECT r.user_id, r.score, r.rank
                    FROM ranked r, target t
                    WHERE r.rank BETWEEN GREATEST(1, t.rank - $3) AND t.rank + $3
                    ORDER BY r.rank
                    "#,
                )
                .bind(instance_id)
                .bind(user_id)
                .bind(radius)
                .fetch_all(&self.pool),
            )
            .await?;

        // A present user always appears in its own window, so an empty
        // result means the user is absent from the instance.
        if entries.is_empty() {
            Ok(None)
        } else {
            Ok(Some(entries))
        }
    }

    async fn fetch_all(&self, instance_id: &str) -> Result<Vec<(String, f64)>> {
        let rows = self
            .bounded(
                sqlx::query(
                    r#"
                    SELECT user_id, score
                    FROM user_scores
                    WHERE leaderboard_instance_id = $1
                    ORDER BY score DESC, user_id ASC
                    "#,
                )
                .bind(instance_id)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("user_id"), r.get::<f64, _>("score")))
            .collect())
    }

    async fn count(&self, instance_id: &str) -> Result<i64> {
        let row = self
            .bounded(
                sqlx::query(
                    "SELECT COUNT(*) AS count FROM user_scores WHERE leaderboard_instance_id = $1",
                )
                .bind(instance_id)
                .fetch_one(&self.pool),
            )
            .await?;

        Ok(row.get::<i64, _>("count"))
    }
}
