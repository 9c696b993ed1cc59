use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{RatingsRepository, validate_rating_value},
    errors::AppError,
    models::{ProverbRatingStats, Rating, UserRating},
};

/// Relational engine. The uniqueness constraint on
/// (proverb_id, session_id) plus `ON CONFLICT DO UPDATE` gives the
/// atomic insert-or-update; aggregates come from a grouped SQL query.
pub struct PostgresRatingsRepository {
    pool: PgPool,
}

impl PostgresRatingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to Postgres: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Idempotent schema setup, safe to run on every startup.
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS ratings (
                id BIGSERIAL PRIMARY KEY,
                proverb_id VARCHAR(255) NOT NULL,
                session_id VARCHAR(255) NOT NULL,
                rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
                created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(proverb_id, session_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create ratings table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ratings_proverb_id ON ratings(proverb_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ratings_session_id ON ratings(session_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {}", e)))?;

        tracing::info!("Ratings schema migration completed");
        Ok(())
    }
}

#[async_trait]
impl RatingsRepository for PostgresRatingsRepository {
    async fn upsert_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
        rating: i32,
    ) -> Result<Rating, AppError> {
        validate_rating_value(rating)?;

        sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (proverb_id, session_id, rating, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (proverb_id, session_id)
            DO UPDATE SET
                rating = EXCLUDED.rating,
                updated_at = NOW()
            RETURNING id, proverb_id, session_id, rating, created_at, updated_at",
        )
        .bind(proverb_id)
        .bind(session_id)
        .bind(rating)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to upsert rating: {}", e)))
    }

    async fn get_rating_stats(
        &self,
        proverb_ids: &[String],
    ) -> Result<Vec<ProverbRatingStats>, AppError> {
        if proverb_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, ProverbRatingStats>(
            "SELECT
                proverb_id,
                AVG(rating)::DOUBLE PRECISION AS average_rating,
                COUNT(*) AS total_votes
            FROM ratings
            WHERE proverb_id = ANY($1)
            GROUP BY proverb_id",
        )
        .bind(proverb_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch rating stats: {}", e)))
    }

    async fn get_user_ratings(&self, session_id: &str) -> Result<Vec<UserRating>, AppError> {
        sqlx::query_as::<_, UserRating>(
            "SELECT proverb_id, rating
            FROM ratings
            WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user ratings: {}", e)))
    }

    async fn get_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
    ) -> Result<Option<Rating>, AppError> {
        sqlx::query_as::<_, Rating>(
            "SELECT id, proverb_id, session_id, rating, created_at, updated_at
            FROM ratings
            WHERE proverb_id = $1 AND session_id = $2
            LIMIT 1",
        )
        .bind(proverb_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch rating: {}", e)))
    }
}
