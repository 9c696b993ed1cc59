use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::{RatingsRepository, fold_rating_stats, validate_rating_value},
    errors::AppError,
    models::{ProverbRatingStats, Rating, UserRating},
};

/// Backend-as-a-service engine, talking to the Supabase PostgREST API
/// with the service-role key. Upserts ride on the same
/// (proverb_id, session_id) constraint as the relational engine, via
/// `on_conflict` + merge-duplicates.
pub struct SupabaseRatingsRepository {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Wire row as PostgREST returns it (snake_case columns).
#[derive(Debug, Deserialize)]
struct RatingRow {
    id: i64,
    proverb_id: String,
    session_id: String,
    rating: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            proverb_id: row.proverb_id,
            session_id: row.session_id,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatsRow {
    proverb_id: String,
    average_rating: f64,
    total_votes: i64,
}

#[derive(Debug, Deserialize)]
struct ValueRow {
    proverb_id: String,
    rating: i32,
}

impl SupabaseRatingsRepository {
    pub fn from_env() -> Result<Self, AppError> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| AppError::EnvError("SUPABASE_URL must be set".into()))?;
        let api_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| AppError::EnvError("SUPABASE_SERVICE_ROLE_KEY must be set".into()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Degraded aggregation path: fetch the raw rows and reduce here.
    /// Must produce the same numbers as the server-side aggregate.
    async fn get_rating_stats_manual(
        &self,
        proverb_ids: &[String],
    ) -> Result<Vec<ProverbRatingStats>, AppError> {
        let id_filter = format!(
            "in.({})",
            proverb_ids
                .iter()
                .map(|id| format!("\"{}\"", id))
                .collect::<Vec<_>>()
                .join(",")
        );

        let response = self
            .request(reqwest::Method::GET, "/rest/v1/ratings")
            .query(&[
                ("select", "proverb_id,rating"),
                ("proverb_id", id_filter.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch ratings: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DatabaseError(format!(
                "Failed to fetch ratings: {} {}",
                status, body
            )));
        }

        let rows: Vec<ValueRow> = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        let pairs: Vec<(String, i32)> = rows
            .into_iter()
            .map(|row| (row.proverb_id, row.rating))
            .collect();

        Ok(fold_rating_stats(&pairs))
    }
}

#[async_trait]
impl RatingsRepository for SupabaseRatingsRepository {
    async fn upsert_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
        rating: i32,
    ) -> Result<Rating, AppError> {
        validate_rating_value(rating)?;

        let response = self
            .request(reqwest::Method::POST, "/rest/v1/ratings")
            .query(&[("on_conflict", "proverb_id,session_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&json!({
                "proverb_id": proverb_id,
                "session_id": session_id,
                "rating": rating,
                "updated_at": Utc::now(),
            }))
            .send()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to upsert rating: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DatabaseError(format!(
                "Failed to upsert rating: {} {}",
                status, body
            )));
        }

        let mut rows: Vec<RatingRow> = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        rows.pop()
            .map(Rating::from)
            .ok_or_else(|| AppError::DatabaseError("Upsert returned no row".into()))
    }

    async fn get_rating_stats(
        &self,
        proverb_ids: &[String],
    ) -> Result<Vec<ProverbRatingStats>, AppError> {
        if proverb_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Preferred path: server-side aggregate function.
        let rpc = self
            .request(reqwest::Method::POST, "/rest/v1/rpc/get_rating_stats")
            .json(&json!({ "proverb_ids": proverb_ids }))
            .send()
            .await;

        let response = match rpc {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    "get_rating_stats RPC unavailable, falling back to manual aggregation"
                );
                return self.get_rating_stats_manual(proverb_ids).await;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "get_rating_stats RPC unavailable, falling back to manual aggregation"
                );
                return self.get_rating_stats_manual(proverb_ids).await;
            }
        };

        let rows: Vec<StatsRow> = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ProverbRatingStats {
                proverb_id: row.proverb_id,
                average_rating: row.average_rating,
                total_votes: row.total_votes,
            })
            .collect())
    }

    async fn get_user_ratings(&self, session_id: &str) -> Result<Vec<UserRating>, AppError> {
        let session_filter = format!("eq.{}", session_id);

        let response = self
            .request(reqwest::Method::GET, "/rest/v1/ratings")
            .query(&[
                ("select", "proverb_id,rating"),
                ("session_id", session_filter.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user ratings: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DatabaseError(format!(
                "Failed to fetch user ratings: {} {}",
                status, body
            )));
        }

        let rows: Vec<ValueRow> = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| UserRating {
                proverb_id: row.proverb_id,
                rating: row.rating,
            })
            .collect())
    }

    async fn get_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
    ) -> Result<Option<Rating>, AppError> {
        let proverb_filter = format!("eq.{}", proverb_id);
        let session_filter = format!("eq.{}", session_id);

        let response = self
            .request(reqwest::Method::GET, "/rest/v1/ratings")
            .query(&[
                ("select", "*"),
                ("proverb_id", proverb_filter.as_str()),
                ("session_id", session_filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch rating: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DatabaseError(format!(
                "Failed to fetch rating: {} {}",
                status, body
            )));
        }

        let mut rows: Vec<RatingRow> = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        Ok(rows.pop().map(Rating::from))
    }
}
