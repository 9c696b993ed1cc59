pub mod postgres;
pub mod supabase;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    errors::AppError,
    models::{
        ProverbRatingStats, Rating, RatingSubmission, UserRating,
        rating::{MAX_RATING, MIN_RATING, is_valid_rating},
    },
};

pub use postgres::PostgresRatingsRepository;
pub use supabase::SupabaseRatingsRepository;

/// Storage contract for ratings. The two engines are interchangeable;
/// callers never learn which one is behind the handle.
///
/// Uniqueness of (proverb_id, session_id) is enforced by the engine's
/// own constraint mechanism, never by application-level locking, so
/// concurrent upserts for the same pair resolve last-writer-wins.
#[async_trait]
pub trait RatingsRepository: Send + Sync {
    /// Inserts a new rating or replaces the existing one for the pair,
    /// refreshing `updated_at` and preserving `created_at`. Rejects
    /// out-of-range values before touching the store.
    async fn upsert_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
        rating: i32,
    ) -> Result<Rating, AppError>;

    /// One stats entry per proverb that has at least one vote; proverbs
    /// with no votes are omitted. Order is unspecified.
    async fn get_rating_stats(
        &self,
        proverb_ids: &[String],
    ) -> Result<Vec<ProverbRatingStats>, AppError>;

    /// All votes cast by one session, unordered.
    async fn get_user_ratings(&self, session_id: &str) -> Result<Vec<UserRating>, AppError>;

    /// A single session's vote on a single proverb, if any.
    async fn get_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
    ) -> Result<Option<Rating>, AppError>;
}

pub fn validate_rating_value(rating: i32) -> Result<(), AppError> {
    if is_valid_rating(rating) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )))
    }
}

/// Stores the vote and returns it together with the proverb's refreshed
/// aggregate, so the caller reconciles in one round trip.
///
/// The stats read is not transactionally joined with the write. If it
/// comes back without an entry for the proverb (read-after-write skew
/// on the degraded aggregation path), a degenerate aggregate is
/// synthesized from the vote that was just stored instead of failing
/// the request.
pub async fn submit_rating(
    repo: &dyn RatingsRepository,
    proverb_id: &str,
    session_id: &str,
    rating: i32,
) -> Result<RatingSubmission, AppError> {
    let stored = repo.upsert_rating(proverb_id, session_id, rating).await?;

    let stats = repo
        .get_rating_stats(std::slice::from_ref(&stored.proverb_id))
        .await?
        .into_iter()
        .find(|s| s.proverb_id == proverb_id)
        .unwrap_or_else(|| ProverbRatingStats {
            proverb_id: proverb_id.to_string(),
            average_rating: rating as f64,
            total_votes: 1,
        });

    Ok(RatingSubmission {
        rating: stored,
        stats,
    })
}

/// Client-side aggregation over raw (proverb_id, rating) rows: group by
/// proverb, sum and count, average in f64. Used by the Supabase engine
/// when the server-side aggregate function is unavailable; must agree
/// with the SQL aggregate for the same rows.
pub fn fold_rating_stats(rows: &[(String, i32)]) -> Vec<ProverbRatingStats> {
    let mut grouped: HashMap<&str, (i64, i64)> = HashMap::new();

    for (proverb_id, rating) in rows {
        let entry = grouped.entry(proverb_id.as_str()).or_insert((0, 0));
        entry.0 += i64::from(*rating);
        entry.1 += 1;
    }

    grouped
        .into_iter()
        .map(|(proverb_id, (sum, count))| ProverbRatingStats {
            proverb_id: proverb_id.to_string(),
            average_rating: sum as f64 / count as f64,
            total_votes: count,
        })
        .collect()
}
