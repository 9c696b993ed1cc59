use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One session's vote on one proverb. At most one row exists per
/// (proverb_id, session_id); re-voting replaces `rating` and
/// `updated_at` in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: i64,
    pub proverb_id: String,
    pub session_id: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate over all votes for one proverb, computed on read and
/// never persisted. Proverbs with zero votes have no stats row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProverbRatingStats {
    pub proverb_id: String,
    pub average_rating: f64,
    pub total_votes: i64,
}

/// Projection of a rating to what one session is allowed to see about
/// its own votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRating {
    pub proverb_id: String,
    pub rating: i32,
}

/// Response envelope for a submitted vote: the stored row plus the
/// refreshed aggregate, so the client can reconcile in one round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub rating: Rating,
    pub stats: ProverbRatingStats,
}

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn is_valid_rating(value: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&value)
}
