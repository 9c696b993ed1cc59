use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthClaims,
    db,
    errors::AppError,
    models::{ProverbRatingStats, RatingSubmission, UserRating, rating::is_valid_rating},
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingPayload {
    pub proverb_id: Option<String>,
    pub session_id: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingsQuery {
    pub proverb_ids: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct RatingStatsResponse {
    pub stats: Vec<ProverbRatingStats>,
}

#[derive(Serialize)]
pub struct UserRatingsResponse {
    pub ratings: Vec<UserRating>,
}

pub async fn submit_rating_handler(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
    Json(payload): Json<SubmitRatingPayload>,
) -> Result<Json<RatingSubmission>, (StatusCode, String)> {
    let (Some(proverb_id), Some(session_id), Some(rating)) =
        (payload.proverb_id, payload.session_id, payload.rating)
    else {
        return Err(AppError::BadRequest(
            "proverbId, sessionId, and rating are required".into(),
        )
        .to_response());
    };

    if proverb_id.trim().is_empty() || session_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "proverbId, sessionId, and rating are required".into(),
        )
        .to_response());
    }

    if !is_valid_rating(rating) {
        return Err(
            AppError::BadRequest("rating must be a number between 1 and 5".into()).to_response(),
        );
    }

    let submission = db::submit_rating(state.ratings.as_ref(), &proverb_id, &session_id, rating)
        .await
        .map_err(|err| {
            tracing::error!("Error submitting rating for {}: {}", proverb_id, err);
            err.to_response()
        })?;

    tracing::info!(
        "Rating {} recorded for proverb {} ({} votes)",
        rating,
        proverb_id,
        submission.stats.total_votes
    );

    Ok(Json(submission))
}

pub async fn get_ratings_handler(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
    Query(query): Query<RatingsQuery>,
) -> Result<Response, (StatusCode, String)> {
    if let Some(session_id) = query.session_id.filter(|s| !s.trim().is_empty()) {
        let ratings = state
            .ratings
            .get_user_ratings(&session_id)
            .await
            .map_err(|err| {
                tracing::error!("Error fetching user ratings: {}", err);
                err.to_response()
            })?;

        return Ok(Json(UserRatingsResponse { ratings }).into_response());
    }

    if let Some(raw_ids) = query.proverb_ids {
        let proverb_ids: Vec<String> = raw_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();

        let stats = state
            .ratings
            .get_rating_stats(&proverb_ids)
            .await
            .map_err(|err| {
                tracing::error!("Error fetching rating stats: {}", err);
                err.to_response()
            })?;

        return Ok(Json(RatingStatsResponse { stats }).into_response());
    }

    Err(AppError::BadRequest(
        "Either proverbIds or sessionId query parameter is required".into(),
    )
    .to_response())
}
