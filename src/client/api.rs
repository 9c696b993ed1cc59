use reqwest::StatusCode;
use serde_json::json;

use crate::{
    client::{session::SessionIdentity, star_rating::StarRating},
    errors::AppError,
    models::{ProverbRatingStats, RatingSubmission, UserRating, auth::LoginResponse},
};

#[derive(Debug, serde::Deserialize)]
struct RatingStatsBody {
    stats: Vec<ProverbRatingStats>,
}

#[derive(Debug, serde::Deserialize)]
struct UserRatingsBody {
    ratings: Vec<UserRating>,
}

/// Typed client for the ratings endpoints, holding the bearer token
/// from a PIN login.
pub struct RatingsApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RatingsApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Exchanges the access PIN for a bearer token.
    pub async fn login(base_url: &str, pin: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();

        let response = http
            .post(format!("{}/api/auth", base_url))
            .json(&json!({ "pin": pin }))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized("Invalid PIN".into()));
        }
        let response = response.error_for_status()?;

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: body.token,
        })
    }

    pub async fn submit_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
        rating: i32,
    ) -> Result<RatingSubmission, AppError> {
        let response = self
            .http
            .post(format!("{}/api/ratings", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({
                "proverbId": proverb_id,
                "sessionId": session_id,
                "rating": rating,
            }))
            .send()
            .await?
            .error_for_status()?;

        response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))
    }

    pub async fn rating_stats(
        &self,
        proverb_ids: &[String],
    ) -> Result<Vec<ProverbRatingStats>, AppError> {
        let response = self
            .http
            .get(format!("{}/api/ratings", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("proverbIds", proverb_ids.join(","))])
            .send()
            .await?
            .error_for_status()?;

        let body: RatingStatsBody = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        Ok(body.stats)
    }

    pub async fn user_ratings(&self, session_id: &str) -> Result<Vec<UserRating>, AppError> {
        let response = self
            .http
            .get(format!("{}/api/ratings", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("sessionId", session_id)])
            .send()
            .await?
            .error_for_status()?;

        let body: UserRatingsBody = response
            .json()
            .await
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        Ok(body.ratings)
    }
}

/// Drives one star click end to end: speculative update, submission,
/// then confirm or rollback. A click that the widget ignores (already
/// pending) resolves immediately without a request. Failures roll the
/// widget back and are returned for the UI to surface; retrying is the
/// user's call.
pub async fn rate_proverb(
    widget: &mut StarRating,
    session: &mut SessionIdentity,
    api: &RatingsApi,
    rating: i32,
) -> Result<(), AppError> {
    let Some(request) = widget.click(rating) else {
        return Ok(());
    };

    match api
        .submit_rating(&request.proverb_id, session.get_or_create(), request.rating)
        .await
    {
        Ok(submission) => {
            widget.confirm(&submission.rating, &submission.stats);
            Ok(())
        }
        Err(err) => {
            widget.fail();
            Err(err)
        }
    }
}
