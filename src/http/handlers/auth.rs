use axum::{Json, http::StatusCode};

use crate::{
    auth::{TOKEN_LIFETIME_DAYS, generate_access_token},
    errors::AppError,
    models::auth::{LoginPayload, LoginResponse},
};

pub async fn login_handler(
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let Some(pin) = payload.pin.filter(|p| !p.is_empty()) else {
        return Err(AppError::BadRequest("PIN is required".into()).to_response());
    };

    let access_pin = std::env::var("ACCESS_PIN")
        .map_err(|_| AppError::EnvError("ACCESS_PIN must be set".into()).to_response())?;

    if pin != access_pin {
        tracing::warn!("Login attempt with invalid PIN");
        return Err(AppError::Unauthorized("Invalid PIN".into()).to_response());
    }

    let token = generate_access_token().map_err(|err| {
        tracing::error!("Error generating access token: {}", err);
        err.to_response()
    })?;

    tracing::info!("Access token issued");

    Ok(Json(LoginResponse {
        success: true,
        token,
        expires_in: TOKEN_LIFETIME_DAYS as u64 * 24 * 60 * 60 * 1000,
    }))
}
