use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::{
    http::handlers::{get_ratings_handler, login_handler, submit_rating_handler},
    middleware::{create_auth_rate_limiter, rate_limit_middleware},
    state::AppState,
};

pub fn create_http_routes(state: AppState) -> Router {
    let auth_rate_limiter = create_auth_rate_limiter();

    Router::new()
        .route("/api/auth", post(login_handler))
        .route_layer(axum_middleware::from_fn(move |req, next| {
            rate_limit_middleware(auth_rate_limiter.clone(), req, next)
        }))
        .route(
            "/api/ratings",
            get(get_ratings_handler).post(submit_rating_handler),
        )
        .with_state(state)
}
