pub mod auth;
pub mod client;
pub mod db;
pub mod errors;
mod http;
mod middleware;
pub mod models;
mod state;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, middleware as axum_middleware};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    db::{PostgresRatingsRepository, SupabaseRatingsRepository},
    errors::AppError,
    middleware::{cors_layer, create_global_rate_limiter, rate_limit_middleware},
    state::{AppState, SharedRatingsRepository},
};

/// Picks the ratings engine once at startup; the two are never mixed
/// at runtime.
async fn build_ratings_repository() -> Result<SharedRatingsRepository, AppError> {
    let backend = std::env::var("RATINGS_BACKEND").unwrap_or_else(|_| "postgres".to_string());

    match backend.as_str() {
        "postgres" => {
            let database_url = std::env::var("DATABASE_URL")
                .map_err(|_| AppError::EnvError("DATABASE_URL must be set".into()))?;
            let repository = PostgresRatingsRepository::connect(&database_url).await?;
            repository.run_migrations().await?;
            tracing::info!("Using Postgres ratings backend");
            Ok(Arc::new(repository))
        }
        "supabase" => {
            let repository = SupabaseRatingsRepository::from_env()?;
            tracing::info!("Using Supabase ratings backend");
            Ok(Arc::new(repository))
        }
        other => Err(AppError::EnvError(format!(
            "Unknown RATINGS_BACKEND: {other}"
        ))),
    }
}

pub async fn start_server() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let ratings = match build_ratings_repository().await {
        Ok(ratings) => ratings,
        Err(e) => {
            tracing::error!("Failed to initialize ratings backend: {}", e);
            panic!("Failed to initialize ratings backend: {}", e);
        }
    };

    let state = AppState { ratings };

    let global_rate_limiter = create_global_rate_limiter();

    let app = Router::new()
        .merge(http::create_http_routes(state))
        .layer(axum_middleware::from_fn(move |req, next| {
            rate_limit_middleware(global_rate_limiter.clone(), req, next)
        }))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .fallback(|| async { "404 Not Found" });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3001);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind address");

    tracing::info!("Proverbs server running on port {port}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
