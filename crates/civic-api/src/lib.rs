//! # civic-api — Civic Issue Reporting Service
//!
//! Citizens report local problems with a photo and location, vote on
//! them, rate them, and flag abusive reports. Government accounts move
//! problems through their lifecycle, which credits or debits the
//! reporter's coin balance, and ban abusive accounts.
//!
//! ## API Surface
//!
//! | Prefix          | Module                | Auth                    |
//! |-----------------|-----------------------|-------------------------|
//! | `/issue/*`      | [`routes::issues`]    | bearer token            |
//! | `/gov/*`        | [`routes::gov`]       | bearer token + gov role |
//! | `/users/me`     | [`routes::users`]     | bearer token            |
//! | `/openapi.json` | [`openapi`]           | bearer token            |
//! | `/health/*`     | health checks         | none                    |
//! | `/metrics`      | Prometheus scrape     | none                    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → [government_only] → Handler
//! ```
//!
//! ## Layering
//!
//! Handlers parse requests and delegate to [`engine`], which applies the
//! rules from `civic-state` through one atomic [`store::IssueStore`] call
//! per operation.

pub mod auth;
pub mod db;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

/// Assemble the application router with all routes and middleware.
///
/// Health checks and `/metrics` are mounted outside the auth middleware
/// so they stay reachable without credentials.
pub fn app(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let api = Router::new()
        .merge(routes::issues::router())
        .merge(routes::gov::router())
        .merge(routes::users::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(Extension(metrics.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// GET /metrics — Prometheus scrape endpoint.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness check. 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check. Checks the database when one is configured.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
