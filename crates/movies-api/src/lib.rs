//! # movies-api — Axum HTTP Service for the Movies Catalog
//!
//! ## API Surface
//!
//! | Route                      | Module               | Auth                    |
//! |----------------------------|----------------------|-------------------------|
//! | `/movies`, `/movies/{id}`  | [`routes::movies`]   | optional / policy-gated |
//! | `/movies/{id}/ratings`     | [`routes::ratings`]  | authenticated           |
//! | `/ratings/me`              | [`routes::ratings`]  | authenticated           |
//! | `/openapi.json`            | [`openapi`]          | none                    |
//! | `/metrics`                 | [`middleware::metrics`] | none                 |
//! | `/health/*`                | this module          | none                    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Versioning → AuthMiddleware → OutputCache (movie routes) → Handler
//! ```
//!
//! The auth middleware only attaches a [`auth::CallerIdentity`] when a valid
//! bearer token is present; handlers decide whether one is required.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod mapping;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth middleware so
/// they stay reachable without credentials.
pub fn app(state: AppState) -> Router {
    let verifier = state.auth.clone();

    let api = Router::new()
        .merge(routes::movies::router(state.cache.clone()))
        .merge(routes::ratings::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::versioning::versioning_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(verifier))
        .with_state(state.clone());

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::metrics_handler))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

/// Liveness probe. Always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. 200 when the database answers (or none is configured),
/// 503 otherwise.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let Some(pool) = &state.db_pool else {
        return (StatusCode::OK, "ready");
    };
    match db::ping(pool).await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
