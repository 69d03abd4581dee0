//! # Prometheus Metrics
//!
//! HTTP request metrics recorded through the `metrics` facade and rendered
//! by `metrics-exporter-prometheus` at `/metrics`.
//!
//! | Metric                                  | Kind      | Labels           |
//! |-----------------------------------------|-----------|------------------|
//! | `movies_http_requests_total`            | counter   | method, status   |
//! | `movies_http_request_duration_seconds`  | histogram | method           |
//! | `movies_http_errors_total`              | counter   | method, status   |
//! | `movies_output_cache_hits_total`        | counter   |                  |
//! | `movies_output_cache_misses_total`      | counter   |                  |
//!
//! Without an installed recorder every macro is a no-op, which is how the
//! test suites run.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Install the process-wide Prometheus recorder. Call once at startup.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets(DURATION_BUCKETS)?
        .install_recorder()
}

/// Record count, latency and error class of every request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "movies_http_requests_total",
        "method" => method.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("movies_http_request_duration_seconds", "method" => method.clone())
        .record(elapsed);
    if status.is_client_error() || status.is_server_error() {
        metrics::counter!(
            "movies_http_errors_total",
            "method" => method,
            "status" => status.as_u16().to_string()
        )
        .increment(1);
    }

    response
}

/// GET /metrics — Prometheus text exposition.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn middleware_passes_response_through() {
        let app = Router::new()
            .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
            .layer(from_fn(metrics_middleware));
        let response = app
            .oneshot(Request::builder().uri("/teapot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
