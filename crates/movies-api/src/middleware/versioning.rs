//! # API Versioning
//!
//! Clients may pin a version with an `api-version` media type parameter on
//! `Accept` or `Content-Type`, e.g. `Accept: application/json;api-version=1.0`.
//! Requests without one get the default version. Every response reports the
//! supported versions in `api-supported-versions`.

use axum::extract::Request;
use axum::http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

pub const DEFAULT_API_VERSION: &str = "1.0";

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

pub const SUPPORTED_VERSIONS_HEADER: HeaderName = HeaderName::from_static("api-supported-versions");

const VERSION_PARAM: &str = "api-version";

/// `1` and `1.0` name the same version.
fn normalize(version: &str) -> String {
    if version.contains('.') {
        version.to_string()
    } else {
        format!("{version}.0")
    }
}

/// Every `api-version` parameter found on `Accept` and `Content-Type`.
fn requested_versions(headers: &HeaderMap) -> Vec<String> {
    [ACCEPT, CONTENT_TYPE]
        .iter()
        .flat_map(|name| headers.get_all(name))
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .flat_map(|media_range| media_range.split(';').skip(1))
        .filter_map(|param| param.split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case(VERSION_PARAM))
        .map(|(_, value)| normalize(value.trim().trim_matches('"')))
        .collect()
}

/// Reject unsupported or conflicting versions with 400.
pub async fn versioning_middleware(request: Request, next: Next) -> Response {
    let mut requested = requested_versions(request.headers());
    requested.sort();
    requested.dedup();

    let rejection = match requested.as_slice() {
        [] => None,
        [version] if SUPPORTED_VERSIONS.contains(&version.as_str()) => None,
        [version] => Some(format!(
            "API version {version} is not supported; supported: {}",
            SUPPORTED_VERSIONS.join(", ")
        )),
        _ => Some(format!("ambiguous API version: {}", requested.join(", "))),
    };

    let mut response = match rejection {
        Some(message) => {
            tracing::debug!(%message, "API version rejected");
            AppError::BadRequest(message).into_response()
        }
        None => next.run(request).await,
    };
    response.headers_mut().insert(
        SUPPORTED_VERSIONS_HEADER,
        HeaderValue::from_static(DEFAULT_API_VERSION),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/movies", get(|| async { "ok" }))
            .layer(from_fn(versioning_middleware))
    }

    async fn call(accept: Option<&str>) -> Response {
        let mut builder = Request::builder().uri("/movies");
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[test]
    fn versions_are_read_from_media_type_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/plain, application/json; API-Version=\"1\""),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(requested_versions(&headers), vec!["1.0"]);
    }

    #[tokio::test]
    async fn unversioned_and_supported_requests_pass() {
        for accept in [None, Some("application/json"), Some("application/json;api-version=1.0")] {
            let response = call(accept).await;
            assert_eq!(response.status(), StatusCode::OK, "{accept:?}");
            assert_eq!(response.headers()[SUPPORTED_VERSIONS_HEADER], "1.0");
        }
    }

    #[tokio::test]
    async fn unsupported_version_is_400() {
        let response = call(Some("application/json;api-version=2.0")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[SUPPORTED_VERSIONS_HEADER], "1.0");
    }

    #[tokio::test]
    async fn conflicting_versions_are_400() {
        let response = call(Some("application/json;api-version=1.0, text/json;api-version=3.0")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
