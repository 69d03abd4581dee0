//! # movies-client -- Typed Rust client for the movies catalog API
//!
//! Wraps the REST surface of `movies-api` with the request and response
//! types from `movies-contracts`:
//!
//! | Method | Path                   | Client call          |
//! |--------|------------------------|----------------------|
//! | POST   | `/movies`              | [`MoviesClient::create_movie`] |
//! | GET    | `/movies/{idOrSlug}`   | [`MoviesClient::get_movie`] |
//! | GET    | `/movies`              | [`MoviesClient::get_movies`] |
//! | PUT    | `/movies/{id}`         | [`MoviesClient::update_movie`] |
//! | DELETE | `/movies/{id}`         | [`MoviesClient::delete_movie`] |
//! | PUT    | `/movies/{id}/ratings` | [`MoviesClient::rate_movie`] |
//! | DELETE | `/movies/{id}/ratings` | [`MoviesClient::delete_rating`] |
//! | GET    | `/ratings/me`          | [`MoviesClient::get_user_ratings`] |
//!
//! The bearer token from [`ClientConfig`] is attached to every request.
//! Non-2xx responses surface as [`ClientError::Api`] with the raw body;
//! [`ClientError::validation_failures`] decodes 400 responses.

pub mod config;
pub mod error;
mod movies;
mod ratings;

pub use config::ClientConfig;
pub use error::ClientError;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ConfigError;

/// Client for the movies API.
#[derive(Debug, Clone)]
pub struct MoviesClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MoviesClient {
    /// Create a new client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ConfigError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Base URL extended with `segments`, each percent-encoded as one path
    /// segment so caller text cannot alter the path or query.
    fn segment_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ConfigError::InvalidUrl(self.base_url.to_string(), "URL cannot be a base".into())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ClientError> {
        tracing::debug!(endpoint, "movies API request");
        request.send().await.map_err(|e| ClientError::Http {
            endpoint: endpoint.into(),
            source: e,
        })
    }
}

/// Turn a non-2xx response into [`ClientError::Api`].
async fn ensure_success(endpoint: &str, resp: Response) -> Result<Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(endpoint, status, "movies API error response");
    Err(ClientError::Api {
        endpoint: endpoint.into(),
        status,
        body,
    })
}

async fn decode<T: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<T, ClientError> {
    let resp = ensure_success(endpoint, resp).await?;
    resp.json().await.map_err(|e| ClientError::Deserialization {
        endpoint: endpoint.into(),
        source: e,
    })
}

fn is_not_found(resp: &Response) -> bool {
    resp.status() == StatusCode::NOT_FOUND
}
