//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Everything inside is cheap to clone.
//!
//! Two constructors pick the storage backend: [`AppState::in_memory`] for
//! development and tests, [`AppState::with_pool`] for PostgreSQL.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use movies_core::memory::MemoryDatabase;
use movies_core::{MovieRepository, MovieService, RatingRepository, RatingService};
use sqlx::PgPool;

use crate::auth::{ApiKey, JwtVerifier};
use crate::cache::OutputCache;
use crate::config::JwtConfig;
use crate::db::{PgMovieRepository, PgRatingRepository};

#[derive(Clone)]
pub struct AppState {
    pub movies: MovieService,
    pub ratings: RatingService,
    pub cache: OutputCache,
    pub auth: JwtVerifier,
    /// Present when `DATABASE_URL` is configured; used by the readiness probe.
    pub db_pool: Option<PgPool>,
    /// Present when the Prometheus recorder was installed.
    pub metrics: Option<PrometheusHandle>,
    /// When set, `POST /movies` also requires a matching `x-api-key` header.
    pub api_key: Option<ApiKey>,
}

impl AppState {
    /// State backed by the in-memory repositories.
    pub fn in_memory(jwt: &JwtConfig) -> Self {
        let db = MemoryDatabase::new();
        Self::from_repositories(
            Arc::new(db.movie_repository()),
            Arc::new(db.rating_repository()),
            JwtVerifier::new(jwt),
            None,
        )
    }

    /// State backed by PostgreSQL.
    pub fn with_pool(jwt: &JwtConfig, pool: PgPool) -> Self {
        Self::from_repositories(
            Arc::new(PgMovieRepository::new(pool.clone())),
            Arc::new(PgRatingRepository::new(pool.clone())),
            JwtVerifier::new(jwt),
            Some(pool),
        )
    }

    fn from_repositories(
        movies: Arc<dyn MovieRepository>,
        ratings: Arc<dyn RatingRepository>,
        auth: JwtVerifier,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            movies: MovieService::new(movies.clone(), ratings.clone()),
            ratings: RatingService::new(ratings, movies),
            cache: OutputCache::default(),
            auth,
            db_pool,
            metrics: None,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<ApiKey>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
