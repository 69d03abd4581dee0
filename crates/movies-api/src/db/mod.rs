//! # Database Persistence Layer
//!
//! Postgres repositories via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set the API
//! persists movies, genres and ratings to PostgreSQL and applies the
//! embedded migrations at startup. When absent it runs on the in-memory
//! repositories from `movies-core` (development and tests).
//!
//! Each repository call acquires one pooled connection, or one transaction
//! for multi-statement writes, and releases it on every exit path. A
//! transaction that is dropped before `commit` rolls back.

pub mod movies;
pub mod ratings;

use std::time::Duration;

use movies_core::RepositoryError;
use sqlx::postgres::{PgPool, PgPoolOptions};

pub use movies::PgMovieRepository;
pub use ratings::PgRatingRepository;

use crate::config::AppConfig;

/// Connect and migrate. `Ok(None)` when no database is configured.
pub async fn init_pool(config: &AppConfig) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!(
            "DATABASE_URL not set; running in-memory only mode. \
             State will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Readiness probe query.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Unique and foreign-key violations become `Conflict`; everything else is
/// an infrastructure failure.
pub(crate) fn map_err(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() || db.is_foreign_key_violation() {
            return RepositoryError::Conflict(db.message().to_string());
        }
    }
    RepositoryError::database(err)
}
