//! # movies-core — Domain Layer for the Movies Catalog
//!
//! Holds everything the HTTP layer orchestrates but does not own:
//!
//! - [`movie`]: the `Movie` and `MovieRating` models, slug derivation,
//!   genre normalization.
//! - [`options`]: list query options, sort order, and the shared
//!   [`MovieFilter`] predicate used by both list and count queries.
//! - [`validation`]: movie, query-option and rating rule sets. Failures
//!   are aggregated into [`ValidationErrors`].
//! - [`repository`]: the `MovieRepository` / `RatingRepository` seams.
//! - [`memory`]: in-memory repositories for development mode and tests.
//! - [`service`]: `MovieService` and `RatingService` orchestration.
//!
//! ## Crate Policy
//!
//! - No SQL and no HTTP here. Postgres repositories live in `movies-api`.
//! - Absence of an entity is `Option::None` or `false`, never an error.

pub mod error;
pub mod memory;
pub mod movie;
pub mod options;
pub mod repository;
pub mod service;
pub mod validation;

pub use error::{RepositoryError, ServiceError, ValidationErrors, ValidationFailure};
pub use movie::{Movie, MovieRating};
pub use options::{GetAllMoviesOptions, MovieFilter, MovieSortField, SortOrder};
pub use repository::{MovieRepository, RatingRepository};
pub use service::{MovieService, RatingService};
