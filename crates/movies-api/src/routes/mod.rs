//! # API Route Modules
//!
//! - `movies`: movie CRUD and the paged, filtered listing. Reads go
//!   through the output cache; writes evict it.
//! - `ratings`: per-user ratings. Never cached.

pub mod movies;
pub mod ratings;

use uuid::Uuid;

use crate::error::AppError;

/// Parse a movie id path segment. Anything but a UUID cannot name a movie.
pub(crate) fn parse_movie_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("movie {raw}")))
}
