//! # Repository Seams
//!
//! Two implementations exist: Postgres (`movies-api::db`) and in-memory
//! ([`crate::memory`]). Each call acquires its own connection or lock and
//! releases it before returning. Multi-statement writes are atomic.
//!
//! Cancellation is future drop: an abandoned call releases its connection
//! and rolls back any open transaction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::movie::{Movie, MovieRating};
use crate::options::{GetAllMoviesOptions, MovieFilter};

#[async_trait]
pub trait MovieRepository: Send + Sync {
    /// Insert the movie and its genres. `false` when nothing was inserted
    /// (slug already taken); no partial write remains.
    async fn create(&self, movie: &Movie) -> Result<bool, RepositoryError>;

    /// Fetch by id with the aggregate rating and, when `user_id` is given,
    /// that user's rating.
    async fn get_by_id(
        &self,
        id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, RepositoryError>;

    async fn get_by_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, RepositoryError>;

    /// One page of movies matching `options.filter()`, sorted as requested
    /// with primary key order breaking ties.
    async fn get_all(&self, options: &GetAllMoviesOptions) -> Result<Vec<Movie>, RepositoryError>;

    /// Number of movies matching `filter`.
    async fn get_count(&self, filter: &MovieFilter) -> Result<i64, RepositoryError>;

    /// Replace title, year, slug and the whole genre set. `false` when the id does not exist.
    async fn update(&self, movie: &Movie) -> Result<bool, RepositoryError>;

    /// Remove the movie with its genres and ratings. `false` when the id does not exist.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepositoryError>;

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert or replace the `(movie, user)` rating in one atomic statement.
    async fn rate(&self, movie_id: Uuid, rating: u8, user_id: Uuid)
        -> Result<bool, RepositoryError>;

    async fn get_average(&self, movie_id: Uuid) -> Result<Option<f32>, RepositoryError>;

    async fn get_average_and_user_rating(
        &self,
        movie_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Option<f32>, Option<u8>), RepositoryError>;

    async fn delete_rating(&self, movie_id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError>;

    async fn get_ratings_for_user(&self, user_id: Uuid)
        -> Result<Vec<MovieRating>, RepositoryError>;
}
