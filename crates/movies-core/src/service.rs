//! # Movie and Rating Services
//!
//! Orchestration over the repositories: validate, check existence, write,
//! then attach computed rating fields. Validation failures return before
//! any repository write is issued.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{RepositoryError, ServiceError, ValidationErrors};
use crate::movie::{Movie, MovieRating};
use crate::options::{GetAllMoviesOptions, MovieFilter};
use crate::repository::{MovieRepository, RatingRepository};
use crate::validation::{validate_options, validate_rating, MovieValidator};

const DUPLICATE_SLUG: &str = "This movie already exists in the system";

fn duplicate_slug() -> ServiceError {
    ServiceError::Validation(ValidationErrors::single("Slug", DUPLICATE_SLUG))
}

#[derive(Clone)]
pub struct MovieService {
    movies: Arc<dyn MovieRepository>,
    ratings: Arc<dyn RatingRepository>,
    validator: MovieValidator,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieRepository>, ratings: Arc<dyn RatingRepository>) -> Self {
        let validator = MovieValidator::new(movies.clone());
        Self {
            movies,
            ratings,
            validator,
        }
    }

    /// Validate and insert a new movie.
    ///
    /// An insert that affects no rows (another request took the slug between
    /// validation and the write) is reported as the duplicate-slug failure.
    pub async fn create(&self, movie: &Movie) -> Result<(), ServiceError> {
        self.validator.validate(movie).await?;
        match self.movies.create(movie).await {
            Ok(true) => {
                tracing::info!(movie_id = %movie.id, slug = %movie.slug(), "movie created");
                Ok(())
            }
            Ok(false) | Err(RepositoryError::Conflict(_)) => {
                tracing::warn!(slug = %movie.slug(), "movie insert lost slug race");
                Err(duplicate_slug())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_id(
        &self,
        id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, ServiceError> {
        Ok(self.movies.get_by_id(id, user_id).await?)
    }

    pub async fn get_by_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, ServiceError> {
        Ok(self.movies.get_by_slug(slug, user_id).await?)
    }

    /// One page of movies. Options are validated first.
    pub async fn get_all(&self, options: &GetAllMoviesOptions) -> Result<Vec<Movie>, ServiceError> {
        validate_options(options)?;
        Ok(self.movies.get_all(options).await?)
    }

    pub async fn get_count(&self, filter: &MovieFilter) -> Result<i64, ServiceError> {
        Ok(self.movies.get_count(filter).await?)
    }

    /// Validate and replace a movie. `Ok(None)` when the id does not exist.
    ///
    /// The returned movie carries the current aggregate rating and, when
    /// `user_id` is given, that user's rating.
    pub async fn update(
        &self,
        mut movie: Movie,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, ServiceError> {
        self.validator.validate(&movie).await?;
        if !self.movies.exists_by_id(movie.id).await? {
            return Ok(None);
        }

        match self.movies.update(&movie).await {
            Ok(true) => {}
            // Deleted between the existence check and the write.
            Ok(false) => return Ok(None),
            Err(RepositoryError::Conflict(_)) => return Err(duplicate_slug()),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(movie_id = %movie.id, "movie updated");

        match user_id {
            Some(user) => {
                let (rating, user_rating) =
                    self.ratings.get_average_and_user_rating(movie.id, user).await?;
                movie.rating = rating;
                movie.user_rating = user_rating;
            }
            None => {
                movie.rating = self.ratings.get_average(movie.id).await?;
                movie.user_rating = None;
            }
        }
        Ok(Some(movie))
    }

    /// Remove a movie with its genres and ratings. `false` when absent.
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, ServiceError> {
        let deleted = self.movies.delete_by_id(id).await?;
        if deleted {
            tracing::info!(movie_id = %id, "movie deleted");
        }
        Ok(deleted)
    }
}

#[derive(Clone)]
pub struct RatingService {
    ratings: Arc<dyn RatingRepository>,
    movies: Arc<dyn MovieRepository>,
}

impl RatingService {
    pub fn new(ratings: Arc<dyn RatingRepository>, movies: Arc<dyn MovieRepository>) -> Self {
        Self { ratings, movies }
    }

    /// Insert or replace the caller's rating. `false` when the movie does not exist.
    ///
    /// Out-of-range values are rejected before any repository access.
    pub async fn rate_movie(
        &self,
        movie_id: Uuid,
        rating: i32,
        user_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let rating = validate_rating(rating)?;
        if !self.movies.exists_by_id(movie_id).await? {
            return Ok(false);
        }
        match self.ratings.rate(movie_id, rating, user_id).await {
            Ok(rated) => Ok(rated),
            // The movie vanished after the existence check.
            Err(RepositoryError::Conflict(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_rating(&self, movie_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.ratings.delete_rating(movie_id, user_id).await?)
    }

    pub async fn get_ratings_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MovieRating>, ServiceError> {
        Ok(self.ratings.get_ratings_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDatabase;
    use crate::options::SortOrder;

    fn services() -> (MemoryDatabase, MovieService, RatingService) {
        let db = MemoryDatabase::new();
        let movies: Arc<dyn MovieRepository> = Arc::new(db.movie_repository());
        let ratings: Arc<dyn RatingRepository> = Arc::new(db.rating_repository());
        let movie_service = MovieService::new(movies.clone(), ratings.clone());
        let rating_service = RatingService::new(ratings, movies);
        (db, movie_service, rating_service)
    }

    fn happy_death_day() -> Movie {
        Movie::new("Happy Death Day", 2017, vec!["Horror".into()])
    }

    fn assert_validation_on(err: ServiceError, property: &str) {
        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.has_property(property), "no {property} failure in {errors}")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn happy_death_day_lifecycle() {
        let (db, movies, _) = services();
        let movie = happy_death_day();
        movies.create(&movie).await.unwrap();
        assert_eq!(movie.slug(), "happy-death-day-2017");

        let updated = Movie::with_id(
            movie.id,
            "Happy Death Day",
            2017,
            vec!["Horror".into(), "Comedy".into()],
        );
        let returned = movies.update(updated, None).await.unwrap().unwrap();
        assert_eq!(returned.genres, vec!["Horror", "Comedy"]);

        let fetched = movies.get_by_id(movie.id, None).await.unwrap().unwrap();
        assert_eq!(fetched.genres, vec!["Horror", "Comedy"]);

        assert!(movies.delete_by_id(movie.id).await.unwrap());
        assert!(movies.get_by_id(movie.id, None).await.unwrap().is_none());
        assert!(db.genre_rows(movie.id).is_empty());
    }

    #[tokio::test]
    async fn second_movie_with_same_slug_is_rejected() {
        let (_, movies, _) = services();
        movies.create(&happy_death_day()).await.unwrap();
        let twin = Movie::new("HAPPY Death Day!", 2017, vec!["Comedy".into()]);
        assert_eq!(twin.slug(), happy_death_day().slug());

        let err = movies.create(&twin).await.unwrap_err();
        assert_validation_on(err, "Slug");
        assert_eq!(movies.get_count(&MovieFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn invalid_movie_writes_nothing() {
        let (_, movies, _) = services();
        let invalid = Movie::new("", 2017, vec![]);
        let err = movies.create(&invalid).await.unwrap_err();
        assert_validation_on(err, "Title");
        assert_eq!(movies.get_count(&MovieFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_of_missing_movie_is_none() {
        let (_, movies, _) = services();
        let result = movies.update(happy_death_day(), None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_attaches_ratings() {
        let (_, movies, ratings) = services();
        let movie = happy_death_day();
        movies.create(&movie).await.unwrap();
        let me = Uuid::new_v4();
        ratings.rate_movie(movie.id, 4, me).await.unwrap();
        ratings.rate_movie(movie.id, 2, Uuid::new_v4()).await.unwrap();

        let anonymous = movies.update(movie.clone(), None).await.unwrap().unwrap();
        assert_eq!(anonymous.rating, Some(3.0));
        assert_eq!(anonymous.user_rating, None);

        let mine = movies.update(movie, Some(me)).await.unwrap().unwrap();
        assert_eq!(mine.rating, Some(3.0));
        assert_eq!(mine.user_rating, Some(4));
    }

    #[tokio::test]
    async fn invalid_options_are_rejected() {
        let (_, movies, _) = services();
        let options = GetAllMoviesOptions {
            sort_field: Some("director".into()),
            sort_order: SortOrder::Ascending,
            ..Default::default()
        };
        let err = movies.get_all(&options).await.unwrap_err();
        assert_validation_on(err, "SortField");
    }

    #[tokio::test]
    async fn out_of_range_rating_writes_nothing() {
        let (db, movies, ratings) = services();
        let movie = happy_death_day();
        movies.create(&movie).await.unwrap();
        let user = Uuid::new_v4();

        for bad in [0, 6, 200, -1, 256] {
            let err = ratings.rate_movie(movie.id, bad, user).await.unwrap_err();
            assert_validation_on(err, "Rating");
        }
        assert_eq!(db.rating_rows(movie.id), 0);
    }

    #[tokio::test]
    async fn rating_missing_movie_returns_false() {
        let (_, _, ratings) = services();
        let rated = ratings.rate_movie(Uuid::new_v4(), 3, Uuid::new_v4()).await.unwrap();
        assert!(!rated);
    }

    #[tokio::test]
    async fn rating_twice_keeps_one_entry() {
        let (_, movies, ratings) = services();
        let movie = happy_death_day();
        movies.create(&movie).await.unwrap();
        let user = Uuid::new_v4();

        assert!(ratings.rate_movie(movie.id, 1, user).await.unwrap());
        assert!(ratings.rate_movie(movie.id, 5, user).await.unwrap());

        let mine = ratings.get_ratings_for_user(user).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].rating, 5);
    }

    #[tokio::test]
    async fn delete_removes_ratings() {
        let (db, movies, ratings) = services();
        let movie = happy_death_day();
        movies.create(&movie).await.unwrap();
        let user = Uuid::new_v4();
        ratings.rate_movie(movie.id, 3, user).await.unwrap();

        assert!(movies.delete_by_id(movie.id).await.unwrap());
        assert_eq!(db.rating_rows(movie.id), 0);
        assert!(ratings.get_ratings_for_user(user).await.unwrap().is_empty());
        assert!(!movies.delete_by_id(movie.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_rating_reports_presence() {
        let (_, movies, ratings) = services();
        let movie = happy_death_day();
        movies.create(&movie).await.unwrap();
        let user = Uuid::new_v4();
        ratings.rate_movie(movie.id, 3, user).await.unwrap();

        assert!(ratings.delete_rating(movie.id, user).await.unwrap());
        assert!(!ratings.delete_rating(movie.id, user).await.unwrap());
    }
}
