//! # In-Memory Repositories
//!
//! Backs the API when no `DATABASE_URL` is configured, and every test that
//! does not need Postgres. Movie and rating tables sit behind one
//! `parking_lot::RwLock` so multi-table writes (delete cascading to ratings)
//! are atomic. The lock is never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::movie::{Movie, MovieRating};
use crate::options::{GetAllMoviesOptions, MovieFilter, MovieSortField, SortOrder};
use crate::repository::{MovieRepository, RatingRepository};

#[derive(Debug, Clone)]
struct StoredMovie {
    slug: String,
    title: String,
    year_of_release: i32,
    genres: Vec<String>,
}

#[derive(Debug, Default)]
struct Tables {
    /// Keyed by time-ordered id, so iteration is insertion order.
    movies: BTreeMap<Uuid, StoredMovie>,
    /// Keyed by `(movie_id, user_id)`.
    ratings: BTreeMap<(Uuid, Uuid), u8>,
}

impl Tables {
    fn slug_taken_by_other(&self, slug: &str, id: Uuid) -> bool {
        self.movies
            .iter()
            .any(|(other_id, m)| *other_id != id && m.slug == slug)
    }

    fn average(&self, movie_id: Uuid) -> Option<f32> {
        let (sum, count) = self
            .ratings
            .iter()
            .filter(|((m, _), _)| *m == movie_id)
            .fold((0u32, 0u32), |(sum, count), (_, r)| (sum + u32::from(*r), count + 1));
        (count > 0).then(|| sum as f32 / count as f32)
    }

    fn user_rating(&self, movie_id: Uuid, user_id: Option<Uuid>) -> Option<u8> {
        user_id.and_then(|user| self.ratings.get(&(movie_id, user)).copied())
    }

    fn hydrate(&self, id: Uuid, stored: &StoredMovie, user_id: Option<Uuid>) -> Movie {
        Movie {
            id,
            title: stored.title.clone(),
            year_of_release: stored.year_of_release,
            genres: stored.genres.clone(),
            rating: self.average(id),
            user_rating: self.user_rating(id, user_id),
        }
    }
}

/// Shared tables handed out to the movie and rating repositories.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movie_repository(&self) -> InMemoryMovieRepository {
        InMemoryMovieRepository { db: self.clone() }
    }

    pub fn rating_repository(&self) -> InMemoryRatingRepository {
        InMemoryRatingRepository { db: self.clone() }
    }

    /// Stored genre names for a movie, empty when the movie is gone.
    pub fn genre_rows(&self, movie_id: Uuid) -> Vec<String> {
        self.tables
            .read()
            .movies
            .get(&movie_id)
            .map(|m| m.genres.clone())
            .unwrap_or_default()
    }

    /// Number of rating rows referencing a movie.
    pub fn rating_rows(&self, movie_id: Uuid) -> usize {
        self.tables
            .read()
            .ratings
            .keys()
            .filter(|(m, _)| *m == movie_id)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryMovieRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl MovieRepository for InMemoryMovieRepository {
    async fn create(&self, movie: &Movie) -> Result<bool, RepositoryError> {
        let mut tables = self.db.tables.write();
        let slug = movie.slug();
        if tables.movies.contains_key(&movie.id) || tables.slug_taken_by_other(&slug, movie.id) {
            return Ok(false);
        }
        tables.movies.insert(
            movie.id,
            StoredMovie {
                slug,
                title: movie.title.clone(),
                year_of_release: movie.year_of_release,
                genres: movie.genres.clone(),
            },
        );
        Ok(true)
    }

    async fn get_by_id(
        &self,
        id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, RepositoryError> {
        let tables = self.db.tables.read();
        Ok(tables
            .movies
            .get(&id)
            .map(|stored| tables.hydrate(id, stored, user_id)))
    }

    async fn get_by_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, RepositoryError> {
        let tables = self.db.tables.read();
        Ok(tables
            .movies
            .iter()
            .find(|(_, stored)| stored.slug == slug)
            .map(|(id, stored)| tables.hydrate(*id, stored, user_id)))
    }

    async fn get_all(&self, options: &GetAllMoviesOptions) -> Result<Vec<Movie>, RepositoryError> {
        let tables = self.db.tables.read();
        let filter = options.filter();
        let mut rows: Vec<Movie> = tables
            .movies
            .iter()
            .map(|(id, stored)| tables.hydrate(*id, stored, options.user_id))
            .filter(|movie| filter.matches(movie))
            .collect();

        if let Some((field, order)) = options.sort() {
            rows.sort_by(|a, b| {
                let primary = match field {
                    MovieSortField::Title => a.title.cmp(&b.title),
                    MovieSortField::YearOfRelease => a.year_of_release.cmp(&b.year_of_release),
                };
                let primary = match order {
                    SortOrder::Descending => primary.reverse(),
                    _ => primary,
                };
                primary.then_with(|| a.id.cmp(&b.id))
            });
        }

        let offset = usize::try_from(options.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(options.limit()).unwrap_or(0);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_count(&self, filter: &MovieFilter) -> Result<i64, RepositoryError> {
        let tables = self.db.tables.read();
        let count = tables
            .movies
            .iter()
            .filter(|(_, stored)| filter.matches_fields(&stored.title, stored.year_of_release))
            .count();
        Ok(count as i64)
    }

    async fn update(&self, movie: &Movie) -> Result<bool, RepositoryError> {
        let mut tables = self.db.tables.write();
        let slug = movie.slug();
        if !tables.movies.contains_key(&movie.id) {
            return Ok(false);
        }
        if tables.slug_taken_by_other(&slug, movie.id) {
            return Err(RepositoryError::Conflict(format!("slug '{slug}' already exists")));
        }
        if let Some(stored) = tables.movies.get_mut(&movie.id) {
            stored.slug = slug;
            stored.title = movie.title.clone();
            stored.year_of_release = movie.year_of_release;
            stored.genres = movie.genres.clone();
        }
        Ok(true)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tables = self.db.tables.write();
        if tables.movies.remove(&id).is_none() {
            return Ok(false);
        }
        tables.ratings.retain(|(movie_id, _), _| *movie_id != id);
        Ok(true)
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.db.tables.read().movies.contains_key(&id))
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryRatingRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl RatingRepository for InMemoryRatingRepository {
    async fn rate(
        &self,
        movie_id: Uuid,
        rating: u8,
        user_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.db.tables.write();
        // Mirrors the foreign key on the ratings table.
        if !tables.movies.contains_key(&movie_id) {
            return Err(RepositoryError::Conflict(format!("movie {movie_id} does not exist")));
        }
        tables.ratings.insert((movie_id, user_id), rating);
        Ok(true)
    }

    async fn get_average(&self, movie_id: Uuid) -> Result<Option<f32>, RepositoryError> {
        Ok(self.db.tables.read().average(movie_id))
    }

    async fn get_average_and_user_rating(
        &self,
        movie_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Option<f32>, Option<u8>), RepositoryError> {
        let tables = self.db.tables.read();
        Ok((tables.average(movie_id), tables.user_rating(movie_id, Some(user_id))))
    }

    async fn delete_rating(&self, movie_id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self
            .db
            .tables
            .write()
            .ratings
            .remove(&(movie_id, user_id))
            .is_some())
    }

    async fn get_ratings_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MovieRating>, RepositoryError> {
        let tables = self.db.tables.read();
        let mut out: Vec<MovieRating> = tables
            .ratings
            .iter()
            .filter(|((_, user), _)| *user == user_id)
            .filter_map(|((movie_id, _), rating)| {
                tables.movies.get(movie_id).map(|m| MovieRating {
                    movie_id: *movie_id,
                    slug: m.slug.clone(),
                    rating: *rating,
                })
            })
            .collect();
        out.sort_by_key(|r| r.movie_id);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn happy_death_day() -> Movie {
        Movie::new("Happy Death Day", 2017, vec!["Horror".into()])
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let db = MemoryDatabase::new();
        let repo = db.movie_repository();
        let movie = happy_death_day();
        assert!(repo.create(&movie).await.unwrap());

        let by_id = repo.get_by_id(movie.id, None).await.unwrap().unwrap();
        assert_eq!(by_id.title, "Happy Death Day");
        assert_eq!(by_id.genres, vec!["Horror"]);

        let by_slug = repo
            .get_by_slug("happy-death-day-2017", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.id, movie.id);
    }

    #[tokio::test]
    async fn duplicate_slug_is_not_inserted() {
        let repo = MemoryDatabase::new().movie_repository();
        assert!(repo.create(&happy_death_day()).await.unwrap());
        assert!(!repo.create(&happy_death_day()).await.unwrap());
        assert_eq!(repo.get_count(&MovieFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_removes_ratings() {
        let db = MemoryDatabase::new();
        let movies = db.movie_repository();
        let ratings = db.rating_repository();
        let movie = happy_death_day();
        movies.create(&movie).await.unwrap();
        ratings.rate(movie.id, 4, Uuid::new_v4()).await.unwrap();
        assert_eq!(db.rating_rows(movie.id), 1);

        assert!(movies.delete_by_id(movie.id).await.unwrap());
        assert_eq!(db.rating_rows(movie.id), 0);
        assert!(db.genre_rows(movie.id).is_empty());
        assert!(!movies.delete_by_id(movie.id).await.unwrap());
    }

    #[tokio::test]
    async fn rating_upsert_keeps_one_row() {
        let db = MemoryDatabase::new();
        let movie = happy_death_day();
        db.movie_repository().create(&movie).await.unwrap();
        let ratings = db.rating_repository();
        let user = Uuid::new_v4();

        ratings.rate(movie.id, 2, user).await.unwrap();
        ratings.rate(movie.id, 5, user).await.unwrap();

        let mine = ratings.get_ratings_for_user(user).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].rating, 5);
        assert_eq!(mine[0].slug, "happy-death-day-2017");
    }

    #[tokio::test]
    async fn averages_include_every_user() {
        let db = MemoryDatabase::new();
        let movie = happy_death_day();
        db.movie_repository().create(&movie).await.unwrap();
        let ratings = db.rating_repository();
        let me = Uuid::new_v4();
        ratings.rate(movie.id, 5, me).await.unwrap();
        ratings.rate(movie.id, 2, Uuid::new_v4()).await.unwrap();

        assert_eq!(ratings.get_average(movie.id).await.unwrap(), Some(3.5));
        let (avg, mine) = ratings.get_average_and_user_rating(movie.id, me).await.unwrap();
        assert_eq!(avg, Some(3.5));
        assert_eq!(mine, Some(5));

        let fetched = db
            .movie_repository()
            .get_by_id(movie.id, Some(me))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.rating, Some(3.5));
        assert_eq!(fetched.user_rating, Some(5));
    }

    #[tokio::test]
    async fn unrated_movie_has_no_average() {
        let db = MemoryDatabase::new();
        let movie = happy_death_day();
        db.movie_repository().create(&movie).await.unwrap();
        assert_eq!(db.rating_repository().get_average(movie.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_to_taken_slug_conflicts() {
        let repo = MemoryDatabase::new().movie_repository();
        let first = happy_death_day();
        let mut second = Movie::new("Happy Death Day 2U", 2019, vec!["Horror".into()]);
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();

        second.title = "Happy Death Day".into();
        second.year_of_release = 2017;
        let err = repo.update(&second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn sorting_breaks_ties_by_insertion_order() {
        let repo = MemoryDatabase::new().movie_repository();
        let a = Movie::new("Same", 2000, vec!["x".into()]);
        let b = Movie::new("Other", 2000, vec!["x".into()]);
        let c = Movie::new("Newer", 2010, vec!["x".into()]);
        for m in [&a, &b, &c] {
            repo.create(m).await.unwrap();
        }
        let options = GetAllMoviesOptions {
            sort_field: Some("yearOfRelease".into()),
            sort_order: SortOrder::Descending,
            ..Default::default()
        };
        let ids: Vec<Uuid> = repo.get_all(&options).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
    }
}
