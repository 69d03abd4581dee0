//! Rating persistence operations on the `ratings` table.
//!
//! One row per `(user_id, movie_id)`. Rating a movie twice replaces the
//! earlier value in a single upsert.

use async_trait::async_trait;
use movies_core::{MovieRating, RatingRepository, RepositoryError};
use sqlx::PgPool;
use uuid::Uuid;

use super::map_err;

/// Insert or replace the caller's rating.
pub async fn upsert(
    pool: &PgPool,
    movie_id: Uuid,
    rating: u8,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO ratings (user_id, movie_id, rating) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, movie_id) DO UPDATE SET rating = EXCLUDED.rating",
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(i16::from(rating))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn average(pool: &PgPool, movie_id: Uuid) -> Result<Option<f32>, sqlx::Error> {
    sqlx::query_scalar("SELECT AVG(rating)::real FROM ratings WHERE movie_id = $1")
        .bind(movie_id)
        .fetch_one(pool)
        .await
}

pub async fn average_and_user_rating(
    pool: &PgPool,
    movie_id: Uuid,
    user_id: Uuid,
) -> Result<(Option<f32>, Option<i16>), sqlx::Error> {
    sqlx::query_as(
        "SELECT AVG(rating)::real,
                (SELECT rating FROM ratings WHERE movie_id = $1 AND user_id = $2)
         FROM ratings WHERE movie_id = $1",
    )
    .bind(movie_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, movie_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ratings WHERE movie_id = $1 AND user_id = $2")
        .bind(movie_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Every rating the user has given, with the rated movie's slug.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<RatingRow>, sqlx::Error> {
    sqlx::query_as::<_, RatingRow>(
        "SELECT r.movie_id, m.slug, r.rating
         FROM ratings r INNER JOIN movies m ON m.id = r.movie_id
         WHERE r.user_id = $1
         ORDER BY r.movie_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
pub struct RatingRow {
    movie_id: Uuid,
    slug: String,
    rating: i16,
}

fn to_rating(value: i16, movie_id: Uuid) -> Result<u8, RepositoryError> {
    u8::try_from(value).map_err(|_| {
        RepositoryError::CorruptRow(format!("rating {value} for movie {movie_id} out of range"))
    })
}

impl RatingRow {
    fn into_rating(self) -> Result<MovieRating, RepositoryError> {
        Ok(MovieRating {
            rating: to_rating(self.rating, self.movie_id)?,
            movie_id: self.movie_id,
            slug: self.slug,
        })
    }
}

/// [`RatingRepository`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRatingRepository {
    pool: PgPool,
}

impl PgRatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingRepository for PgRatingRepository {
    async fn rate(
        &self,
        movie_id: Uuid,
        rating: u8,
        user_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        upsert(&self.pool, movie_id, rating, user_id)
            .await
            .map_err(map_err)
    }

    async fn get_average(&self, movie_id: Uuid) -> Result<Option<f32>, RepositoryError> {
        average(&self.pool, movie_id).await.map_err(map_err)
    }

    async fn get_average_and_user_rating(
        &self,
        movie_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Option<f32>, Option<u8>), RepositoryError> {
        let (avg, mine) = average_and_user_rating(&self.pool, movie_id, user_id)
            .await
            .map_err(map_err)?;
        let mine = mine.map(|value| to_rating(value, movie_id)).transpose()?;
        Ok((avg, mine))
    }

    async fn delete_rating(&self, movie_id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        delete(&self.pool, movie_id, user_id).await.map_err(map_err)
    }

    async fn get_ratings_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MovieRating>, RepositoryError> {
        list_for_user(&self.pool, user_id)
            .await
            .map_err(map_err)?
            .into_iter()
            .map(RatingRow::into_rating)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_ratings_map_to_models() {
        let movie_id = Uuid::now_v7();
        let row = RatingRow {
            movie_id,
            slug: "happy-death-day-2017".into(),
            rating: 4,
        };
        let rating = row.into_rating().unwrap();
        assert_eq!(rating.movie_id, movie_id);
        assert_eq!(rating.rating, 4);
    }

    #[test]
    fn negative_rating_is_corrupt() {
        let err = to_rating(-3, Uuid::nil()).unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptRow(_)));
    }
}
