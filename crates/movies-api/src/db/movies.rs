//! Movie persistence operations.
//!
//! Tables: `movies`, `genres` (ordered by `position`), and `ratings` for
//! the aggregate columns. The list and count queries share one filter
//! builder so a page and its total always agree.

use async_trait::async_trait;
use movies_core::{
    GetAllMoviesOptions, Movie, MovieFilter, MovieRepository, MovieSortField, RepositoryError,
    SortOrder,
};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::map_err;

const SELECT_MOVIE: &str = "SELECT m.id, m.title, m.year_of_release, \
     AVG(r.rating)::real AS rating, myr.rating AS user_rating \
     FROM movies m \
     LEFT JOIN ratings r ON r.movie_id = m.id \
     LEFT JOIN ratings myr ON myr.movie_id = m.id AND myr.user_id = ";

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    title: String,
    year_of_release: i32,
    rating: Option<f32>,
    user_rating: Option<i16>,
}

impl MovieRow {
    fn into_movie(self, genres: Vec<String>) -> Result<Movie, RepositoryError> {
        let user_rating = self
            .user_rating
            .map(u8::try_from)
            .transpose()
            .map_err(|_| {
                RepositoryError::CorruptRow(format!(
                    "rating {:?} for movie {} out of range",
                    self.user_rating, self.id
                ))
            })?;

        let mut movie = Movie::with_id(self.id, self.title, self.year_of_release, genres);
        movie.rating = self.rating;
        movie.user_rating = user_rating;
        Ok(movie)
    }
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &MovieFilter) {
    qb.push(" WHERE TRUE");
    if let Some(pattern) = filter.title_like_pattern() {
        qb.push(" AND m.title ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
    if let Some(year) = filter.year_of_release {
        qb.push(" AND m.year_of_release = ").push_bind(year);
    }
}

fn list_query(options: &GetAllMoviesOptions) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_MOVIE);
    qb.push_bind(options.user_id);
    push_filter(&mut qb, &options.filter());
    qb.push(" GROUP BY m.id, myr.rating ORDER BY ");

    if let Some((field, order)) = options.sort() {
        qb.push(match field {
            MovieSortField::Title => "m.title",
            MovieSortField::YearOfRelease => "m.year_of_release",
        });
        qb.push(match order {
            SortOrder::Descending => " DESC, ",
            SortOrder::Ascending | SortOrder::Unsorted => " ASC, ",
        });
    }
    qb.push("m.id ASC LIMIT ")
        .push_bind(options.limit())
        .push(" OFFSET ")
        .push_bind(options.offset());
    qb
}

fn count_query(filter: &MovieFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM movies m");
    push_filter(&mut qb, filter);
    qb
}

async fn insert_genres(conn: &mut PgConnection, movie: &Movie) -> Result<(), sqlx::Error> {
    for (position, name) in movie.genres.iter().enumerate() {
        let position = i32::try_from(position).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query("INSERT INTO genres (movie_id, position, name) VALUES ($1, $2, $3)")
            .bind(movie.id)
            .bind(position)
            .bind(name)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Insert a movie and its genres in one transaction.
///
/// `false` when the slug is already taken; nothing is written.
pub async fn insert(pool: &PgPool, movie: &Movie) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO movies (id, slug, title, year_of_release) VALUES ($1, $2, $3, $4)
         ON CONFLICT DO NOTHING",
    )
    .bind(movie.id)
    .bind(movie.slug())
    .bind(&movie.title)
    .bind(movie.year_of_release)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    insert_genres(&mut tx, movie).await?;
    tx.commit().await?;
    Ok(true)
}

async fn genres_for(pool: &PgPool, movie_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM genres WHERE movie_id = $1 ORDER BY position")
        .bind(movie_id)
        .fetch_all(pool)
        .await
}

async fn fetch_one_by(
    pool: &PgPool,
    column: &'static str,
    key: impl sqlx::Encode<'static, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    user_id: Option<Uuid>,
) -> Result<Option<(MovieRow, Vec<String>)>, sqlx::Error> {
    let mut qb = QueryBuilder::new(SELECT_MOVIE);
    qb.push_bind(user_id);
    qb.push(" WHERE m.").push(column).push(" = ").push_bind(key);
    qb.push(" GROUP BY m.id, myr.rating");

    let Some(row) = qb.build_query_as::<MovieRow>().fetch_optional(pool).await? else {
        return Ok(None);
    };
    let genres = genres_for(pool, row.id).await?;
    Ok(Some((row, genres)))
}

/// Fetch a page of movies plus their genres.
async fn list(
    pool: &PgPool,
    options: &GetAllMoviesOptions,
) -> Result<Vec<(MovieRow, Vec<String>)>, sqlx::Error> {
    let rows = list_query(options)
        .build_query_as::<MovieRow>()
        .fetch_all(pool)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let genre_rows: Vec<(Uuid, String)> = sqlx::query_as(
        "SELECT movie_id, name FROM genres WHERE movie_id = ANY($1) ORDER BY movie_id, position",
    )
    .bind(ids.as_slice())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let genres = genre_rows
                .iter()
                .filter(|(movie_id, _)| *movie_id == row.id)
                .map(|(_, name)| name.clone())
                .collect();
            (row, genres)
        })
        .collect())
}

pub async fn count(pool: &PgPool, filter: &MovieFilter) -> Result<i64, sqlx::Error> {
    count_query(filter)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
}

/// Replace scalars, slug and the whole genre set. `false` when the id does not exist.
pub async fn update(pool: &PgPool, movie: &Movie) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result =
        sqlx::query("UPDATE movies SET slug = $1, title = $2, year_of_release = $3 WHERE id = $4")
            .bind(movie.slug())
            .bind(&movie.title)
            .bind(movie.year_of_release)
            .bind(movie.id)
            .execute(&mut *tx)
            .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM genres WHERE movie_id = $1")
        .bind(movie.id)
        .execute(&mut *tx)
        .await?;
    insert_genres(&mut tx, movie).await?;

    tx.commit().await?;
    Ok(true)
}

/// Delete a movie with its genres and ratings.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for statement in [
        "DELETE FROM genres WHERE movie_id = $1",
        "DELETE FROM ratings WHERE movie_id = $1",
    ] {
        sqlx::query(statement).bind(id).execute(&mut *tx).await?;
    }
    let result = sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// [`MovieRepository`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgMovieRepository {
    pool: PgPool,
}

impl PgMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieRepository for PgMovieRepository {
    async fn create(&self, movie: &Movie) -> Result<bool, RepositoryError> {
        insert(&self.pool, movie).await.map_err(map_err)
    }

    async fn get_by_id(
        &self,
        id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, RepositoryError> {
        fetch_one_by(&self.pool, "id", id, user_id)
            .await
            .map_err(map_err)?
            .map(|(row, genres)| row.into_movie(genres))
            .transpose()
    }

    async fn get_by_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<Movie>, RepositoryError> {
        fetch_one_by(&self.pool, "slug", slug.to_owned(), user_id)
            .await
            .map_err(map_err)?
            .map(|(row, genres)| row.into_movie(genres))
            .transpose()
    }

    async fn get_all(&self, options: &GetAllMoviesOptions) -> Result<Vec<Movie>, RepositoryError> {
        list(&self.pool, options)
            .await
            .map_err(map_err)?
            .into_iter()
            .map(|(row, genres)| row.into_movie(genres))
            .collect()
    }

    async fn get_count(&self, filter: &MovieFilter) -> Result<i64, RepositoryError> {
        count(&self.pool, filter).await.map_err(map_err)
    }

    async fn update(&self, movie: &Movie) -> Result<bool, RepositoryError> {
        update(&self.pool, movie).await.map_err(map_err)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepositoryError> {
        delete(&self.pool, id).await.map_err(map_err)
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, RepositoryError> {
        exists(&self.pool, id).await.map_err(map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(title: Option<&str>, year: Option<i32>) -> GetAllMoviesOptions {
        GetAllMoviesOptions {
            title: title.map(String::from),
            year_of_release: year,
            ..Default::default()
        }
    }

    fn where_clause(sql: &str) -> &str {
        let start = sql.find(" WHERE ").unwrap();
        let end = sql.find(" GROUP BY ").unwrap_or(sql.len());
        &sql[start..end]
    }

    #[test]
    fn list_and_count_share_the_filter() {
        for (title, year) in [
            (None, None),
            (Some("day"), None),
            (None, Some(2017)),
            (Some("day"), Some(2017)),
        ] {
            let opts = options(title, year);
            let list = list_query(&opts);
            let count = count_query(&opts.filter());
            // The list binds the user id first, so placeholders are shifted by one.
            let list_where = where_clause(list.sql())
                .replace("$2", "$1")
                .replace("$3", "$2");
            assert_eq!(list_where, where_clause(count.sql()), "{title:?} {year:?}");
        }
    }

    #[test]
    fn title_filter_is_escaped_ilike() {
        let sql = count_query(&MovieFilter::new(Some("50%".into()), None))
            .sql()
            .to_string();
        assert!(sql.contains("m.title ILIKE $1 ESCAPE '\\'"));
    }

    #[test]
    fn sort_falls_back_to_primary_key() {
        let unsorted = list_query(&options(None, None)).sql().to_string();
        assert!(unsorted.contains("ORDER BY m.id ASC LIMIT"));

        let opts = GetAllMoviesOptions {
            sort_field: Some("yearOfRelease".into()),
            sort_order: SortOrder::Descending,
            ..Default::default()
        };
        let sorted = list_query(&opts).sql().to_string();
        assert!(sorted.contains("ORDER BY m.year_of_release DESC, m.id ASC LIMIT"));
    }

    #[test]
    fn out_of_range_user_rating_is_corrupt() {
        let row = MovieRow {
            id: Uuid::now_v7(),
            title: "Nick the Greek".into(),
            year_of_release: 2023,
            rating: None,
            user_rating: Some(-1),
        };
        let err = row.into_movie(vec!["Drama".into()]).unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptRow(_)));
    }
}
