//! Movie endpoints.

use movies_contracts::{
    paths, CreateMovieRequest, GetAllMoviesRequest, MovieResponse, MoviesResponse,
    UpdateMovieRequest,
};
use url::Url;
use uuid::Uuid;

use crate::{decode, ensure_success, is_not_found, ClientError, MoviesClient};

impl MoviesClient {
    fn movie_url(&self, id_or_slug: &str) -> Result<Url, ClientError> {
        self.segment_url(&[paths::MOVIES.trim_start_matches('/'), id_or_slug])
    }

    /// Create a movie. Requires a trusted-member or admin token.
    ///
    /// Calls `POST {base_url}/movies`.
    pub async fn create_movie(
        &self,
        req: &CreateMovieRequest,
    ) -> Result<MovieResponse, ClientError> {
        let endpoint = "POST /movies";
        let url = self.url(paths::MOVIES);
        let resp = self.send(endpoint, self.http.post(&url).json(req)).await?;
        decode(endpoint, resp).await
    }

    /// Fetch a movie by id or slug. `Ok(None)` on 404.
    ///
    /// Calls `GET {base_url}/movies/{id_or_slug}`.
    pub async fn get_movie(&self, id_or_slug: &str) -> Result<Option<MovieResponse>, ClientError> {
        let endpoint = format!("GET /movies/{id_or_slug}");
        let url = self.movie_url(id_or_slug)?;
        let resp = self.send(&endpoint, self.http.get(url)).await?;

        if is_not_found(&resp) {
            return Ok(None);
        }
        decode(&endpoint, resp).await.map(Some)
    }

    /// One page of movies.
    ///
    /// Calls `GET {base_url}/movies?title=&year=&sortBy=&page=&pageSize=`.
    pub async fn get_movies(&self, req: &GetAllMoviesRequest) -> Result<MoviesResponse, ClientError> {
        let endpoint = "GET /movies";
        let url = self.url(paths::MOVIES);
        let resp = self.send(endpoint, self.http.get(&url).query(req)).await?;
        decode(endpoint, resp).await
    }

    /// Replace a movie's title, year and genres.
    ///
    /// Calls `PUT {base_url}/movies/{id}`.
    pub async fn update_movie(
        &self,
        id: Uuid,
        req: &UpdateMovieRequest,
    ) -> Result<MovieResponse, ClientError> {
        let endpoint = format!("PUT /movies/{id}");
        let url = self.movie_url(&id.to_string())?;
        let resp = self.send(&endpoint, self.http.put(url).json(req)).await?;
        decode(&endpoint, resp).await
    }

    /// Delete a movie. Requires an admin token.
    ///
    /// Calls `DELETE {base_url}/movies/{id}`.
    pub async fn delete_movie(&self, id: Uuid) -> Result<(), ClientError> {
        let endpoint = format!("DELETE /movies/{id}");
        let url = self.movie_url(&id.to_string())?;
        let resp = self.send(&endpoint, self.http.delete(url)).await?;
        ensure_success(&endpoint, resp).await.map(|_| ())
    }
}
