//! Rating endpoints. All of them need a token.

use movies_contracts::{paths, MovieRatingsResponse, RateMovieRequest};
use uuid::Uuid;

use crate::{decode, ensure_success, ClientError, MoviesClient};

impl MoviesClient {
    /// Rate a movie 1 to 5, replacing any earlier rating by the caller.
    ///
    /// Calls `PUT {base_url}/movies/{id}/ratings`.
    pub async fn rate_movie(&self, movie_id: Uuid, rating: u8) -> Result<(), ClientError> {
        let endpoint = format!("PUT /movies/{movie_id}/ratings");
        let url = self.url(&paths::movie_ratings(&movie_id));
        let body = RateMovieRequest {
            rating: i32::from(rating),
        };
        let resp = self.send(&endpoint, self.http.put(&url).json(&body)).await?;
        ensure_success(&endpoint, resp).await.map(|_| ())
    }

    /// Remove the caller's rating.
    ///
    /// Calls `DELETE {base_url}/movies/{id}/ratings`.
    pub async fn delete_rating(&self, movie_id: Uuid) -> Result<(), ClientError> {
        let endpoint = format!("DELETE /movies/{movie_id}/ratings");
        let url = self.url(&paths::movie_ratings(&movie_id));
        let resp = self.send(&endpoint, self.http.delete(&url)).await?;
        ensure_success(&endpoint, resp).await.map(|_| ())
    }

    /// Every rating the caller has given.
    ///
    /// Calls `GET {base_url}/ratings/me`.
    pub async fn get_user_ratings(&self) -> Result<MovieRatingsResponse, ClientError> {
        let endpoint = "GET /ratings/me";
        let url = self.url(paths::MY_RATINGS);
        let resp = self.send(endpoint, self.http.get(&url)).await?;
        decode(endpoint, resp).await
    }
}
