//! # Ratings API
//!
//! Authenticated callers rate movies 1 to 5 and list their own ratings.
//! A rating change alters the aggregate shown on cached movie responses,
//! so successful writes evict the `movies` tag.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use movies_contracts::{paths, MovieRatingsResponse, RateMovieRequest};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::cache::MOVIES_TAG;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::mapping;
use crate::routes::parse_movie_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(paths::MOVIE_RATINGS, put(rate_movie).delete(delete_rating))
        .route(paths::MY_RATINGS, get(get_user_ratings))
}

/// PUT /movies/{id}/ratings — Rate a movie, replacing any earlier rating.
#[utoipa::path(
    put,
    path = "/movies/{id}/ratings",
    params(("id" = Uuid, Path, description = "Movie id")),
    request_body = RateMovieRequest,
    responses(
        (status = 200, description = "Rating stored"),
        (status = 400, description = "Rating out of range", body = movies_contracts::ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = movies_contracts::ErrorBody),
        (status = 404, description = "Movie not found", body = movies_contracts::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn rate_movie(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Json<RateMovieRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let movie_id = parse_movie_id(&id)?;
    let req = extract_json(body)?;

    if !state
        .ratings
        .rate_movie(movie_id, req.rating, caller.user_id)
        .await?
    {
        return Err(AppError::NotFound(format!("movie {movie_id}")));
    }
    state.cache.evict_by_tag(MOVIES_TAG);
    Ok(StatusCode::OK)
}

/// DELETE /movies/{id}/ratings — Remove the caller's rating.
#[utoipa::path(
    delete,
    path = "/movies/{id}/ratings",
    params(("id" = Uuid, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Rating removed"),
        (status = 401, description = "Missing or invalid credentials", body = movies_contracts::ErrorBody),
        (status = 404, description = "No rating by this caller", body = movies_contracts::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn delete_rating(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let movie_id = parse_movie_id(&id)?;

    if !state.ratings.delete_rating(movie_id, caller.user_id).await? {
        return Err(AppError::NotFound(format!("rating for movie {movie_id}")));
    }
    state.cache.evict_by_tag(MOVIES_TAG);
    Ok(StatusCode::OK)
}

/// GET /ratings/me — Every rating the caller has given.
#[utoipa::path(
    get,
    path = "/ratings/me",
    responses(
        (status = 200, description = "Caller's ratings", body = MovieRatingsResponse),
        (status = 401, description = "Missing or invalid credentials", body = movies_contracts::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn get_user_ratings(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<MovieRatingsResponse>, AppError> {
    let ratings = state.ratings.get_ratings_for_user(caller.user_id).await?;
    Ok(Json(mapping::ratings_to_response(ratings)))
}
