//! # Movies API
//!
//! Create, read, list, update and delete movies. `GET` responses for
//! anonymous callers are served through the output cache; every successful
//! write evicts the `movies` tag.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::TypedHeader;
use movies_contracts::{
    paths, CreateMovieRequest, GetAllMoviesRequest, MovieResponse, MoviesResponse,
    UpdateMovieRequest,
};
use uuid::Uuid;

use crate::auth::{require, CallerIdentity, Policy, XApiKey};
use crate::cache::{output_cache_middleware, OutputCache, MOVIES_TAG};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::mapping;
use crate::routes::parse_movie_id;
use crate::state::AppState;

/// Build the movies router with `cache` in front of its `GET` routes.
pub fn router(cache: OutputCache) -> Router<AppState> {
    Router::new()
        .route(paths::MOVIES, get(list_movies).post(create_movie))
        .route(
            paths::MOVIE,
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .route_layer(from_fn_with_state(cache, output_cache_middleware))
}

/// POST /movies — Create a movie.
#[utoipa::path(
    post,
    path = "/movies",
    request_body = CreateMovieRequest,
    params(("x-api-key" = Option<String>, Header, description = "Required when the service has an API key configured")),
    responses(
        (status = 201, description = "Movie created", body = MovieResponse),
        (status = 400, description = "Validation failed", body = movies_contracts::ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = movies_contracts::ErrorBody),
        (status = 403, description = "Caller is not a trusted member", body = movies_contracts::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn create_movie(
    State(state): State<AppState>,
    caller: CallerIdentity,
    api_key: Option<TypedHeader<XApiKey>>,
    body: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<MovieResponse>), AppError> {
    if let Some(expected) = &state.api_key {
        expected.check(api_key.as_ref().map(|TypedHeader(key)| key))?;
    }
    require(&caller, Policy::TrustedMember)?;

    let req = extract_json(body)?;
    let movie = mapping::create_request_to_movie(req);
    state.movies.create(&movie).await?;
    state.cache.evict_by_tag(MOVIES_TAG);

    let location = paths::movie(&movie.id.to_string());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(mapping::movie_to_response(movie)),
    ))
}

/// GET /movies/{id} — Fetch a movie by id or slug.
#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id (UUID) or slug")),
    responses(
        (status = 200, description = "Movie found", body = MovieResponse),
        (status = 404, description = "Not found", body = movies_contracts::ErrorBody),
    ),
    tag = "movies"
)]
pub async fn get_movie(
    State(state): State<AppState>,
    caller: Option<CallerIdentity>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<MovieResponse>, AppError> {
    let user_id = caller.map(|c| c.user_id);
    let movie = match Uuid::parse_str(&id_or_slug) {
        Ok(id) => state.movies.get_by_id(id, user_id).await?,
        Err(_) => state.movies.get_by_slug(&id_or_slug, user_id).await?,
    };

    movie
        .map(|m| Json(mapping::movie_to_response(m)))
        .ok_or_else(|| AppError::NotFound(format!("movie {id_or_slug}")))
}

/// GET /movies — One page of movies, optionally filtered and sorted.
#[utoipa::path(
    get,
    path = "/movies",
    params(GetAllMoviesRequest),
    responses(
        (status = 200, description = "Page of movies", body = MoviesResponse),
        (status = 400, description = "Invalid paging or sort", body = movies_contracts::ErrorBody),
    ),
    tag = "movies"
)]
pub async fn list_movies(
    State(state): State<AppState>,
    caller: Option<CallerIdentity>,
    query: Result<Query<GetAllMoviesRequest>, QueryRejection>,
) -> Result<Json<MoviesResponse>, AppError> {
    let req = extract_query(query)?;
    let options = mapping::request_to_options(req).with_user(caller.map(|c| c.user_id));

    let movies = state.movies.get_all(&options).await?;
    let total = state.movies.get_count(&options.filter()).await?;

    Ok(Json(mapping::movies_to_response(
        movies,
        options.page,
        options.page_size,
        total,
    )))
}

/// PUT /movies/{id} — Replace a movie's title, year and genres.
#[utoipa::path(
    put,
    path = "/movies/{id}",
    params(("id" = Uuid, Path, description = "Movie id")),
    request_body = UpdateMovieRequest,
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 400, description = "Validation failed", body = movies_contracts::ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = movies_contracts::ErrorBody),
        (status = 403, description = "Caller is not a trusted member", body = movies_contracts::ErrorBody),
        (status = 404, description = "Not found", body = movies_contracts::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn update_movie(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieResponse>, AppError> {
    require(&caller, Policy::TrustedMember)?;
    let id = parse_movie_id(&id)?;
    let req = extract_json(body)?;

    let movie = mapping::update_request_to_movie(req, id);
    let updated = state
        .movies
        .update(movie, Some(caller.user_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("movie {id}")))?;
    state.cache.evict_by_tag(MOVIES_TAG);

    Ok(Json(mapping::movie_to_response(updated)))
}

/// DELETE /movies/{id} — Delete a movie with its genres and ratings.
#[utoipa::path(
    delete,
    path = "/movies/{id}",
    params(("id" = Uuid, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Movie deleted"),
        (status = 401, description = "Missing or invalid credentials", body = movies_contracts::ErrorBody),
        (status = 403, description = "Caller is not an admin", body = movies_contracts::ErrorBody),
        (status = 404, description = "Not found", body = movies_contracts::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn delete_movie(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require(&caller, Policy::Admin)?;
    let id = parse_movie_id(&id)?;

    if !state.movies.delete_by_id(id).await? {
        return Err(AppError::NotFound(format!("movie {id}")));
    }
    state.cache.evict_by_tag(MOVIES_TAG);
    Ok(StatusCode::OK)
}
