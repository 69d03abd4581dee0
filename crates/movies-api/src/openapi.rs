//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec.
//! Serves at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer JWT security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "HS256 token carrying `userid`, and optionally `admin` / `trusted_member` claims.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Movies API",
        description = "Movie catalog with per-user ratings.",
    ),
    paths(
        crate::routes::movies::create_movie,
        crate::routes::movies::get_movie,
        crate::routes::movies::list_movies,
        crate::routes::movies::update_movie,
        crate::routes::movies::delete_movie,
        crate::routes::ratings::rate_movie,
        crate::routes::ratings::delete_rating,
        crate::routes::ratings::get_user_ratings,
    ),
    components(schemas(
        movies_contracts::CreateMovieRequest,
        movies_contracts::UpdateMovieRequest,
        movies_contracts::RateMovieRequest,
        movies_contracts::MovieResponse,
        movies_contracts::MoviesResponse,
        movies_contracts::MovieRatingResponse,
        movies_contracts::MovieRatingsResponse,
        movies_contracts::ErrorBody,
        movies_contracts::ErrorDetail,
        movies_contracts::ValidationProblem,
        movies_contracts::ValidationFailureResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "movies", description = "Movie catalog"),
        (name = "ratings", description = "Per-user movie ratings"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
