//! Conversions between wire contracts and `movies-core` models.

use movies_contracts::{
    CreateMovieRequest, GetAllMoviesRequest, MovieRatingResponse, MovieRatingsResponse,
    MovieResponse, MoviesResponse, UpdateMovieRequest,
};
use movies_core::options::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use movies_core::{GetAllMoviesOptions, Movie, MovieRating, SortOrder};
use uuid::Uuid;

/// New movie with a fresh id.
pub fn create_request_to_movie(request: CreateMovieRequest) -> Movie {
    Movie::new(request.title, request.year_of_release, request.genres)
}

pub fn update_request_to_movie(request: UpdateMovieRequest, id: Uuid) -> Movie {
    Movie::with_id(id, request.title, request.year_of_release, request.genres)
}

pub fn movie_to_response(movie: Movie) -> MovieResponse {
    MovieResponse {
        id: movie.id,
        slug: movie.slug(),
        title: movie.title,
        year_of_release: movie.year_of_release,
        rating: movie.rating,
        user_rating: movie.user_rating,
        genres: movie.genres,
    }
}

pub fn movies_to_response(
    movies: Vec<Movie>,
    page: i32,
    page_size: i32,
    total: i64,
) -> MoviesResponse {
    MoviesResponse {
        items: movies.into_iter().map(movie_to_response).collect(),
        page,
        page_size,
        total,
        has_next_page: total > i64::from(page) * i64::from(page_size),
    }
}

pub fn rating_to_response(rating: MovieRating) -> MovieRatingResponse {
    MovieRatingResponse {
        movie_id: rating.movie_id,
        slug: rating.slug,
        rating: rating.rating,
    }
}

pub fn ratings_to_response(ratings: Vec<MovieRating>) -> MovieRatingsResponse {
    MovieRatingsResponse {
        items: ratings.into_iter().map(rating_to_response).collect(),
    }
}

/// `sortBy`: `-field` sorts descending, `field` or `+field` ascending,
/// absent leaves results unsorted.
pub fn request_to_options(request: GetAllMoviesRequest) -> GetAllMoviesOptions {
    let (sort_field, sort_order) = match request.sort_by.as_deref().map(str::trim) {
        None | Some("") => (None, SortOrder::Unsorted),
        Some(raw) => {
            let order = if raw.starts_with('-') {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            let field = raw.trim_start_matches(|c: char| c == '+' || c == '-').to_string();
            (Some(field), order)
        }
    };

    GetAllMoviesOptions {
        title: request.title,
        year_of_release: request.year,
        sort_field,
        sort_order,
        page: request.page.unwrap_or(DEFAULT_PAGE),
        page_size: request.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        user_id: None,
    }
}
