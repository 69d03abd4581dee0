//! # Validation Rule Sets
//!
//! - [`MovieValidator`]: movie rules. The slug rule reads the repository,
//!   so the validator owns an explicit `Arc<dyn MovieRepository>` and is async.
//! - [`validate_options`]: pure rules for list queries.
//! - [`validate_rating`]: the 1–5 range rule.
//!
//! Every rule runs; all failures are returned together.

use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::error::{ServiceError, ValidationErrors};
use crate::movie::Movie;
use crate::options::{GetAllMoviesOptions, MovieSortField, MAX_PAGE_SIZE};
use crate::repository::MovieRepository;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Upper bound on genres per movie.
pub const MAX_GENRES: usize = 20;

/// Current calendar year in UTC.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Rules for creating or updating a movie.
#[derive(Clone)]
pub struct MovieValidator {
    movies: Arc<dyn MovieRepository>,
}

impl MovieValidator {
    pub fn new(movies: Arc<dyn MovieRepository>) -> Self {
        Self { movies }
    }

    /// Run every movie rule against `movie`.
    ///
    /// Returns `ServiceError::Validation` with all failures, or
    /// `ServiceError::Repository` when the slug lookup itself fails.
    pub async fn validate(&self, movie: &Movie) -> Result<(), ServiceError> {
        let mut errors = check_movie_fields(movie, current_year());

        let slug = movie.slug();
        if let Some(existing) = self.movies.get_by_slug(&slug, None).await? {
            if existing.id != movie.id {
                errors.push("Slug", "This movie already exists in the system");
            }
        }

        errors.into_result().map_err(ServiceError::from)
    }
}

/// The field-level movie rules that need no repository.
pub fn check_movie_fields(movie: &Movie, current_year: i32) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if movie.id.is_nil() {
        errors.push("Id", "'Id' must not be empty.");
    }
    if movie.genres.is_empty() {
        errors.push("Genres", "'Genres' must not be empty.");
    } else if movie.genres.len() > MAX_GENRES {
        errors.push(
            "Genres",
            format!("'Genres' must not contain more than {MAX_GENRES} items."),
        );
    }
    if movie.title.trim().is_empty() {
        errors.push("Title", "'Title' must not be empty.");
    }
    if movie.year_of_release > current_year {
        errors.push(
            "YearOfRelease",
            format!("'Year Of Release' must be less than or equal to '{current_year}'."),
        );
    }
    errors
}

/// Rules for list queries.
pub fn validate_options(options: &GetAllMoviesOptions) -> Result<(), ValidationErrors> {
    check_options(options, current_year()).into_result()
}

pub fn check_options(options: &GetAllMoviesOptions, current_year: i32) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let Some(year) = options.year_of_release {
        if year > current_year {
            errors.push(
                "YearOfRelease",
                format!("'Year Of Release' must be less than or equal to '{current_year}'."),
            );
        }
    }
    if let Some(field) = options.sort_field.as_deref() {
        if MovieSortField::parse(field).is_none() {
            errors.push(
                "SortField",
                format!(
                    "You can only sort by '{}' or '{}'",
                    MovieSortField::ACCEPTED[0],
                    MovieSortField::ACCEPTED[1]
                ),
            );
        }
    }
    if options.page < 1 {
        errors.push("Page", "'Page' must be greater than or equal to '1'.");
    }
    if !(1..=MAX_PAGE_SIZE).contains(&options.page_size) {
        errors.push(
            "PageSize",
            format!("You can only get between 1 and {MAX_PAGE_SIZE} movies per page"),
        );
    }
    errors
}

/// A rating must lie in `[1, 5]`. Returns the narrowed value.
pub fn validate_rating(rating: i32) -> Result<u8, ValidationErrors> {
    u8::try_from(rating)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or_else(|| {
            ValidationErrors::single(
                "Rating",
                format!("Rating must be between {MIN_RATING} and {MAX_RATING}"),
            )
        })
}
