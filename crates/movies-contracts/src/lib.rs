//! # movies-contracts — Wire Shapes for the Movies API
//!
//! Request and response bodies exchanged over HTTP. The server
//! (`movies-api`) and the SDK (`movies-client`) both depend on this crate,
//! so a field rename breaks both at compile time instead of at runtime.
//!
//! All JSON uses camelCase field names. With the `openapi` feature every
//! type derives `utoipa::ToSchema` (and `IntoParams` for query strings).

pub mod errors;
pub mod paths;
pub mod requests;
pub mod responses;

pub use errors::{ErrorBody, ErrorDetail, ValidationFailureResponse, ValidationProblem};
pub use requests::{CreateMovieRequest, GetAllMoviesRequest, RateMovieRequest, UpdateMovieRequest};
pub use responses::{MovieRatingResponse, MovieRatingsResponse, MovieResponse, MoviesResponse};
