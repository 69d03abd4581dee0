//! Route paths. Templates use Axum's `{param}` syntax; the helper
//! functions build concrete paths for the SDK.

pub const MOVIES: &str = "/movies";
/// Single movie. `GET` accepts an id or a slug in `{id}`; writes require an id.
pub const MOVIE: &str = "/movies/{id}";
pub const MOVIE_RATINGS: &str = "/movies/{id}/ratings";
pub const MY_RATINGS: &str = "/ratings/me";

pub fn movie(id_or_slug: &str) -> String {
    format!("{MOVIES}/{id_or_slug}")
}

pub fn movie_ratings(id: &uuid::Uuid) -> String {
    format!("{MOVIES}/{id}/ratings")
}
