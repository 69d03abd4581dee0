//! Request bodies and query strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    pub title: String,
    pub year_of_release: i32,
    pub genres: Vec<String>,
}

/// Full replacement of a movie's title, year and genre set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    pub title: String,
    pub year_of_release: i32,
    pub genres: Vec<String>,
}

/// Query string of `GET /movies`.
///
/// `sortBy` is a field name with an optional `+` (ascending, the default)
/// or `-` (descending) prefix. Paging falls back to page 1, size 10.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct GetAllMoviesRequest {
    /// Case-insensitive title substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Exact year of release.
    #[serde(default, alias = "yearOfRelease", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RateMovieRequest {
    /// 1 to 5 inclusive. Out-of-range integers decode and are rejected by
    /// validation.
    pub rating: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_camel_case() {
        let req: CreateMovieRequest = serde_json::from_str(
            r#"{"title":"Happy Death Day","yearOfRelease":2017,"genres":["Horror"]}"#,
        )
        .unwrap();
        assert_eq!(req.year_of_release, 2017);
        assert_eq!(req.genres, vec!["Horror"]);
    }

    #[test]
    fn list_request_accepts_year_alias() {
        let a: GetAllMoviesRequest = serde_json::from_str(r#"{"year":2017}"#).unwrap();
        let b: GetAllMoviesRequest = serde_json::from_str(r#"{"yearOfRelease":2017}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.year, Some(2017));
    }

    #[test]
    fn empty_list_request_serializes_to_nothing() {
        let json = serde_json::to_string(&GetAllMoviesRequest::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
