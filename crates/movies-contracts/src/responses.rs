//! Response bodies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub year_of_release: i32,
    /// Average of all user ratings; absent when unrated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    /// The caller's own rating; absent for anonymous callers or when unrated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    pub genres: Vec<String>,
}

/// One page of movies with paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MoviesResponse {
    pub items: Vec<MovieResponse>,
    pub page: i32,
    pub page_size: i32,
    /// Number of movies matching the filter across all pages.
    pub total: i64,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MovieRatingResponse {
    pub movie_id: Uuid,
    pub slug: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MovieRatingsResponse {
    pub items: Vec<MovieRatingResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrated_movie_omits_rating_fields() {
        let movie = MovieResponse {
            id: Uuid::nil(),
            title: "Happy Death Day".into(),
            slug: "happy-death-day-2017".into(),
            year_of_release: 2017,
            rating: None,
            user_rating: None,
            genres: vec!["Horror".into()],
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert!(json.get("rating").is_none());
        assert!(json.get("userRating").is_none());
        assert_eq!(json["yearOfRelease"], 2017);
    }

    #[test]
    fn page_metadata_is_camel_case() {
        let page = MoviesResponse {
            items: vec![],
            page: 2,
            page_size: 5,
            total: 7,
            has_next_page: false,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 5);
        assert_eq!(json["hasNextPage"], false);
    }
}
