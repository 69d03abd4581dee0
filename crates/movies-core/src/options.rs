//! # List Query Options
//!
//! [`MovieFilter`] is the one predicate shared by the list and the count
//! queries. Both repository implementations build their `WHERE` clause (or
//! in-memory match) from it, so page contents and the reported total can
//! never disagree.

use uuid::Uuid;

use crate::movie::Movie;

pub const DEFAULT_PAGE: i32 = 1;
pub const DEFAULT_PAGE_SIZE: i32 = 10;
pub const MAX_PAGE_SIZE: i32 = 25;

/// Direction of the requested sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Unsorted,
    Ascending,
    Descending,
}

/// Columns a caller may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieSortField {
    Title,
    YearOfRelease,
}

impl MovieSortField {
    /// Wire names accepted in `sortBy`, compared case-sensitively.
    pub const ACCEPTED: [&'static str; 2] = ["title", "yearOfRelease"];

    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "title" => Some(Self::Title),
            "yearOfRelease" => Some(Self::YearOfRelease),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::YearOfRelease => "yearOfRelease",
        }
    }
}

/// Title/year predicate applied by both `get_all` and `get_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Exact year of release.
    pub year_of_release: Option<i32>,
}

impl MovieFilter {
    pub fn new(title: Option<String>, year_of_release: Option<i32>) -> Self {
        Self {
            title: title.filter(|t| !t.is_empty()),
            year_of_release,
        }
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        self.matches_fields(&movie.title, movie.year_of_release)
    }

    pub fn matches_fields(&self, title: &str, year_of_release: i32) -> bool {
        let title_ok = match &self.title {
            Some(needle) => title.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        };
        let year_ok = self.year_of_release.map_or(true, |year| year_of_release == year);
        title_ok && year_ok
    }

    /// `%needle%` with `%`, `_` and `\` escaped for use with `ILIKE ... ESCAPE '\'`.
    pub fn title_like_pattern(&self) -> Option<String> {
        self.title.as_ref().map(|title| {
            let mut pattern = String::with_capacity(title.len() + 2);
            pattern.push('%');
            for c in title.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

/// Filter, sort and page specification for listing movies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAllMoviesOptions {
    pub title: Option<String>,
    pub year_of_release: Option<i32>,
    /// Raw sort field as requested; validated against [`MovieSortField::ACCEPTED`].
    pub sort_field: Option<String>,
    pub sort_order: SortOrder,
    /// 1-based page number.
    pub page: i32,
    pub page_size: i32,
    /// Caller whose personal rating should be attached.
    pub user_id: Option<Uuid>,
}

impl Default for GetAllMoviesOptions {
    fn default() -> Self {
        Self {
            title: None,
            year_of_release: None,
            sort_field: None,
            sort_order: SortOrder::Unsorted,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            user_id: None,
        }
    }
}

impl GetAllMoviesOptions {
    pub fn with_user(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn filter(&self) -> MovieFilter {
        MovieFilter::new(self.title.clone(), self.year_of_release)
    }

    /// The typed sort column, or `None` when unsorted or the field is unknown.
    pub fn sort(&self) -> Option<(MovieSortField, SortOrder)> {
        if self.sort_order == SortOrder::Unsorted {
            return None;
        }
        let field = self.sort_field.as_deref().and_then(MovieSortField::parse)?;
        Some((field, self.sort_order))
    }

    /// Rows to skip for the requested page. Pages below 1 are treated as 1.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.page_size.max(0))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, year: i32) -> Movie {
        Movie::new(title, year, vec!["Drama".into()])
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(MovieFilter::default().matches(&movie("Anything", 1999)));
    }

    #[test]
    fn title_filter_is_case_insensitive_substring() {
        let filter = MovieFilter::new(Some("DEATH".into()), None);
        assert!(filter.matches(&movie("Happy Death Day", 2017)));
        assert!(!filter.matches(&movie("Nick the Greek", 2023)));
    }

    #[test]
    fn year_filter_is_exact() {
        let filter = MovieFilter::new(None, Some(2017));
        assert!(filter.matches(&movie("Happy Death Day", 2017)));
        assert!(!filter.matches(&movie("Happy Death Day 2U", 2019)));
    }

    #[test]
    fn blank_title_filter_is_ignored() {
        assert_eq!(MovieFilter::new(Some(String::new()), None), MovieFilter::default());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let filter = MovieFilter::new(Some("100%_a\\b".into()), None);
        assert_eq!(filter.title_like_pattern().as_deref(), Some("%100\\%\\_a\\\\b%"));
    }

    #[test]
    fn offset_for_pages() {
        let mut options = GetAllMoviesOptions { page_size: 5, ..Default::default() };
        assert_eq!(options.offset(), 0);
        options.page = 3;
        assert_eq!(options.offset(), 10);
        assert_eq!(options.limit(), 5);
    }

    #[test]
    fn sort_requires_known_field_and_direction() {
        let mut options = GetAllMoviesOptions {
            sort_field: Some("title".into()),
            sort_order: SortOrder::Descending,
            ..Default::default()
        };
        assert_eq!(options.sort(), Some((MovieSortField::Title, SortOrder::Descending)));
        options.sort_order = SortOrder::Unsorted;
        assert_eq!(options.sort(), None);
        options.sort_order = SortOrder::Ascending;
        options.sort_field = Some("rating".into());
        assert_eq!(options.sort(), None);
    }
}
