//! # Movie Models
//!
//! The slug is never stored on the model; it is always derived from the
//! title and year so the two cannot drift apart.

use uuid::Uuid;

/// A catalog movie.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub year_of_release: i32,
    /// Ordered, de-duplicated genre names.
    pub genres: Vec<String>,
    /// Average of every user's rating, `None` when unrated.
    pub rating: Option<f32>,
    /// The calling user's own rating, when a caller is known and has rated.
    pub user_rating: Option<u8>,
}

impl Movie {
    /// Build a movie with a fresh time-ordered id.
    pub fn new(title: impl Into<String>, year_of_release: i32, genres: Vec<String>) -> Self {
        Self::with_id(Uuid::now_v7(), title, year_of_release, genres)
    }

    /// Build a movie with a known id. Genres are normalized.
    pub fn with_id(
        id: Uuid,
        title: impl Into<String>,
        year_of_release: i32,
        genres: Vec<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            year_of_release,
            genres: normalize_genres(genres),
            rating: None,
            user_rating: None,
        }
    }

    /// URL-safe identifier derived from title and year.
    pub fn slug(&self) -> String {
        slugify(&self.title, self.year_of_release)
    }
}

/// A user's rating of one movie, as listed for that user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRating {
    pub movie_id: Uuid,
    pub slug: String,
    pub rating: u8,
}

/// Derive a slug: keep ASCII alphanumerics, spaces, `_` and `-`; lowercase;
/// spaces become `-`; the year is appended.
pub fn slugify(title: &str, year_of_release: i32) -> String {
    let stem: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .map(|c| match c {
            ' ' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    format!("{stem}-{year_of_release}")
}

/// Trim genre names, drop blanks, and drop repeats keeping the first occurrence.
pub fn normalize_genres<I, S>(genres: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for genre in genres {
        let genre = genre.as_ref().trim();
        if genre.is_empty() || out.iter().any(|g| g == genre) {
            continue;
        }
        out.push(genre.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn slug_of_happy_death_day() {
        let movie = Movie::new("Happy Death Day", 2017, vec!["Horror".into()]);
        assert_eq!(movie.slug(), "happy-death-day-2017");
    }

    #[test]
    fn slug_drops_punctuation() {
        assert_eq!(slugify("Spider-Man: No Way Home!", 2021), "spider-man-no-way-home-2021");
        assert_eq!(slugify("Léon", 1994), "lon-1994");
    }

    #[test]
    fn slug_keeps_underscores() {
        assert_eq!(slugify("a_b", 2000), "a_b-2000");
    }

    #[test]
    fn genres_are_trimmed_and_deduplicated() {
        let genres = normalize_genres([" Horror", "Comedy ", "", "Horror", "  "]);
        assert_eq!(genres, vec!["Horror", "Comedy"]);
    }

    #[test]
    fn new_movies_have_increasing_ids() {
        let a = Movie::new("A", 2000, vec!["x".into()]);
        let b = Movie::new("B", 2000, vec!["x".into()]);
        assert!(a.id < b.id);
    }

    proptest! {
        #[test]
        fn slug_is_url_safe(title in ".{0,64}", year in 1900i32..2100) {
            let slug = slugify(&title, year);
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'));
            let suffix = format!("-{year}");
            prop_assert!(slug.ends_with(&suffix));
        }

        #[test]
        fn slug_ignores_case(title in "[A-Za-z ]{1,32}", year in 1900i32..2100) {
            prop_assert_eq!(slugify(&title.to_uppercase(), year), slugify(&title.to_lowercase(), year));
        }
    }
}
