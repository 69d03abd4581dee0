//! # Error Types
//!
//! - [`RepositoryError`]: infrastructure failures (connection, query,
//!   transaction). Carries the driver error as its source.
//! - [`ValidationErrors`]: every violated rule for one input, as
//!   `(property, message)` pairs.
//! - [`ServiceError`]: what the services return: one of the two above.

use std::fmt;

use thiserror::Error;

/// Boxed driver error carried by [`RepositoryError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of the storage backend behind a repository.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The database rejected or failed a statement.
    #[error("database error: {0}")]
    Database(#[source] BoxError),

    /// A uniqueness constraint rejected the write (e.g. a taken slug).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The stored data could not be mapped back into a domain model.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

impl RepositoryError {
    /// Wrap any driver error. Intended for `.map_err(RepositoryError::database)`.
    pub fn database<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Database(Box::new(err))
    }
}

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Name of the offending property as it appears on the wire (`Title`, `PageSize`, ...).
    pub property: String,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationFailure {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

/// All failures collected for one validated value. Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    failures: Vec<ValidationFailure>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a single failure.
    pub fn single(property: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(property, message);
        errors
    }

    pub fn push(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.failures.push(ValidationFailure::new(property, message));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// Whether any failure was recorded against `property`.
    pub fn has_property(&self, property: &str) -> bool {
        self.failures.iter().any(|f| f.property == property)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for failure in &self.failures {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", failure.property, failure.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

/// Error returned by [`crate::MovieService`] and [`crate::RatingService`].
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input rejected before any write.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn failures_keep_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors.push("Title", "must not be empty");
        errors.push("Genres", "must not be empty");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.failures()[0].property, "Title");
        assert_eq!(err.failures()[1].property, "Genres");
    }

    #[test]
    fn display_joins_all_failures() {
        let mut errors = ValidationErrors::single("Page", "must be at least 1");
        errors.push("PageSize", "out of range");
        let text = errors.to_string();
        assert!(text.contains("Page: must be at least 1"));
        assert!(text.contains("PageSize: out of range"));
    }

    #[test]
    fn repository_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RepositoryError::database(io);
        assert!(err.to_string().contains("refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn service_error_from_validation() {
        let err: ServiceError = ValidationErrors::single("Slug", "taken").into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
