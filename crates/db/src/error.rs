//! Repository error type and database error classification.

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., duplicate email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Delete blocked by an `ON DELETE RESTRICT` reference.
    #[error("delete restricted: {0}")]
    Restricted(String),

    /// Insert referenced a row that does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// `CHECK` constraint violation.
    #[error("check constraint violated: {0}")]
    ConstraintViolation(String),
}

/// Which kind of statement produced a database error.
///
/// A foreign-key violation means "still referenced" on delete and "target
/// missing" on insert or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteKind {
    Insert,
    Update,
    Delete,
}

impl RepositoryError {
    /// Classify a sqlx error raised by a write statement.
    pub(crate) fn from_write(e: sqlx::Error, kind: WriteKind) -> Self {
        let sqlx::Error::Database(ref db_err) = e else {
            return Self::Database(e);
        };

        let constraint = db_err.constraint().unwrap_or("unknown").to_owned();

        if db_err.is_unique_violation() {
            return Self::Conflict(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return match kind {
                WriteKind::Insert | WriteKind::Update => Self::MissingReference(constraint),
                WriteKind::Delete => Self::Restricted(constraint),
            };
        }
        if db_err.is_check_violation() {
            return Self::ConstraintViolation(constraint);
        }
        Self::Database(e)
    }

    /// Name of the violated constraint, if this error carries one.
    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Conflict(c)
            | Self::Restricted(c)
            | Self::MissingReference(c)
            | Self::ConstraintViolation(c) => Some(c),
            Self::Database(_) | Self::DataCorruption(_) | Self::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_passes_through() {
        let err = RepositoryError::from_write(sqlx::Error::RowNotFound, WriteKind::Insert);
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
        assert_eq!(err.constraint(), None);
    }

    #[test]
    fn test_constraint_accessor() {
        let err = RepositoryError::Restricted("cart_items_product_id_fkey".to_owned());
        assert_eq!(err.constraint(), Some("cart_items_product_id_fkey"));
        assert_eq!(
            err.to_string(),
            "delete restricted: cart_items_product_id_fkey"
        );
    }
}
