//! Error types for nimbus.

use thiserror::Error;

/// Common error type for nimbus.
#[derive(Error, Debug)]
pub enum NimbusError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted, except
    /// unique-constraint violations which become [`NimbusError::Conflict`].
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The resource clashes with an existing one (duplicate name, username...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storing the requested bytes would exceed the storage quota.
    #[error("quota exceeded: {needed} bytes needed, {available} bytes available")]
    QuotaExceeded {
        /// Bytes the operation would add.
        needed: i64,
        /// Bytes left in the storage.
        available: i64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for NimbusError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                NimbusError::Conflict(db_err.message().to_string())
            }
            _ => NimbusError::Database(e.to_string()),
        }
    }
}

/// Result type alias for nimbus operations.
pub type Result<T> = std::result::Result<T, NimbusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = NimbusError::Validation("name too long".to_string());
        assert_eq!(err.to_string(), "validation error: name too long");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = NimbusError::NotFound("directory".to_string());
        assert_eq!(err.to_string(), "directory not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = NimbusError::Conflict("file name already taken".to_string());
        assert_eq!(err.to_string(), "conflict: file name already taken");
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = NimbusError::QuotaExceeded {
            needed: 100,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded: 100 bytes needed, 10 bytes available"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NimbusError = io_err.into();
        assert!(matches!(err, NimbusError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_row_not_found_is_database_error() {
        let err: NimbusError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, NimbusError::Database(_)));
    }
}
