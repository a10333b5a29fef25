//! Error types for the master-data services.

use thiserror::Error;

use whnet_db::DbError;

/// Error type for master-data operations.
///
/// Validation errors always carry the specific violated invariant so the
/// caller can surface a precise message; they are never retried. A no-op
/// update and an empty synchronization claim are not errors and never reach
/// this type.
#[derive(Debug, Error)]
pub enum MasterDataError {
    /// An invariant or required-field check failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The targeted entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store failed; the caller owns the retry policy.
    #[error("Database error: {0}")]
    Database(#[source] DbError),
}

impl From<DbError> for MasterDataError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => MasterDataError::NotFound(msg),
            other => MasterDataError::Database(other),
        }
    }
}

impl MasterDataError {
    /// Shorthand used by the validation paths.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        MasterDataError::Validation(message.into())
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, MasterDataError::Validation(_))
    }

    /// Check if this error is a not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, MasterDataError::NotFound(_))
    }
}
