//! Error types for the synchronization worker.

use thiserror::Error;

use whnet_db::DbError;

/// Error type for queue and runner operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The store failed. An empty queue is not an error; it surfaces as
    /// `Ok(None)` from the claim call.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The external master-data system rejected or failed a push. The
    /// affected row stays pending and is eligible for a future claim.
    #[error("External push failed: {0}")]
    Gateway(#[source] Box<dyn std::error::Error + Send + Sync>),
}
