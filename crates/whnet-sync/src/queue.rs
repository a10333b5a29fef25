//! The synchronization claim queue.
//!
//! `try_claim_next` selects the smallest-id pending warehouse that no other
//! claimant holds, skipping locked rows instead of waiting, and hands it
//! back still locked inside the claiming transaction. Nothing marks the row
//! "claimed" in data; the row lock is the claim, and it is released the
//! moment the transaction commits, rolls back, or is dropped.

use sqlx::{PgPool, Postgres, Transaction};

use whnet_core::WarehouseId;
use whnet_db::{DbError, SyncState, Warehouse};

/// The shared queue of warehouses pending synchronization.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    pool: PgPool,
}

/// A successfully claimed warehouse.
///
/// Owns the transaction whose row lock is the claim. Finish with
/// [`SyncClaim::complete`] after a successful push, or [`SyncClaim::release`]
/// (or just drop) to put the row back for another claimant.
pub struct SyncClaim {
    tx: Transaction<'static, Postgres>,
    warehouse: Warehouse,
    prior_state: SyncState,
}

impl SyncClaim {
    /// The claimed warehouse.
    #[must_use]
    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// Synchronization state the row was in when claimed (`Never` or
    /// `Outdated`; `Synced` rows are not eligible).
    #[must_use]
    pub fn prior_state(&self) -> SyncState {
        self.prior_state
    }

    /// Record a successful push and commit, releasing the lock.
    ///
    /// Stamps `synchronized_at`, sets the synchronized flag, and merges the
    /// externally assigned identity (a `None` does not erase a previously
    /// known one).
    pub async fn complete(mut self, goodzon_id: Option<i64>) -> Result<(), DbError> {
        Warehouse::mark_synchronized_in_tx(&mut self.tx, self.warehouse.warehouse_id, goodzon_id)
            .await?;
        self.tx.commit().await.map_err(DbError::QueryFailed)
    }

    /// Roll back, leaving the row pending and immediately eligible for
    /// another claimant. Dropping the claim has the same effect; this
    /// variant just surfaces rollback errors.
    pub async fn release(self) -> Result<(), DbError> {
        self.tx.rollback().await.map_err(DbError::QueryFailed)
    }
}

impl SyncQueue {
    /// Create a queue over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Claim the next pending warehouse, if any is free.
    ///
    /// Among all rows with `warehouse_is_synchronized = FALSE`, picks the
    /// smallest id not locked by another claimant; rows that are locked are
    /// skipped, never waited on. Returns `Ok(None)` when every pending row
    /// is taken or the queue is empty.
    pub async fn try_claim_next(&self) -> Result<Option<SyncClaim>, DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::ConnectionFailed)?;

        let Some(warehouse) = Warehouse::claim_next_in_tx(&mut tx).await? else {
            // Nothing to do; drop the transaction without touching anything.
            return Ok(None);
        };

        let prior_state = warehouse.sync_state();

        tracing::debug!(
            warehouse_id = %warehouse.warehouse_id,
            ?prior_state,
            "Claimed warehouse for synchronization"
        );

        Ok(Some(SyncClaim {
            tx,
            warehouse,
            prior_state,
        }))
    }

    /// Flag a warehouse as needing synchronization. Idempotent.
    pub async fn mark_needs_sync(&self, id: WarehouseId) -> Result<(), DbError> {
        Warehouse::mark_needs_sync(&self.pool, id).await
    }

    /// Flag a batch of warehouses as needing synchronization.
    pub async fn mark_needs_sync_many(&self, ids: &[WarehouseId]) -> Result<u64, DbError> {
        Warehouse::mark_needs_sync_many(&self.pool, ids).await
    }

    /// Number of warehouses currently pending. Observability only; the
    /// value is stale the moment it is read.
    pub async fn count_pending(&self) -> Result<i64, DbError> {
        Warehouse::count_pending_sync(&self.pool).await
    }
}
