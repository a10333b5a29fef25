//! Seam to the priority collaborator.
//!
//! The priority engine itself is a separate system; the master-data services
//! only need two things from it: "does this warehouse have priorities" (to
//! forbid type changes) and "re-synchronize a region's priorities" (the
//! cascade triggered when a region enables priority updates). The cascade is
//! sequenced inside the caller's transaction so failure aborts the whole
//! update.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use whnet_core::{RegionId, WarehouseId};
use whnet_db::{Warehouse, WarehousePriority};

use crate::error::MasterDataError;

/// Narrow contract with the priority collaborator.
#[async_trait]
pub trait PriorityGateway: Send + Sync {
    /// Priority records filtered by region and/or warehouse sets (empty set
    /// = no filter on that axis).
    async fn list_priorities(
        &self,
        region_ids: &[RegionId],
        warehouse_ids: &[WarehouseId],
    ) -> Result<Vec<WarehousePriority>, MasterDataError>;

    /// Re-synchronize the region's priorities.
    ///
    /// Runs in the caller's transaction: the cascade commits or rolls back
    /// together with the region update that triggered it.
    async fn sync_region_priorities(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        region_id: RegionId,
        actor: &str,
    ) -> Result<(), MasterDataError>;
}

/// Postgres-backed gateway.
///
/// `sync_region_priorities` re-flags every warehouse prioritized for the
/// region as needing synchronization, which is the effect the master-data
/// engine depends on; full priority recomputation belongs to the
/// collaborator and deployments substitute it through this trait.
#[derive(Debug, Clone)]
pub struct PgPriorityGateway {
    pool: PgPool,
}

impl PgPriorityGateway {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriorityGateway for PgPriorityGateway {
    async fn list_priorities(
        &self,
        region_ids: &[RegionId],
        warehouse_ids: &[WarehouseId],
    ) -> Result<Vec<WarehousePriority>, MasterDataError> {
        Ok(WarehousePriority::list(&self.pool, region_ids, warehouse_ids).await?)
    }

    async fn sync_region_priorities(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        region_id: RegionId,
        actor: &str,
    ) -> Result<(), MasterDataError> {
        let flagged = Warehouse::mark_needs_sync_for_region_in_tx(tx, region_id).await?;

        tracing::info!(
            region_id = %region_id,
            actor = %actor,
            warehouses_flagged = flagged,
            "Region priorities queued for re-synchronization"
        );

        Ok(())
    }
}
